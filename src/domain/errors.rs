//! Domain errors for the taskchat service.

use thiserror::Error;

/// Domain-level errors shared by the stores, the tool catalog and the chat
/// orchestrator.
///
/// `NotFound` covers both "absent" and "owned by somebody else"; the two are
/// deliberately indistinguishable to callers.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Completion service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub const fn task_not_found(id: i64) -> Self {
        Self::NotFound { entity: "Task", id }
    }

    pub const fn conversation_not_found(id: i64) -> Self {
        Self::NotFound { entity: "Conversation", id }
    }

    /// Machine-readable kind exposed in API and tool error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::DatabaseError(_) | Self::SerializationError(_) => "DatabaseError",
        }
    }

    /// Message that is safe to show to end users and to the language model.
    ///
    /// Storage and serialization details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::SerializationError(_) => {
                "A storage error occurred while processing the request".to_string()
            }
            Self::UpstreamUnavailable(_) => {
                "The assistant is temporarily unavailable. Your message was saved; please try again."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
