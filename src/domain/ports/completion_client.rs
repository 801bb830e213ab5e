//! Completion client port - interface for language model backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Completion, CompletionRequest};

/// A language model capable of function calling.
///
/// Given the system prompt, ordered context and tool catalog it either answers
/// or asks for tool calls. Implementations report every failure to reach or
/// use the model as `DomainError::UpstreamUnavailable`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, request: CompletionRequest) -> DomainResult<Completion>;
}
