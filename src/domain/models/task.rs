//! Task domain model.
//!
//! Tasks are todo items owned by exactly one owner. Every read and write is
//! scoped by owner id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Completion filter for listing tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskStatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Some(Self::All),
            "pending" | "incomplete" | "open" => Some(Self::Pending),
            "completed" | "complete" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Sort order for listing tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Newest first
    #[default]
    Created,
    /// Alphabetical by title
    Title,
    /// Most recently updated first
    Updated,
}

impl TaskSort {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "created" | "" => Some(Self::Created),
            "title" => Some(Self::Title),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }

    pub(crate) fn order_by_clause(self) -> &'static str {
        match self {
            Self::Created => "created_at DESC, id DESC",
            Self::Title => "title COLLATE NOCASE ASC, id ASC",
            Self::Updated => "updated_at DESC, id DESC",
        }
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

impl NewTask {
    /// Trim and validate raw input.
    pub fn parse(title: &str, description: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            title: normalize_title(title)?,
            description: normalize_description(description)?,
        })
    }
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskUpdate {
    pub fn parse(title: Option<&str>, description: Option<&str>) -> DomainResult<Self> {
        let title = title.map(normalize_title).transpose()?;
        let description = normalize_description(description)?;
        Ok(Self { title, description })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

fn normalize_title(raw: &str) -> DomainResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::InvalidInput(
            "Title cannot be empty or whitespace".to_string(),
        ));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(DomainError::InvalidInput(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters (got {len})"
        )));
    }
    Ok(title.to_string())
}

/// Blank descriptions collapse to `None`.
fn normalize_description(raw: Option<&str>) -> DomainResult<Option<String>> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::InvalidInput(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters (got {len})"
        )));
    }
    Ok(Some(description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_task_trims() {
        let task = NewTask::parse("  Buy groceries  ", Some("  milk ")).unwrap();
        assert_eq!(task.title, "Buy groceries");
        assert_eq!(task.description.as_deref(), Some("milk"));
    }

    #[test]
    fn test_blank_description_is_none() {
        let task = NewTask::parse("Title", Some("   ")).unwrap();
        assert!(task.description.is_none());
    }

    #[test]
    fn test_rejects_empty_title() {
        assert!(matches!(
            NewTask::parse("   ", None),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_title_length_counts_chars() {
        let title = "é".repeat(MAX_TITLE_CHARS);
        assert!(NewTask::parse(&title, None).is_ok());
        let title = "é".repeat(MAX_TITLE_CHARS + 1);
        assert!(NewTask::parse(&title, None).is_err());
    }

    #[test]
    fn test_description_too_long() {
        let description = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(NewTask::parse("ok", Some(&description)).is_err());
    }

    #[test]
    fn test_update_parse() {
        let update = TaskUpdate::parse(Some(" New "), None).unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));
        assert!(update.description.is_none());
        assert!(TaskUpdate::parse(None, None).unwrap().is_empty());
        assert!(TaskUpdate::parse(Some(""), None).is_err());
    }

    #[test]
    fn test_status_filter_from_str() {
        assert_eq!(TaskStatusFilter::from_str("PENDING"), Some(TaskStatusFilter::Pending));
        assert_eq!(TaskStatusFilter::from_str("completed"), Some(TaskStatusFilter::Completed));
        assert_eq!(TaskStatusFilter::from_str("all"), Some(TaskStatusFilter::All));
        assert_eq!(TaskStatusFilter::from_str("bogus"), None);
    }

    proptest! {
        #[test]
        fn prop_valid_titles_round_trip_trimmed(title in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,150}[a-zA-Z0-9]", pad in 0usize..5) {
            let padded = format!("{}{}{}", " ".repeat(pad), title, " ".repeat(pad));
            let parsed = NewTask::parse(&padded, None).unwrap();
            prop_assert_eq!(parsed.title, title);
        }

        #[test]
        fn prop_whitespace_titles_rejected(ws in "[ \t\n]{0,20}") {
            prop_assert!(NewTask::parse(&ws, None).is_err());
        }
    }
}
