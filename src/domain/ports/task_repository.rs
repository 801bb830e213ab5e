use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewTask, Task, TaskSort, TaskStatusFilter, TaskUpdate};

/// Filters for listing an owner's tasks
#[derive(Default, Debug, Clone, Copy)]
pub struct TaskFilter {
    pub status: TaskStatusFilter,
    pub sort: TaskSort,
}

/// Repository port for task persistence operations.
///
/// Every method takes the owner; a task owned by someone else behaves
/// exactly like a missing one (`DomainError::NotFound`).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn create(&self, owner: &str, task: &NewTask) -> DomainResult<Task>;

    /// Get a task by ID
    async fn get(&self, owner: &str, id: i64) -> DomainResult<Task>;

    /// List tasks with filters
    async fn list(&self, owner: &str, filter: TaskFilter) -> DomainResult<Vec<Task>>;

    /// Apply a partial update; untouched fields keep their values
    async fn update(&self, owner: &str, id: i64, update: &TaskUpdate) -> DomainResult<Task>;

    /// Set the completed flag
    async fn set_completed(&self, owner: &str, id: i64, completed: bool) -> DomainResult<Task>;

    /// Hard delete, returning the removed row
    async fn delete(&self, owner: &str, id: i64) -> DomainResult<Task>;
}
