//! Task service implementing business logic.
//!
//! Raw input from the REST surface and from tool arguments is validated here
//! before it reaches the repository.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewTask, Task, TaskUpdate};
use crate::domain::ports::{TaskFilter, TaskRepository};

pub struct TaskService<T: TaskRepository> {
    task_repo: Arc<T>,
}

impl<T: TaskRepository> TaskService<T> {
    pub fn new(task_repo: Arc<T>) -> Self {
        Self { task_repo }
    }

    /// Create a new task.
    pub async fn create(&self, owner: &str, title: &str, description: Option<&str>) -> DomainResult<Task> {
        let new_task = NewTask::parse(title, description)?;
        let task = self.task_repo.create(owner, &new_task).await?;
        tracing::info!(owner, task_id = task.id, "task created");
        Ok(task)
    }

    pub async fn get(&self, owner: &str, id: i64) -> DomainResult<Task> {
        self.task_repo.get(owner, id).await
    }

    pub async fn list(&self, owner: &str, filter: TaskFilter) -> DomainResult<Vec<Task>> {
        self.task_repo.list(owner, filter).await
    }

    /// Update title and/or description. Absent fields are kept.
    pub async fn update(
        &self,
        owner: &str,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> DomainResult<Task> {
        let update = TaskUpdate::parse(title, description)?;
        let task = self.task_repo.update(owner, id, &update).await?;
        tracing::info!(owner, task_id = id, "task updated");
        Ok(task)
    }

    pub async fn set_completed(&self, owner: &str, id: i64, completed: bool) -> DomainResult<Task> {
        let task = self.task_repo.set_completed(owner, id, completed).await?;
        tracing::info!(owner, task_id = id, completed, "task completion changed");
        Ok(task)
    }

    /// Hard delete, returning the removed task.
    pub async fn delete(&self, owner: &str, id: i64) -> DomainResult<Task> {
        let task = self.task_repo.delete(owner, id).await?;
        tracing::info!(owner, task_id = id, "task deleted");
        Ok(task)
    }
}

impl<T: TaskRepository> Clone for TaskService<T> {
    fn clone(&self) -> Self {
        Self {
            task_repo: Arc::clone(&self.task_repo),
        }
    }
}
