//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewTask, Task, TaskStatusFilter, TaskUpdate};
use crate::domain::ports::{TaskFilter, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, owner: &str, task: &NewTask) -> DomainResult<Task> {
        let now = format_datetime(Utc::now());

        let row: TaskRow = sqlx::query_as(
            r#"INSERT INTO tasks (owner, title, description, completed, created_at, updated_at)
               VALUES (?, ?, ?, 0, ?, ?)
               RETURNING *"#
        )
        .bind(owner)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, owner: &str, id: i64) -> DomainResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE id = ? AND owner = ?"
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DomainError::task_not_found(id))?.try_into()
    }

    async fn list(&self, owner: &str, filter: TaskFilter) -> DomainResult<Vec<Task>> {
        let mut query = String::from("SELECT * FROM tasks WHERE owner = ?");

        match filter.status {
            TaskStatusFilter::All => {}
            TaskStatusFilter::Pending => query.push_str(" AND completed = 0"),
            TaskStatusFilter::Completed => query.push_str(" AND completed = 1"),
        }

        query.push_str(" ORDER BY ");
        query.push_str(filter.sort.order_by_clause());

        let rows: Vec<TaskRow> = sqlx::query_as(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, owner: &str, id: i64, update: &TaskUpdate) -> DomainResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"UPDATE tasks SET title = COALESCE(?, title),
               description = COALESCE(?, description),
               updated_at = ?
               WHERE id = ? AND owner = ?
               RETURNING *"#
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(format_datetime(Utc::now()))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DomainError::task_not_found(id))?.try_into()
    }

    async fn set_completed(&self, owner: &str, id: i64, completed: bool) -> DomainResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"UPDATE tasks SET completed = ?, updated_at = ?
               WHERE id = ? AND owner = ?
               RETURNING *"#
        )
        .bind(completed)
        .bind(format_datetime(Utc::now()))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DomainError::task_not_found(id))?.try_into()
    }

    async fn delete(&self, owner: &str, id: i64) -> DomainResult<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            "DELETE FROM tasks WHERE id = ? AND owner = ? RETURNING *"
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DomainError::task_not_found(id))?.try_into()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    owner: String,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            owner: row.owner,
            title: row.title,
            description: row.description,
            completed: row.completed,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
