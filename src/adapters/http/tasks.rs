//! Task CRUD endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::auth::AuthenticatedOwner;
use super::error::{ApiError, ApiResult};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::server::AppState;
use crate::domain::errors::DomainError;
use crate::domain::models::{Task, TaskSort, TaskStatusFilter};
use crate::domain::ports::TaskFilter;

/// Query parameters for task listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl ListTasksQuery {
    fn to_filter(&self) -> Result<TaskFilter, ApiError> {
        let status = match self.status.as_deref() {
            Some(raw) => TaskStatusFilter::from_str(raw).ok_or_else(|| {
                ApiError(DomainError::InvalidInput(format!(
                    "Invalid status '{raw}'; expected all, pending or completed"
                )))
            })?,
            None => TaskStatusFilter::All,
        };
        let sort = match self.sort.as_deref() {
            Some(raw) => TaskSort::from_str(raw).ok_or_else(|| {
                ApiError(DomainError::InvalidInput(format!(
                    "Invalid sort '{raw}'; expected created, title or updated"
                )))
            })?,
            None => TaskSort::Created,
        };
        Ok(TaskFilter { status, sort })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetCompletedRequest {
    #[serde(default = "default_completed")]
    pub completed: bool,
}

const fn default_completed() -> bool {
    true
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath(owner): ApiPath<String>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let owner = auth.authorize(&owner)?;
    let filter = query.to_filter()?;
    Ok(Json(state.tasks.list(owner, filter).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath(owner): ApiPath<String>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let owner = auth.authorize(&owner)?;
    let task = state.tasks.create(owner, &req.title, req.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
) -> ApiResult<Json<Task>> {
    let owner = auth.authorize(&owner)?;
    Ok(Json(state.tasks.get(owner, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let owner = auth.authorize(&owner)?;
    let task = state
        .tasks
        .update(owner, id, req.title.as_deref(), req.description.as_deref())
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
) -> ApiResult<StatusCode> {
    let owner = auth.authorize(&owner)?;
    state.tasks.delete(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_completed(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
    ApiJson(req): ApiJson<SetCompletedRequest>,
) -> ApiResult<Json<Task>> {
    let owner = auth.authorize(&owner)?;
    Ok(Json(state.tasks.set_completed(owner, id, req.completed).await?))
}
