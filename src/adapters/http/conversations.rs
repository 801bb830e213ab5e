use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::auth::AuthenticatedOwner;
use super::error::ApiResult;
use super::extract::ApiPath;
use super::server::AppState;
use crate::domain::models::{ConversationSummary, Message};

#[derive(Debug, Serialize)]
pub struct ConversationHistoryResponse {
    pub conversation_id: i64,
    pub messages: Vec<Message>,
}

pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath(owner): ApiPath<String>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let owner = auth.authorize(&owner)?;
    Ok(Json(state.conversations.list(owner).await?))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
) -> ApiResult<Json<ConversationHistoryResponse>> {
    let owner = auth.authorize(&owner)?;
    let messages = state.conversations.history(owner, id).await?;
    Ok(Json(ConversationHistoryResponse {
        conversation_id: id,
        messages,
    }))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath((owner, id)): ApiPath<(String, i64)>,
) -> ApiResult<StatusCode> {
    let owner = auth.authorize(&owner)?;
    state.conversations.delete(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
