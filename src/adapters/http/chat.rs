use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::auth::AuthenticatedOwner;
use super::error::ApiError;
use super::extract::{ApiJson, ApiPath};
use super::server::AppState;
use crate::domain::models::ChatReply;
use crate::services::ChatTurnError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<i64>,
    pub message: String,
}

/// Chat failure; carries the conversation id when the turn got that far.
#[derive(Debug)]
pub struct ChatApiError {
    error: ApiError,
    conversation_id: Option<i64>,
}

impl From<ApiError> for ChatApiError {
    fn from(error: ApiError) -> Self {
        Self { error, conversation_id: None }
    }
}

impl From<ChatTurnError> for ChatApiError {
    fn from(err: ChatTurnError) -> Self {
        Self {
            error: ApiError(err.error),
            conversation_id: err.conversation_id,
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        self.error.into_response_for(self.conversation_id)
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthenticatedOwner,
    ApiPath(owner): ApiPath<String>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>, ChatApiError> {
    let owner = auth.authorize(&owner)?;
    let reply = state.chat.handle_turn(owner, req.conversation_id, &req.message).await?;
    Ok(Json(reply))
}
