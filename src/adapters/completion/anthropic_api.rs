//! Anthropic Messages API completion client.
//!
//! Translates the prompt context and tool catalog into a Messages API request
//! with `tools`, and the response's `text`/`tool_use` blocks back into a
//! [`Completion`]. Outbound calls are throttled by a token bucket and retried
//! with exponential backoff on transient failures.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backoff::future::retry_notify;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::errors::CompletionApiError;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Completion, CompletionConfig, CompletionRequest, PromptMessage, RetryConfig, ToolDefinition,
    ToolInvocation,
};
use crate::domain::ports::CompletionClient;

/// Message role in Anthropic API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    User,
    Assistant,
}

/// System prompt content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
}

impl SystemContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: content.into(),
        }
    }
}

/// Content block in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Block types this client does not act on (e.g. `thinking`).
    #[serde(other)]
    Unsupported,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: ApiRole,
    pub content: Vec<ContentBlock>,
}

/// Tool declaration in Messages API shape.
#[derive(Debug, Clone, Serialize)]
pub struct ApiTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl From<&ToolDefinition> for ApiTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            input_schema: def.parameters.clone(),
        }
    }
}

/// Request to the Anthropic Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemContentBlock>>,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ApiTool>,
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl MessagesResponse {
    fn into_completion(self) -> Completion {
        let mut texts = Vec::new();
        let mut calls = Vec::new();

        for block in self.content {
            match block {
                ContentBlock::Text { text } => texts.push(text),
                ContentBlock::ToolUse { id, name, input } => calls.push(ToolInvocation {
                    id,
                    name,
                    arguments: input,
                }),
                ContentBlock::ToolResult { .. } | ContentBlock::Unsupported => {}
            }
        }

        Completion::from_parts(texts.join("\n"), calls)
    }
}

/// Convert prompt context into Messages API turns.
///
/// The API requires the first turn to come from the user and roles to
/// alternate, so leading assistant turns are dropped and adjacent turns with
/// the same role are merged.
pub fn to_api_messages(messages: &[PromptMessage]) -> Vec<ApiMessage> {
    let mut out: Vec<ApiMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        let (role, blocks) = match message {
            PromptMessage::User(text) => (ApiRole::User, vec![ContentBlock::Text { text: text.clone() }]),
            PromptMessage::Assistant(text) => {
                (ApiRole::Assistant, vec![ContentBlock::Text { text: text.clone() }])
            }
            PromptMessage::ToolRequests(calls) => (
                ApiRole::Assistant,
                calls
                    .iter()
                    .map(|call| ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    })
                    .collect(),
            ),
            PromptMessage::ToolResults(results) => (
                ApiRole::User,
                results
                    .iter()
                    .map(|result| ContentBlock::ToolResult {
                        tool_use_id: result.invocation_id.clone(),
                        content: result.content.to_string(),
                        is_error: result.is_error.then_some(true),
                    })
                    .collect(),
            ),
        };

        if out.is_empty() && role == ApiRole::Assistant {
            continue;
        }

        match out.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => out.push(ApiMessage { role, content: blocks }),
        }
    }

    out
}

/// Completion client backed by the Anthropic Messages API.
pub struct AnthropicCompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    api_version: String,
    max_tokens: u32,
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl AnthropicCompletionClient {
    pub fn new(config: &CompletionConfig, retry: &RetryConfig) -> Result<Self, CompletionApiError> {
        let api_key = config.resolve_api_key().ok_or(CompletionApiError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CompletionApiError::NetworkError)?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_version: config.api_version.clone(),
            max_tokens: config.max_tokens,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            retry: retry.clone(),
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> MessagesRequest {
        let system = if request.system_prompt.is_empty() {
            None
        } else {
            Some(vec![SystemContentBlock::text(&request.system_prompt)])
        };

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages: to_api_messages(&request.messages),
            tools: request.tools.iter().map(ApiTool::from).collect(),
        }
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build()
    }

    async fn send_once(&self, body: &MessagesRequest) -> Result<MessagesResponse, CompletionApiError> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionApiError::from_status(status, body));
        }

        Ok(response.json::<MessagesResponse>().await?)
    }

    /// Send with retries; `max_retries` bounds the attempts after the first.
    async fn send_with_retry(&self, body: &MessagesRequest) -> Result<MessagesResponse, CompletionApiError> {
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let max_retries = self.retry.max_retries;

        retry_notify(
            self.backoff_policy(),
            move || async move {
                let attempt = attempts.fetch_add(1, Ordering::Relaxed);
                match self.send_once(body).await {
                    Ok(response) => Ok(response),
                    Err(e) if e.is_transient() && attempt < max_retries => Err(backoff::Error::transient(e)),
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            },
            |err: CompletionApiError, wait: Duration| {
                tracing::warn!(error = %err, ?wait, "completion request failed, retrying");
            },
        )
        .await
    }
}

#[async_trait]
impl CompletionClient for AnthropicCompletionClient {
    fn name(&self) -> &'static str {
        "anthropic_api"
    }

    async fn complete(&self, request: CompletionRequest) -> DomainResult<Completion> {
        let body = self.build_request(&request);
        tracing::debug!(model = %body.model, messages = body.messages.len(), tools = body.tools.len(), "sending completion request");

        let response = self.send_with_retry(&body).await.map_err(|e| {
            tracing::error!(error = %e, "completion request failed");
            e
        })?;

        tracing::debug!(id = %response.id, stop_reason = ?response.stop_reason, "completion received");
        Ok(response.into_completion())
    }
}
