//! Scripted completion client for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Completion, CompletionRequest, ToolInvocation};
use crate::domain::ports::CompletionClient;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Reply(Completion),
    /// Simulate an unreachable model.
    Unavailable(String),
}

impl ScriptedResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Reply(Completion::Final(text.into()))
    }

    /// Tool calls given as `(name, arguments)`; ids are generated.
    pub fn tool_calls<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let calls = calls
            .into_iter()
            .map(|(name, arguments)| ToolInvocation {
                id: format!("toolu_{}", Uuid::new_v4().simple()),
                name: name.into(),
                arguments,
            })
            .collect();
        Self::Reply(Completion::ToolCalls(calls))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Replays queued responses in order and records every request it receives.
///
/// When the script runs out it answers with `fallback` (a final text by
/// default) so a test that under-scripts still terminates.
#[derive(Clone)]
pub struct ScriptedCompletionClient {
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    fallback: ScriptedResponse,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: ScriptedResponse::text("OK"),
        }
    }

    /// Response used once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, fallback: ScriptedResponse) -> Self {
        self.fallback = fallback;
        self
    }

    pub async fn push(&self, response: ScriptedResponse) {
        self.script.lock().await.push_back(response);
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

impl Default for ScriptedCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> DomainResult<Completion> {
        self.requests.lock().await.push(request);

        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            ScriptedResponse::Reply(completion) => Ok(completion),
            ScriptedResponse::Unavailable(reason) => Err(DomainError::UpstreamUnavailable(reason)),
        }
    }
}
