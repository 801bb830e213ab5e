//! Types exchanged between the chat orchestrator, the tool catalog and the
//! completion client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conversation::{Message, MessageRole};

/// A tool call requested by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned id used to pair the result with the request.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Outcome of one tool invocation, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: String,
    pub name: String,
    pub content: Value,
    pub is_error: bool,
}

/// Tool declaration advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// One entry of the prompt context.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptMessage {
    User(String),
    Assistant(String),
    /// Assistant turn that asked for tools.
    ToolRequests(Vec<ToolInvocation>),
    /// Results answering the preceding `ToolRequests`.
    ToolResults(Vec<ToolResult>),
}

impl From<&Message> for PromptMessage {
    fn from(message: &Message) -> Self {
        match message.role {
            MessageRole::User => Self::User(message.content.clone()),
            MessageRole::Assistant => Self::Assistant(message.content.clone()),
        }
    }
}

/// Everything a completion client needs for one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<PromptMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Decision returned by a completion client.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Natural-language answer; ends the turn.
    Final(String),
    /// Non-empty, ordered list of tool calls.
    ToolCalls(Vec<ToolInvocation>),
}

impl Completion {
    /// Tool calls win over text; an empty call list means a final answer.
    pub fn from_parts(text: String, calls: Vec<ToolInvocation>) -> Self {
        if calls.is_empty() {
            Self::Final(text)
        } else {
            Self::ToolCalls(calls)
        }
    }
}

/// Entry of the per-turn tool-call log returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub arguments: Value,
    pub result: Value,
}

/// Result of one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub conversation_id: i64,
    pub response: String,
    pub tool_calls: Vec<ToolCallRecord>,
}
