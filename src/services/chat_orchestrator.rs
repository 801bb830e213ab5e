//! Stateless chat turn driver.
//!
//! Every turn reloads its conversation from the store, lets the completion
//! client decide between answering and calling tools, runs the requested tools
//! as the caller and persists the final answer. Nothing about a conversation
//! is held in memory between requests.

use std::sync::Arc;

use tracing::Instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ChatConfig, ChatReply, Completion, CompletionRequest, Conversation, MessageRole, PromptMessage,
};
use crate::domain::ports::{CompletionClient, ConversationRepository, TaskRepository};
use crate::services::tool_catalog::{ToolCatalog, ToolName};

pub const FALLBACK_AFTER_TOOLS: &str = "I've completed the requested actions.";
pub const FALLBACK_NO_TOOLS: &str = "I'm ready to help you manage your tasks!";
pub const FALLBACK_LOOP_EXHAUSTED: &str =
    "Sorry, I couldn't finish that request. Please try again or break it into smaller steps.";

const BASE_SYSTEM_PROMPT: &str = "You are a friendly and helpful task management assistant. \
You help the user manage their todo list through natural language.

Always:
- Use the tools to read or change tasks; never invent task ids or contents
- Confirm clearly what was done after every action
- Explain errors plainly and suggest what the user can do next
- Format task lists as numbered lists

The tools always act on the current user's own tasks.";

/// Build the system instruction, listing the tool catalog.
pub fn system_prompt() -> String {
    let mut prompt = String::from(BASE_SYSTEM_PROMPT);
    prompt.push_str("\n\nAvailable tools:\n");
    for tool in ToolName::ALL {
        prompt.push_str("- ");
        prompt.push_str(tool.as_str());
        prompt.push_str(": ");
        prompt.push_str(&tool.definition().description);
        prompt.push('\n');
    }
    prompt
}

/// A failed turn. `conversation_id` is set once the turn's conversation was
/// resolved, so a caller can retry in the same conversation.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ChatTurnError {
    pub conversation_id: Option<i64>,
    pub error: DomainError,
}

impl From<DomainError> for ChatTurnError {
    fn from(error: DomainError) -> Self {
        Self { conversation_id: None, error }
    }
}

pub struct ChatOrchestrator<T: TaskRepository, C: ConversationRepository> {
    conversations: Arc<C>,
    catalog: ToolCatalog<T>,
    completion: Arc<dyn CompletionClient>,
    config: ChatConfig,
    system_prompt: String,
}

impl<T: TaskRepository, C: ConversationRepository> ChatOrchestrator<T, C> {
    pub fn new(
        conversations: Arc<C>,
        catalog: ToolCatalog<T>,
        completion: Arc<dyn CompletionClient>,
        config: ChatConfig,
    ) -> Self {
        Self {
            conversations,
            catalog,
            completion,
            config,
            system_prompt: system_prompt(),
        }
    }

    /// Run one chat turn for `owner`.
    ///
    /// The user message is persisted before the completion client is called,
    /// so an `UpstreamUnavailable` error leaves it in the history, in the
    /// conversation named by the error, without an
    /// assistant reply.
    pub async fn handle_turn(
        &self,
        owner: &str,
        conversation_id: Option<i64>,
        message: &str,
    ) -> Result<ChatReply, ChatTurnError> {
        let span = tracing::info_span!(
            "chat_turn",
            owner,
            conversation_id = tracing::field::Empty,
            completion = self.completion.name()
        );
        self.run_turn(owner, conversation_id, message).instrument(span).await
    }

    async fn run_turn(
        &self,
        owner: &str,
        conversation_id: Option<i64>,
        message: &str,
    ) -> Result<ChatReply, ChatTurnError> {
        let message = self.validate_message(message)?;
        let conversation = self.resolve_conversation(owner, conversation_id).await?;
        tracing::Span::current().record("conversation_id", conversation.id);

        self.converse(owner, &conversation, message)
            .await
            .map_err(|error| ChatTurnError { conversation_id: Some(conversation.id), error })
    }

    async fn converse(&self, owner: &str, conversation: &Conversation, message: &str) -> DomainResult<ChatReply> {
        self.conversations
            .append_message(conversation.id, owner, MessageRole::User, message)
            .await?;

        let history = self
            .conversations
            .recent_messages(conversation.id, self.config.history_limit)
            .await?;
        let mut context: Vec<PromptMessage> = history.iter().map(PromptMessage::from).collect();
        let tools = self.catalog.definitions();

        let mut tool_calls = Vec::new();
        let mut answer = None;

        for iteration in 1..=self.config.max_tool_iterations {
            let request = CompletionRequest {
                system_prompt: self.system_prompt.clone(),
                messages: context.clone(),
                tools: tools.clone(),
            };

            let decision = self.completion.complete(request).await.map_err(|e| {
                tracing::warn!(iteration, error = %e, "completion failed; user message kept");
                match e {
                    DomainError::UpstreamUnavailable(_) => e,
                    other => DomainError::UpstreamUnavailable(other.to_string()),
                }
            })?;

            match decision {
                Completion::Final(text) => {
                    answer = Some(text);
                    break;
                }
                Completion::ToolCalls(calls) => {
                    tracing::debug!(iteration, calls = calls.len(), "model requested tools");
                    let mut results = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let (record, result) = self.catalog.execute(owner, call).await;
                        tool_calls.push(record);
                        results.push(result);
                    }
                    context.push(PromptMessage::ToolRequests(calls));
                    context.push(PromptMessage::ToolResults(results));
                }
            }
        }

        let response = match answer.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            Some(_) if tool_calls.is_empty() => FALLBACK_NO_TOOLS.to_string(),
            Some(_) => FALLBACK_AFTER_TOOLS.to_string(),
            None => {
                tracing::warn!(
                    max_tool_iterations = self.config.max_tool_iterations,
                    "tool loop hit its iteration bound"
                );
                FALLBACK_LOOP_EXHAUSTED.to_string()
            }
        };

        self.conversations
            .append_message(conversation.id, owner, MessageRole::Assistant, &response)
            .await?;

        tracing::info!(tool_calls = tool_calls.len(), "chat turn completed");

        Ok(ChatReply {
            conversation_id: conversation.id,
            response,
            tool_calls,
        })
    }

    fn validate_message<'a>(&self, message: &'a str) -> DomainResult<&'a str> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::InvalidInput("Message cannot be empty".to_string()));
        }
        let len = message.chars().count();
        if len > self.config.max_message_chars {
            return Err(DomainError::InvalidInput(format!(
                "Message must be at most {} characters (got {len})",
                self.config.max_message_chars
            )));
        }
        Ok(message)
    }

    async fn resolve_conversation(&self, owner: &str, conversation_id: Option<i64>) -> DomainResult<Conversation> {
        match conversation_id {
            Some(id) => self.conversations.get_conversation(owner, id).await,
            None => {
                let conversation = self.conversations.create_conversation(owner).await?;
                tracing::info!(conversation_id = conversation.id, "conversation created");
                Ok(conversation)
            }
        }
    }
}
