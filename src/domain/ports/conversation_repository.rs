use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Conversation, ConversationSummary, Message, MessageRole};

/// Repository port for conversations and their messages.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create an empty conversation
    async fn create_conversation(&self, owner: &str) -> DomainResult<Conversation>;

    /// Get a conversation, `NotFound` on absence or owner mismatch
    async fn get_conversation(&self, owner: &str, id: i64) -> DomainResult<Conversation>;

    /// Append a message and bump the conversation's `updated_at`
    async fn append_message(
        &self,
        conversation_id: i64,
        owner: &str,
        role: MessageRole,
        content: &str,
    ) -> DomainResult<Message>;

    /// The most recent `limit` messages, oldest first
    async fn recent_messages(&self, conversation_id: i64, limit: u32) -> DomainResult<Vec<Message>>;

    /// Full history of an owner's conversation, oldest first
    async fn list_messages(&self, owner: &str, conversation_id: i64) -> DomainResult<Vec<Message>>;

    /// Owner's conversations, most recently updated first
    async fn list_conversations(&self, owner: &str) -> DomainResult<Vec<ConversationSummary>>;

    /// Delete a conversation and its messages
    async fn delete_conversation(&self, owner: &str, id: i64) -> DomainResult<()>;
}
