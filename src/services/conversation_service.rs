//! Read and delete access to an owner's conversations.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ConversationSummary, Message};
use crate::domain::ports::ConversationRepository;

pub struct ConversationService<C: ConversationRepository> {
    repo: Arc<C>,
}

impl<C: ConversationRepository> ConversationService<C> {
    pub fn new(repo: Arc<C>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner: &str) -> DomainResult<Vec<ConversationSummary>> {
        self.repo.list_conversations(owner).await
    }

    /// Full message history, oldest first.
    pub async fn history(&self, owner: &str, conversation_id: i64) -> DomainResult<Vec<Message>> {
        self.repo.list_messages(owner, conversation_id).await
    }

    pub async fn delete(&self, owner: &str, conversation_id: i64) -> DomainResult<()> {
        self.repo.delete_conversation(owner, conversation_id).await?;
        tracing::info!(owner, conversation_id, "conversation deleted");
        Ok(())
    }
}
