//! SQLite implementation of the ConversationRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Conversation, ConversationSummary, Message, MessageRole};
use crate::domain::ports::ConversationRepository;

#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: SqlitePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for SqliteConversationRepository {
    async fn create_conversation(&self, owner: &str) -> DomainResult<Conversation> {
        let now = format_datetime(Utc::now());

        let row: ConversationRow = sqlx::query_as(
            "INSERT INTO conversations (owner, created_at, updated_at) VALUES (?, ?, ?) RETURNING *"
        )
        .bind(owner)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_conversation(&self, owner: &str, id: i64) -> DomainResult<Conversation> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT * FROM conversations WHERE id = ? AND owner = ?"
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DomainError::conversation_not_found(id))?.try_into()
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        owner: &str,
        role: MessageRole,
        content: &str,
    ) -> DomainResult<Message> {
        if content.trim().is_empty() {
            return Err(DomainError::InvalidInput("Message content cannot be empty".to_string()));
        }

        let now = format_datetime(Utc::now());
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            "UPDATE conversations SET updated_at = ? WHERE id = ? AND owner = ?"
        )
        .bind(&now)
        .bind(conversation_id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(DomainError::conversation_not_found(conversation_id));
        }

        let row: MessageRow = sqlx::query_as(
            r#"INSERT INTO messages (conversation_id, owner, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING *"#
        )
        .bind(conversation_id)
        .bind(owner)
        .bind(role.as_str())
        .bind(content)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn recent_messages(&self, conversation_id: i64, limit: u32) -> DomainResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE conversation_id = ?
                   ORDER BY created_at DESC, id DESC
                   LIMIT ?
               ) ORDER BY created_at ASC, id ASC"#
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_messages(&self, owner: &str, conversation_id: i64) -> DomainResult<Vec<Message>> {
        self.get_conversation(owner, conversation_id).await?;

        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC"
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_conversations(&self, owner: &str) -> DomainResult<Vec<ConversationSummary>> {
        let rows: Vec<ConversationSummaryRow> = sqlx::query_as(
            r#"SELECT c.id, c.owner, c.created_at, c.updated_at,
                      (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count
               FROM conversations c
               WHERE c.owner = ?
               ORDER BY c.updated_at DESC, c.id DESC"#
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_conversation(&self, owner: &str, id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ? AND owner = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conversation_not_found(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: i64,
    owner: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DomainError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            id: row.id,
            owner: row.owner,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ConversationSummaryRow {
    id: i64,
    owner: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

impl TryFrom<ConversationSummaryRow> for ConversationSummary {
    type Error = DomainError;

    fn try_from(row: ConversationSummaryRow) -> Result<Self, Self::Error> {
        Ok(ConversationSummary {
            id: row.id,
            owner: row.owner,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            message_count: row.message_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    conversation_id: i64,
    owner: String,
    role: String,
    content: String,
    created_at: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = MessageRole::from_str(&row.role)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid message role: {}", row.role)))?;

        Ok(Message {
            id: row.id,
            conversation_id: row.conversation_id,
            owner: row.owner,
            role,
            content: row.content,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteConversationRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteConversationRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();

        let fetched = repo.get_conversation("alice", conv.id).await.unwrap();
        assert_eq!(fetched, conv);
        assert!(matches!(
            repo.get_conversation("bob", conv.id).await,
            Err(DomainError::NotFound { entity: "Conversation", .. })
        ));
    }

    #[tokio::test]
    async fn test_append_bumps_updated_at() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();

        let msg = repo.append_message(conv.id, "alice", MessageRole::User, "hello").await.unwrap();
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.conversation_id, conv.id);

        let fetched = repo.get_conversation("alice", conv.id).await.unwrap();
        assert!(fetched.updated_at >= conv.updated_at);
        assert_eq!(fetched.updated_at, msg.created_at);
    }

    #[tokio::test]
    async fn test_append_rejects_foreign_or_missing_conversation() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();

        let err = repo.append_message(conv.id, "bob", MessageRole::User, "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let err = repo.append_message(999, "alice", MessageRole::User, "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        assert!(repo.list_messages("alice", conv.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_rejects_blank_content() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();

        let err = repo.append_message(conv.id, "alice", MessageRole::Assistant, "   ").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_recent_messages_window_is_oldest_first() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();

        for i in 0..5 {
            let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
            repo.append_message(conv.id, "alice", role, &format!("m{i}")).await.unwrap();
        }

        let recent = repo.recent_messages(conv.id, 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);

        let all = repo.recent_messages(conv.id, 50).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "m0");
    }

    #[tokio::test]
    async fn test_list_conversations_counts_and_orders() {
        let repo = setup_test_repo().await;
        let first = repo.create_conversation("alice").await.unwrap();
        let second = repo.create_conversation("alice").await.unwrap();
        repo.create_conversation("bob").await.unwrap();

        repo.append_message(first.id, "alice", MessageRole::User, "latest activity").await.unwrap();

        let listed = repo.list_conversations("alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].message_count, 1);
        assert_eq!(listed[1].id, second.id);
        assert_eq!(listed[1].message_count, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_messages() {
        let repo = setup_test_repo().await;
        let conv = repo.create_conversation("alice").await.unwrap();
        repo.append_message(conv.id, "alice", MessageRole::User, "bye").await.unwrap();

        assert!(matches!(
            repo.delete_conversation("bob", conv.id).await,
            Err(DomainError::NotFound { .. })
        ));

        repo.delete_conversation("alice", conv.id).await.unwrap();
        assert!(repo.recent_messages(conv.id, 10).await.unwrap().is_empty());
        assert!(matches!(
            repo.list_messages("alice", conv.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
