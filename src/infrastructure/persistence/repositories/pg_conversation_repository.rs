use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, MessageId, MessageRole, UserId};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(r: ConversationRow) -> Self {
        Conversation {
            id: ConversationId::from_uuid(r.id),
            user_id: UserId::new(r.user_id),
            title: r.title,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(r: MessageRow) -> Self {
        Message {
            id: MessageId::from_uuid(r.id),
            conversation_id: ConversationId::from_uuid(r.conversation_id),
            role: MessageRole::from_stored(&r.role),
            content: r.content,
            created_at: r.created_at,
        }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id, user_id = %conversation.user_id))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user_id.as_str())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id, user_id = %owner))]
    async fn find_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(Conversation::from))
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn list_conversations(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    #[instrument(skip(self, title), fields(conversation_id = %id, user_id = %owner))]
    async fn update_title(
        &self,
        id: ConversationId,
        owner: &UserId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4
            "#,
        )
        .bind(title)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("conversation {}", id)));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id, user_id = %owner))]
    async fn delete_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<bool, RepositoryError> {
        // messages go with it through ON DELETE CASCADE
        let result = sqlx::query(
            r#"
            DELETE FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, conversation_id = %message.conversation_id, role = %message.role))]
    async fn append_message(
        &self,
        message: &Message,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        let conversation_id = message.conversation_id.as_uuid();
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            SELECT $1, c.id, $3, $4, $5
            FROM conversations c
            WHERE c.id = $2 AND c.user_id = $6
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .bind(owner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "conversation {}",
                message.conversation_id
            )));
        }

        sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id, user_id = %owner, limit = %limit))]
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.conversation_id, m.role, m.content, m.created_at
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE m.conversation_id = $1 AND c.user_id = $2
            ORDER BY m.created_at ASC
            LIMIT $3
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(owner.as_str())
        .bind(limit_i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
