use crate::domain::{Conversation, ConversationId, Message, UserId};
use async_trait::async_trait;

use super::RepositoryError;

/// Conversation and message storage.
///
/// Every operation that names a conversation also takes the caller's `UserId` and must
/// behave as if conversations owned by anyone else do not exist.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), RepositoryError>;

    async fn find_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Conversations of `owner`, most recently updated first.
    async fn list_conversations(&self, owner: &UserId)
    -> Result<Vec<Conversation>, RepositoryError>;

    async fn update_title(
        &self,
        id: ConversationId,
        owner: &UserId,
        title: &str,
    ) -> Result<(), RepositoryError>;

    /// Removes the conversation and all of its messages. Returns `false` when nothing
    /// owned by `owner` matched.
    async fn delete_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<bool, RepositoryError>;

    /// Fails with `RepositoryError::NotFound` when the target conversation is not owned
    /// by `owner`.
    async fn append_message(&self, message: &Message, owner: &UserId)
    -> Result<(), RepositoryError>;

    /// Up to `limit` messages in creation order, oldest first.
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}
