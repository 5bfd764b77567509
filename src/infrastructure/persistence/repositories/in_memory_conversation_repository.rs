use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, UserId};

/// Process-local store for local runs and tests. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
}

impl State {
    fn owned_mut(&mut self, id: ConversationId, owner: &UserId) -> Option<&mut Conversation> {
        self.conversations
            .get_mut(&id)
            .filter(|c| c.is_owned_by(owner))
    }
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn message_count(&self) -> usize {
        self.state().messages.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if state.conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::QueryFailed(format!(
                "duplicate conversation id {}",
                conversation.id
            )));
        }
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        state.messages.insert(conversation.id, Vec::new());
        Ok(())
    }

    async fn find_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.state().owned_mut(id, owner).map(|c| c.clone()))
    }

    async fn list_conversations(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state();
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.is_owned_by(owner))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn update_title(
        &self,
        id: ConversationId,
        owner: &UserId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let conversation = state
            .owned_mut(id, owner)
            .ok_or_else(|| RepositoryError::NotFound(format!("conversation {}", id)))?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        if state.owned_mut(id, owner).is_none() {
            return Ok(false);
        }
        state.messages.remove(&id);
        state.conversations.remove(&id);
        Ok(true)
    }

    async fn append_message(
        &self,
        message: &Message,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let conversation = state
            .owned_mut(message.conversation_id, owner)
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("conversation {}", message.conversation_id))
            })?;
        conversation.updated_at = Utc::now();
        state
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut state = self.state();
        if state.owned_mut(conversation_id, owner).is_none() {
            return Ok(Vec::new());
        }
        let mut messages = state
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default();
        // stable: equal timestamps keep insertion order
        messages.sort_by_key(|m| m.created_at);
        messages.truncate(limit);
        Ok(messages)
    }
}
