use std::sync::Arc;
use std::time::Duration;

use tracing::{Span, info, instrument, warn};

use crate::application::ports::{
    ConversationRepository, LlmClient, LlmClientError, RepositoryError,
};
use crate::domain::{
    Conversation, ConversationId, Message, UserId, finalized_title, provisional_title,
};

use super::ConversationLocks;
use super::context_assembler::assemble_prompt;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Prior messages considered when assembling a turn's prompt.
    pub history_limit: usize,
    /// Messages returned when listing a conversation.
    pub list_limit: usize,
    /// `None` waits for the model indefinitely.
    pub inference_timeout: Option<Duration>,
    pub serialize_turns: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            list_limit: DEFAULT_LIST_LIMIT,
            inference_timeout: None,
            serialize_turns: true,
        }
    }
}

/// Owns the conversation lifecycle: resolving the conversation for a turn, assembling
/// the prompt from stored history, persisting both sides of the turn and deriving the
/// conversation title.
pub struct ChatService {
    conversations: Arc<dyn ConversationRepository>,
    llm_client: Arc<dyn LlmClient>,
    locks: Option<ConversationLocks>,
    options: ChatOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub conversation_id: ConversationId,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        llm_client: Arc<dyn LlmClient>,
        options: ChatOptions,
    ) -> Self {
        let locks = options.serialize_turns.then(ConversationLocks::new);
        Self {
            conversations,
            llm_client,
            locks,
            options,
        }
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Runs one chat turn for `user_id`.
    ///
    /// Store operations happen in a fixed order: history read, user message write,
    /// assistant message write, then the title update on a conversation's first turn.
    /// A failure after the user message is written leaves that message in place.
    #[instrument(
        skip(self, prompt),
        fields(user_id = %user_id, conversation_id = tracing::field::Empty)
    )]
    pub async fn handle_turn(
        &self,
        user_id: &UserId,
        prompt: &str,
        requested: Option<ConversationId>,
    ) -> Result<TurnOutcome, ChatServiceError> {
        let conversation = self.resolve_conversation(user_id, prompt, requested).await?;
        let conversation_id = conversation.id;
        Span::current().record("conversation_id", tracing::field::display(conversation_id));

        let _turn_guard = match &self.locks {
            Some(locks) => Some(locks.acquire(conversation_id).await),
            None => None,
        };

        let history = self
            .conversations
            .get_messages(conversation_id, user_id, self.options.history_limit)
            .await?;

        self.conversations
            .append_message(&Message::user(conversation_id, prompt), user_id)
            .await?;

        let full_prompt = assemble_prompt(&history, prompt);
        info!(
            previous = history.len(),
            prompt_chars = full_prompt.chars().count(),
            "Context length: {} messages",
            history.len() + 1
        );

        let reply = self.generate(&full_prompt).await?;

        self.conversations
            .append_message(&Message::assistant(conversation_id, reply.as_str()), user_id)
            .await?;

        if history.is_empty() {
            let title = finalized_title(prompt);
            if let Err(e) = self
                .conversations
                .update_title(conversation_id, user_id, &title)
                .await
            {
                warn!(error = %e, "Failed to finalize conversation title");
            }
        }

        Ok(TurnOutcome {
            reply,
            conversation_id,
        })
    }

    /// Messages of an owned conversation, oldest first.
    #[instrument(skip(self), fields(user_id = %user_id, conversation_id = %conversation_id))]
    pub async fn list_history(
        &self,
        user_id: &UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, ChatServiceError> {
        self.conversations
            .find_conversation(conversation_id, user_id)
            .await?
            .ok_or(ChatServiceError::ConversationNotFound(conversation_id))?;

        let messages = self
            .conversations
            .get_messages(conversation_id, user_id, self.options.list_limit)
            .await?;

        Ok(messages)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_conversations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, ChatServiceError> {
        Ok(self.conversations.list_conversations(user_id).await?)
    }

    #[instrument(skip(self), fields(user_id = %user_id, conversation_id = %conversation_id))]
    pub async fn delete_conversation(
        &self,
        user_id: &UserId,
        conversation_id: ConversationId,
    ) -> Result<(), ChatServiceError> {
        let deleted = self
            .conversations
            .delete_conversation(conversation_id, user_id)
            .await?;

        if !deleted {
            return Err(ChatServiceError::ConversationNotFound(conversation_id));
        }

        info!("Conversation deleted");
        Ok(())
    }

    async fn resolve_conversation(
        &self,
        user_id: &UserId,
        prompt: &str,
        requested: Option<ConversationId>,
    ) -> Result<Conversation, ChatServiceError> {
        if let Some(id) = requested {
            if let Some(existing) = self.conversations.find_conversation(id, user_id).await? {
                return Ok(existing);
            }
            info!(requested = %id, "Requested conversation not found for user, starting a new one");
        }

        let conversation = Conversation::new(user_id.clone(), provisional_title(prompt));
        self.conversations.create_conversation(&conversation).await?;
        info!(new_conversation = %conversation.id, "Conversation created");

        Ok(conversation)
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmClientError> {
        match self.options.inference_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.llm_client.complete(prompt))
                .await
                .map_err(|_| LlmClientError::Timeout(deadline))?,
            None => self.llm_client.complete(prompt).await,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("store: {0}")]
    Store(#[from] RepositoryError),
    #[error("inference: {0}")]
    Inference(#[from] LlmClientError),
}
