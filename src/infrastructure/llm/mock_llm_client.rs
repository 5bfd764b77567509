use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::application::ports::{LlmClient, LlmClientError};

enum Reply {
    Echo,
    Fixed(String),
    Failure(String),
    CredentialFailure,
}

/// Offline stand-in for a hosted model. Records every prompt it receives.
pub struct MockLlmClient {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers `"Echo: <prompt>"`.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fixed(reply.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Failure(message.into()))
    }

    pub fn rejecting_credentials() -> Self {
        Self::with_reply(Reply::CredentialFailure)
    }

    pub fn received_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        match &self.reply {
            Reply::Echo => Ok(format!("Echo: {}", prompt)),
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Failure(message) => Err(LlmClientError::ApiRequestFailed(message.clone())),
            Reply::CredentialFailure => Err(LlmClientError::InvalidCredentials(
                "API_KEY_INVALID".to_string(),
            )),
        }
    }
}
