use std::time::Duration;

use async_trait::async_trait;

/// Single-shot text generation: one prompt in, one complete reply out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid or missing API key: {0}")]
    InvalidCredentials(String),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}
