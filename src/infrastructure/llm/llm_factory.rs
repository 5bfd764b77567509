use std::sync::Arc;

use crate::application::ports::LlmClient;
use crate::presentation::config::{LlmProvider, LlmSettings};

use super::{GeminiClient, MockLlmClient};

pub fn create_llm_client(settings: &LlmSettings) -> Arc<dyn LlmClient> {
    match settings.provider {
        LlmProvider::Gemini => {
            if settings.api_key.trim().is_empty() {
                tracing::warn!("No LLM API key configured; chat turns will fail");
            }
            Arc::new(GeminiClient::new(
                settings.base_url.clone(),
                settings.api_key.clone(),
                settings.model.clone(),
                settings.temperature,
            ))
        }
        LlmProvider::Echo => {
            tracing::info!("Using echo LLM provider");
            Arc::new(MockLlmClient::echo())
        }
    }
}
