mod gemini_client;
mod llm_factory;
mod mock_llm_client;

pub use gemini_client::GeminiClient;
pub use llm_factory::create_llm_client;
pub use mock_llm_client::MockLlmClient;
