mod conversation_repository;
mod identity_verifier;
mod llm_client;
mod repository_error;

pub use conversation_repository::ConversationRepository;
pub use identity_verifier::{IdentityError, IdentityVerifier};
pub use llm_client::{LlmClient, LlmClientError};
pub use repository_error::RepositoryError;
