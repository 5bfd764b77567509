use std::sync::Arc;

use crate::application::ports::IdentityVerifier;
use crate::application::services::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    /// Reported as `model_used` when a chat request names no model.
    pub default_model_name: String,
    pub expose_error_details: bool,
}
