use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::ports::LlmClientError;
use crate::application::services::ChatServiceError;

use super::api_types::ErrorResponse;

pub const INVALID_MODEL_KEY_MESSAGE: &str =
    "Invalid or missing model API key. Please check your configuration.";

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    NotFound(String),
    Validation(String),
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn conversation_not_found() -> Self {
        ApiError::NotFound("Conversation not found".to_string())
    }

    /// Maps a service failure to a response. `failure` is the client-facing summary used
    /// for 500s; the underlying message goes to `details` only when `expose_details`.
    pub fn from_service(err: ChatServiceError, failure: &str, expose_details: bool) -> Self {
        match err {
            ChatServiceError::ConversationNotFound(_) => Self::conversation_not_found(),
            ChatServiceError::Inference(LlmClientError::InvalidCredentials(reason)) => {
                tracing::error!(reason = %reason, "Model API rejected credentials");
                ApiError::Internal {
                    error: INVALID_MODEL_KEY_MESSAGE.to_string(),
                    details: None,
                }
            }
            other => {
                tracing::error!(error = %other, "{}", failure);
                ApiError::Internal {
                    error: failure.to_string(),
                    details: expose_details.then(|| other.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Unauthorized(error) => (StatusCode::UNAUTHORIZED, error, None),
            ApiError::NotFound(error) => (StatusCode::NOT_FOUND, error, None),
            ApiError::Validation(error) => (StatusCode::BAD_REQUEST, error, None),
            ApiError::Internal { error, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, details)
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

pub async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
