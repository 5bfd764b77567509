use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::domain::ConversationId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::auth::AuthenticatedUser;
use crate::presentation::state::AppState;

use super::ApiError;
use super::api_types::{ChatRequest, ChatResponse};

const CHAT_FAILURE: &str = "Failed to generate response. Please try again.";

#[tracing::instrument(skip_all, fields(user_id = %user))]
pub async fn chat_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected chat request body");
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let prompt = request
        .prompt
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing required parameter: prompt".to_string()))?;

    tracing::info!(prompt = %sanitize_prompt(&prompt), "Chat request");

    // an id that does not parse can never match, so the turn starts a new conversation
    let requested = request
        .conversation_id
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| match raw.parse::<ConversationId>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed conversation id");
                None
            }
        });

    let model_used = request
        .model_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| state.default_model_name.clone());

    let outcome = state
        .chat_service
        .handle_turn(&user, &prompt, requested)
        .await
        .map_err(|e| ApiError::from_service(e, CHAT_FAILURE, state.expose_error_details))?;

    Ok(Json(ChatResponse {
        content: outcome.reply,
        conversation_id: outcome.conversation_id.to_string(),
        model_used,
    }))
}
