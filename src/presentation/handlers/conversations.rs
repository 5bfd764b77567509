use axum::Json;
use axum::extract::{Path, State};

use crate::domain::ConversationId;
use crate::presentation::auth::AuthenticatedUser;
use crate::presentation::state::AppState;

use super::ApiError;
use super::api_types::{
    ConversationSummary, ConversationsResponse, DeleteResponse, MessageView, MessagesResponse,
};

fn parse_conversation_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse().map_err(|_| ApiError::conversation_not_found())
}

#[tracing::instrument(skip_all, fields(user_id = %user))]
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let conversations = state
        .chat_service
        .list_conversations(&user)
        .await
        .map_err(|e| {
            ApiError::from_service(e, "Failed to fetch conversations", state.expose_error_details)
        })?;

    Ok(Json(ConversationsResponse {
        conversations: conversations
            .into_iter()
            .map(ConversationSummary::from)
            .collect(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %user, conversation_id = %raw_id))]
pub async fn list_messages_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&raw_id)?;

    let messages = state
        .chat_service
        .list_history(&user, conversation_id)
        .await
        .map_err(|e| {
            ApiError::from_service(e, "Failed to fetch messages", state.expose_error_details)
        })?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %user, conversation_id = %raw_id))]
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&raw_id)?;

    state
        .chat_service
        .delete_conversation(&user, conversation_id)
        .await
        .map_err(|e| {
            ApiError::from_service(e, "Failed to delete conversation", state.expose_error_details)
        })?;

    Ok(Json(DeleteResponse {
        message: "Conversation deleted successfully".to_string(),
    }))
}
