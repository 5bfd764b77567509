mod api_error;
pub mod api_types;
mod chat;
mod conversations;
mod health;
mod models;

pub use api_error::{ApiError, INVALID_MODEL_KEY_MESSAGE, endpoint_not_found};
pub use chat::chat_handler;
pub use conversations::{
    delete_conversation_handler, list_conversations_handler, list_messages_handler,
};
pub use health::health_handler;
pub use models::models_handler;
