mod conversation;
mod conversation_id;
mod conversation_title;
mod message;
mod message_id;
mod message_role;
mod user_id;

pub use conversation::Conversation;
pub use conversation_id::{ConversationId, InvalidConversationId};
pub use conversation_title::{ELLIPSIS, TITLE_PREFIX_CHARS, finalized_title, provisional_title};
pub use message::Message;
pub use message_id::MessageId;
pub use message_role::MessageRole;
pub use user_id::UserId;
