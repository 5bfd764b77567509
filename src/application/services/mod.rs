mod chat_service;
mod context_assembler;
mod conversation_locks;

pub use chat_service::{
    ChatOptions, ChatService, ChatServiceError, DEFAULT_HISTORY_LIMIT, DEFAULT_LIST_LIMIT,
    TurnOutcome,
};
pub use context_assembler::{
    CONTINUITY_INSTRUCTION, CURRENT_MESSAGE_HEADER, PREVIOUS_CONVERSATION_HEADER,
    assemble_prompt, render_history,
};
pub use conversation_locks::ConversationLocks;
