use crate::domain::Message;

pub const PREVIOUS_CONVERSATION_HEADER: &str = "Previous conversation:";
pub const CURRENT_MESSAGE_HEADER: &str = "Current message:";
pub const CONTINUITY_INSTRUCTION: &str =
    "Please respond remembering our previous conversation and maintain context.";

/// Builds the single text prompt sent to the model for one turn.
///
/// `history` is the prior turns as fetched from the store, oldest first, not including
/// `prompt`. An empty history yields `prompt` untouched. Otherwise the rendered history
/// is framed together with the current prompt. Messages with an unrecognized role are
/// left out of the rendering but still make the history count as present.
pub fn assemble_prompt(history: &[Message], prompt: &str) -> String {
    if history.is_empty() {
        return prompt.to_string();
    }

    let previous = render_history(history).join("\n");

    format!(
        "{PREVIOUS_CONVERSATION_HEADER}\n{previous}\n\n{CURRENT_MESSAGE_HEADER}\n{prompt}\n\n{CONTINUITY_INSTRUCTION}"
    )
}

/// One `"<Speaker>: <content>"` line per message with a known role.
pub fn render_history(history: &[Message]) -> Vec<String> {
    history
        .iter()
        .filter_map(|message| {
            message
                .role
                .speaker_label()
                .map(|label| format!("{}: {}", label, message.content))
        })
        .collect()
}
