use chat_relay::application::services::{
    CONTINUITY_INSTRUCTION, CURRENT_MESSAGE_HEADER, PREVIOUS_CONVERSATION_HEADER,
    assemble_prompt, render_history,
};
use chat_relay::domain::{ConversationId, Message, MessageRole};

fn history(conversation_id: ConversationId, turns: &[(&str, &str)]) -> Vec<Message> {
    turns
        .iter()
        .map(|(role, content)| {
            Message::new(
                conversation_id,
                MessageRole::from_stored(role),
                content.to_string(),
            )
        })
        .collect()
}

#[test]
fn given_no_history_when_assembling_then_prompt_is_sent_verbatim() {
    assert_eq!(assemble_prompt(&[], "Hi"), "Hi");
}

#[test]
fn given_no_history_and_multiline_prompt_when_assembling_then_no_framing_is_added() {
    let prompt = "line one\nline two";

    assert_eq!(assemble_prompt(&[], prompt), prompt);
}

#[test]
fn given_prior_turns_when_assembling_then_prompt_is_framed_with_previous_conversation() {
    let id = ConversationId::new();
    let history = history(id, &[("user", "Hi"), ("assistant", "Hello")]);

    let prompt = assemble_prompt(&history, "How are you");

    assert_eq!(
        prompt,
        "Previous conversation:\nUser: Hi\nAssistant: Hello\n\nCurrent message:\nHow are you\n\nPlease respond remembering our previous conversation and maintain context."
    );
}

#[test]
fn given_prior_turns_when_assembling_then_markers_appear_in_order() {
    let id = ConversationId::new();
    let history = history(id, &[("user", "Hi"), ("assistant", "Hello")]);

    let prompt = assemble_prompt(&history, "How are you");

    let previous_at = prompt.find(PREVIOUS_CONVERSATION_HEADER).unwrap();
    let history_at = prompt.find("User: Hi\nAssistant: Hello").unwrap();
    let current_at = prompt.find(CURRENT_MESSAGE_HEADER).unwrap();
    let prompt_at = prompt.find("How are you").unwrap();

    assert!(previous_at < history_at);
    assert!(history_at < current_at);
    assert!(current_at < prompt_at);
    assert!(prompt.ends_with(CONTINUITY_INSTRUCTION));
}

#[test]
fn given_prior_turns_when_assembling_then_current_prompt_is_not_rendered_as_user_line() {
    let id = ConversationId::new();
    let history = history(id, &[("user", "Hi")]);

    let prompt = assemble_prompt(&history, "Next");

    assert!(!prompt.contains("User: Next"));
}

#[test]
fn given_unrecognized_roles_when_rendering_then_they_are_dropped() {
    let id = ConversationId::new();
    let history = history(
        id,
        &[("system", "be terse"), ("user", "Hi"), ("tool", "{}"), ("assistant", "Yo")],
    );

    assert_eq!(render_history(&history), vec!["User: Hi", "Assistant: Yo"]);
}

#[test]
fn given_only_unrecognized_history_when_assembling_then_history_still_counts_as_present() {
    let id = ConversationId::new();
    let history = history(id, &[("system", "be terse")]);

    let prompt = assemble_prompt(&history, "Hi");

    assert_eq!(
        prompt,
        format!(
            "{}\n\n\n{}\nHi\n\n{}",
            PREVIOUS_CONVERSATION_HEADER, CURRENT_MESSAGE_HEADER, CONTINUITY_INSTRUCTION
        )
    );
}
