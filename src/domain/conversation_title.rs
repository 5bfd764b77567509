/// Number of leading characters of the first prompt kept in a title.
pub const TITLE_PREFIX_CHARS: usize = 50;
pub const ELLIPSIS: &str = "...";

/// Title given to a conversation when it is created, before any turn completes.
///
/// The ellipsis is appended unconditionally, even for short prompts.
pub fn provisional_title(prompt: &str) -> String {
    let mut title = leading_chars(prompt);
    title.push_str(ELLIPSIS);
    title
}

/// Title written after the first completed turn. The ellipsis only marks real truncation.
pub fn finalized_title(prompt: &str) -> String {
    let mut title = leading_chars(prompt);
    if prompt.chars().count() > TITLE_PREFIX_CHARS {
        title.push_str(ELLIPSIS);
    }
    title
}

fn leading_chars(prompt: &str) -> String {
    prompt.chars().take(TITLE_PREFIX_CHARS).collect()
}
