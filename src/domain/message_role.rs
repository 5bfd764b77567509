use std::fmt;

/// Author of a message.
///
/// Only `User` and `Assistant` are ever written. Anything else found in the store is
/// carried as `Unrecognized` so that history reads never fail on a foreign row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
    Unrecognized(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Unrecognized(raw) => raw,
        }
    }

    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Unrecognized(other.to_string()),
        }
    }

    /// Speaker label used when flattening history into a prompt.
    pub fn speaker_label(&self) -> Option<&'static str> {
        match self {
            MessageRole::User => Some("User"),
            MessageRole::Assistant => Some("Assistant"),
            MessageRole::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
