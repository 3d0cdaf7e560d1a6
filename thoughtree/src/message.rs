//! Chat message types sent to an [`LlmClient`](crate::LlmClient).
//!
//! Oracle prompts are rendered into a single user message; `System` is used when a
//! caller wants to prepend instructions of its own.

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; placed first when present.
    System(String),
    /// Rendered oracle prompt.
    User(String),
    /// Model reply.
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}
