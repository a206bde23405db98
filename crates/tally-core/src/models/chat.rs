use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_secs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// One message in the assistant transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub sent_at: u64,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Assistant)
    }

    fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            text: text.into(),
            sender,
            sent_at: now_secs(),
        }
    }

    /// Role string for the chat completions payload.
    pub fn role(&self) -> &'static str {
        match self.sender {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}
