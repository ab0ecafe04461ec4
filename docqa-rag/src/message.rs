//! Chat turns exchanged with the generation model.

use serde::{Deserialize, Serialize};

/// A single chat turn.
///
/// Serializes as `{"role": "...", "content": "..."}`, the shape chat
/// completion APIs expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    /// Instructions that frame the whole exchange.
    System(String),
    /// A turn written by the user.
    User(String),
    /// A turn written by the model.
    Assistant(String),
}

impl ChatMessage {
    /// The role name as sent on the wire.
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System(_) => "system",
            ChatMessage::User(_) => "user",
            ChatMessage::Assistant(_) => "assistant",
        }
    }

    /// The message text.
    pub fn text(&self) -> &str {
        match self {
            ChatMessage::System(t) | ChatMessage::User(t) | ChatMessage::Assistant(t) => t,
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            ChatMessage::System(t) | ChatMessage::User(t) | ChatMessage::Assistant(t) => t,
        }
    }
}

/// Rewrite `messages` so that roles strictly alternate.
///
/// All system texts are merged into one leading system message. Assistant
/// turns that precede the first user turn are dropped, consecutive turns of
/// the same role are joined with a blank line, and blank messages are
/// skipped. The input is left untouched.
pub fn normalize_turns(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut system: Vec<&str> = Vec::new();
    let mut turns: Vec<ChatMessage> = Vec::new();

    for message in messages {
        let text = message.text();
        if text.trim().is_empty() {
            continue;
        }
        if let ChatMessage::System(_) = message {
            system.push(text);
            continue;
        }

        let continues_turn = turns.last().is_some_and(|prev| prev.role() == message.role());
        if continues_turn {
            if let Some(prev) = turns.last_mut() {
                let prev = prev.text_mut();
                prev.push_str("\n\n");
                prev.push_str(text);
            }
        } else if !(turns.is_empty() && matches!(message, ChatMessage::Assistant(_))) {
            turns.push(message.clone());
        }
    }

    let mut normalized = Vec::with_capacity(turns.len() + 1);
    if !system.is_empty() {
        normalized.push(ChatMessage::System(system.join("\n\n")));
    }
    normalized.extend(turns);
    normalized
}
