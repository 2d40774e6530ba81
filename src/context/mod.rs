//! Conversation context: turn types and the trimming rules that keep a
//! context within the model's limits.

mod store;

pub use store::{ContextStore, SqliteContextStore};

use serde::{Deserialize, Serialize};

/// Who produced a turn. Stored as `"user"` / `"assistant"` strings, which is
/// also the wire form expected by the chat-completion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One message exchange unit. A context is an ordered `Vec<Turn>`; the order
/// is the literal prompt sequence sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    fn chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// Bounds a context: keeps at most the newest `max_turns` turns, then drops
/// the oldest remaining turns while the total character count exceeds
/// `max_chars`. Never reorders; idempotent. A context whose every suffix
/// exceeds the character budget trims to empty.
pub fn trim(mut turns: Vec<Turn>, max_turns: usize, max_chars: usize) -> Vec<Turn> {
    if turns.len() > max_turns {
        turns.drain(..turns.len() - max_turns);
    }

    let mut total: usize = turns.iter().map(Turn::chars).sum();
    while !turns.is_empty() && total > max_chars {
        total -= turns.remove(0).chars();
    }

    turns
}
