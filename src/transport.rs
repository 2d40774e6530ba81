//! Transport abstraction for sending and deleting messages.
//!
//! The [`Transport`] trait is platform-agnostic; production code uses the
//! teloxide-based adapter in [`crate::telegram`], tests substitute a mock.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque sender identity from the messaging platform; also the
/// access-control key.
pub type UserId = i64;

/// Identifies a sent message so it can be deleted later. `message_id` is
/// transport-specific (e.g. a Telegram numeric string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: String,
}

/// One inbound message as delivered by the platform event loop.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub user_id: UserId,
    pub text: String,
    /// True for one-to-one conversations; group messages are ignored.
    pub is_direct: bool,
}

/// Sends and deletes messages on the underlying platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message to the user's direct conversation and returns a
    /// handle for later deletion.
    async fn send(&self, user: UserId, text: &str) -> Result<MessageHandle>;
    /// Deletes a previously sent message.
    async fn delete(&self, handle: &MessageHandle) -> Result<()>;
}
