//! Thin wrapper around teloxide::Bot implementing the [`Transport`] trait.

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, MessageId},
};

use crate::error::{BotError, Result};
use crate::transport::{MessageHandle, Transport, UserId};

/// Telegram-backed [`Transport`]. In a private chat the chat id equals the
/// sender's user id, so sending "to a user" targets `ChatId(user)`.
pub struct TelegramTransport {
    bot: teloxide::Bot,
}

impl TelegramTransport {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, user: UserId, text: &str) -> Result<MessageHandle> {
        let sent = self
            .bot
            .send_message(ChatId(user), text.to_string())
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;
        Ok(MessageHandle {
            chat_id: user,
            message_id: sent.id.0.to_string(),
        })
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<()> {
        let id: i32 = handle.message_id.parse().map_err(|_| {
            BotError::Transport(format!("invalid message id: {}", handle.message_id))
        })?;
        self.bot
            .delete_message(ChatId(handle.chat_id), MessageId(id))
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;
        Ok(())
    }
}
