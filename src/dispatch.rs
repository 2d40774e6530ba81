//! Outbound message dispatch: chunking long replies and the transient
//! status-message lifecycle.

use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::transport::{MessageHandle, Transport, UserId};

/// Splits `text` into contiguous chunks of exactly `limit` characters (the
/// last chunk shorter). Boundaries are character positions, not bytes, so a
/// chunk is never cut inside a multi-byte sequence. No part markers.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if limit == 0 || chars.len() <= limit {
        return vec![text.to_string()];
    }
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Sends replies over a [`Transport`], splitting anything longer than the
/// platform's per-message limit.
pub struct OutboundDispatcher {
    transport: Arc<dyn Transport>,
    chunk_limit: usize,
}

impl OutboundDispatcher {
    pub fn new(transport: Arc<dyn Transport>, chunk_limit: usize) -> Self {
        Self {
            transport,
            chunk_limit,
        }
    }

    /// Sends a short reply as one message.
    pub async fn send(&self, user: UserId, text: &str) -> Result<MessageHandle> {
        self.transport.send(user, text).await
    }

    /// Sends a reply, split into transport-sized chunks in order.
    pub async fn send_chunked(&self, user: UserId, text: &str) -> Result<()> {
        for part in chunk_text(text, self.chunk_limit) {
            self.transport.send(user, &part).await?;
        }
        Ok(())
    }

    /// Sends a transient status message; the handle is kept so the message
    /// can be deleted once the real answer is ready.
    pub async fn send_status(&self, user: UserId, text: &str) -> Result<MessageHandle> {
        self.transport.send(user, text).await
    }

    /// Deletes a status message. Deletion failures are logged, not escalated:
    /// a leftover status message is cosmetic.
    pub async fn delete_status(&self, handle: &MessageHandle) {
        if let Err(e) = self.transport.delete(handle).await {
            warn!(error = %e, message_id = %handle.message_id, "Failed to delete status message");
        }
    }
}
