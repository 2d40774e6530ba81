//! Shared test doubles: a recording transport and a scripted model gateway.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ctxbot::error::{BotError, Result};
use ctxbot::{MessageHandle, ModelGateway, Transport, Turn, UserId};

/// Records every send and delete; hands out sequential message ids.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Mutex<Vec<(UserId, String)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
    next_id: AtomicI32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, user: UserId, text: &str) -> Result<MessageHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((user, text.to_string()));
        Ok(MessageHandle {
            chat_id: user,
            message_id: id.to_string(),
        })
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BotError::Transport("delete refused".to_string()));
        }
        self.deleted.lock().unwrap().push(handle.message_id.clone());
        Ok(())
    }
}

/// Pops scripted outcomes in order; records every call it receives. An
/// exhausted script answers with an empty string.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    pub calls: Mutex<Vec<(Vec<Turn>, String)>>,
}

impl ScriptedGateway {
    pub fn replying(reply: &str) -> Self {
        let gateway = Self::default();
        gateway
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
        gateway
    }

    pub fn failing(reason: &str) -> Self {
        let gateway = Self::default();
        gateway
            .replies
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
        gateway
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(Vec<Turn>, String)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn call(&self, turns: &[Turn], model: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((turns.to_vec(), model.to_string()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(BotError::ModelCall(reason)),
            None => Ok(String::new()),
        }
    }
}
