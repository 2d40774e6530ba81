//! Command routing: classifies inbound text into a control command or a chat
//! turn and drives the load → append → trim → model → persist cycle.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::context::{trim, ContextStore, Turn};
use crate::dispatch::OutboundDispatcher;
use crate::error::{BotError, Result};
use crate::gateway::ModelGateway;
use crate::transport::{Inbound, UserId};

pub const ACCESS_DENIED_REPLY: &str = "Доступ запрещён. Этот бот приватный.";
pub const HELP_REPLY: &str = "Команды:\n\
    /clear - очистить контекст\n\
    /context - посмотреть контекст\n\
    /search <запрос> - поиск в интернете";
pub const CLEARED_REPLY: &str = "Контекст очищен.";
pub const EMPTY_CONTEXT_REPLY: &str = "Контекст пуст.";
pub const SEARCH_PROMPT_REPLY: &str = "Укажите запрос для поиска. Пример: /search погода в Москве";
pub const SEARCH_STATUS: &str = "Ищу в интернете...";
pub const CHAT_STATUS: &str = "Обрабатываю запрос...";
pub const SEARCH_PREFIX: &str = "Поиск в интернете: ";

/// How many turns `/context` previews and how much of each.
const CONTEXT_PREVIEW_TURNS: usize = 3;
const CONTEXT_PREVIEW_CHARS: usize = 200;

/// What an inbound text turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    ShowContext,
    /// The query is everything after the literal 7-byte `/search` prefix,
    /// whitespace-trimmed. May be empty.
    Search(String),
    Chat(String),
}

/// Classifies normalized (trimmed, lower-cased) text. Matching is exact and
/// case-insensitive; `/search` is a prefix cut, not a token split, so
/// `/searchfoo` yields the query `foo`.
pub fn classify(text: &str) -> Command {
    let text = text.trim();
    let lower = text.to_lowercase();
    match lower.as_str() {
        "/help" => Command::Help,
        "/clear" | "clear" | "очистить" | "сброс" => Command::Clear,
        "/context" | "контекст" => Command::ShowContext,
        _ if lower.starts_with("/search") => {
            Command::Search(text.get(7..).unwrap_or_default().trim().to_string())
        }
        _ => Command::Chat(text.to_string()),
    }
}

/// Dispatches classified commands against the store, gateway, and
/// dispatcher. One instance serves all users; per-user request handling is
/// serialized with a lock keyed by user id, so two quick messages from the
/// same user cannot clobber each other's persisted turns.
pub struct CommandRouter {
    store: Arc<dyn ContextStore>,
    gateway: Arc<dyn ModelGateway>,
    dispatcher: OutboundDispatcher,
    allowed_users: HashSet<UserId>,
    model: String,
    search_model: String,
    max_turns: usize,
    max_chars: usize,
    user_locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CommandRouter {
    pub fn new(
        config: &BotConfig,
        store: Arc<dyn ContextStore>,
        gateway: Arc<dyn ModelGateway>,
        dispatcher: OutboundDispatcher,
    ) -> Self {
        Self {
            store,
            gateway,
            dispatcher,
            allowed_users: config.allowed_users.clone(),
            model: config.model.clone(),
            search_model: config.search_model.clone(),
            max_turns: config.max_turns,
            max_chars: config.max_chars,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(user).or_default().clone()
    }

    /// Handles one inbound message end to end. Access-control, empty-query,
    /// and model-call failures become user-facing replies here; storage and
    /// transport errors bubble to the caller.
    pub async fn handle(&self, inbound: &Inbound) -> Result<()> {
        if !inbound.is_direct {
            debug!(user_id = inbound.user_id, "Ignoring non-direct message");
            return Ok(());
        }

        let user = inbound.user_id;
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;

        match self.route(user, inbound.text.trim()).await {
            Err(BotError::AccessDenied(id)) => {
                warn!(user_id = id, "Access denied");
                self.dispatcher.send(user, ACCESS_DENIED_REPLY).await?;
                Ok(())
            }
            Err(BotError::EmptyQuery) => {
                self.dispatcher.send(user, SEARCH_PROMPT_REPLY).await?;
                Ok(())
            }
            Err(BotError::ModelCall(reason)) => {
                error!(user_id = user, error = %reason, "Model call failed");
                self.dispatcher
                    .send(user, &format!("Ошибка при обращении к AI: {reason}"))
                    .await?;
                Ok(())
            }
            other => other,
        }
    }

    async fn route(&self, user: UserId, text: &str) -> Result<()> {
        if !self.allowed_users.contains(&user) {
            return Err(BotError::AccessDenied(user));
        }

        info!(user_id = user, "Handling message");

        match classify(text) {
            Command::Help => {
                self.dispatcher.send(user, HELP_REPLY).await?;
                Ok(())
            }
            Command::Clear => {
                self.store.clear(user).await?;
                self.dispatcher.send(user, CLEARED_REPLY).await?;
                Ok(())
            }
            Command::ShowContext => self.show_context(user).await,
            Command::Search(query) if query.is_empty() => Err(BotError::EmptyQuery),
            Command::Search(query) => {
                let prompt = format!("{SEARCH_PREFIX}{query}");
                self.chat_turn(user, prompt, &self.search_model, SEARCH_STATUS)
                    .await
            }
            Command::Chat(text) => self.chat_turn(user, text, &self.model, CHAT_STATUS).await,
        }
    }

    async fn show_context(&self, user: UserId) -> Result<()> {
        let ctx = self.store.load(user).await?;
        if ctx.is_empty() {
            self.dispatcher.send(user, EMPTY_CONTEXT_REPLY).await?;
            return Ok(());
        }

        let preview = ctx
            .iter()
            .take(CONTEXT_PREVIEW_TURNS)
            .enumerate()
            .map(|(i, turn)| {
                let head: String = turn.content.chars().take(CONTEXT_PREVIEW_CHARS).collect();
                format!("{}. ({}) {}...", i + 1, turn.role.as_str(), head)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        self.dispatcher
            .send(
                user,
                &format!(
                    "В контексте {} сообщений.\n\nПервые 3:\n{}",
                    ctx.len(),
                    preview
                ),
            )
            .await?;
        Ok(())
    }

    /// Shared chat-turn path for the default and search models. Persists
    /// only after a successful model call: a failed call leaves the stored
    /// context exactly as it was.
    async fn chat_turn(
        &self,
        user: UserId,
        text: String,
        model: &str,
        status_text: &str,
    ) -> Result<()> {
        let mut ctx = self.store.load(user).await?;
        ctx.push(Turn::user(text));
        let mut ctx = trim(ctx, self.max_turns, self.max_chars);

        let status = self.dispatcher.send_status(user, status_text).await?;
        let answer = self.gateway.call(&ctx, model).await?;

        ctx.push(Turn::assistant(answer.clone()));
        let ctx = trim(ctx, self.max_turns, self.max_chars);
        self.store.save(user, &ctx).await?;

        self.dispatcher.delete_status(&status).await;
        self.dispatcher.send_chunked(user, &answer).await
    }
}
