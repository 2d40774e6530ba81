//! # ctxbot
//!
//! Private chat bot that forwards allow-listed users' direct messages to an
//! OpenAI-compatible API, keeping a rolling per-user conversation context in
//! SQLite.
//!
//! ## Modules
//!
//! - [`context`] – turn types, trimming, and the SQLite context store
//! - [`router`] – command classification and the chat-turn cycle
//! - [`gateway`] – chat-completion calls via async-openai
//! - [`dispatch`] – outbound chunking and status-message lifecycle
//! - [`transport`] / [`telegram`] – the messaging-platform boundary
//! - [`config`], [`error`], [`logger`], [`cli`] – ambient plumbing

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod router;
pub mod telegram;
pub mod transport;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use context::{trim, ContextStore, Role, SqliteContextStore, Turn};
pub use dispatch::{chunk_text, OutboundDispatcher};
pub use error::BotError;
pub use gateway::{ModelGateway, OpenAiGateway};
pub use router::{classify, Command, CommandRouter};
pub use transport::{Inbound, MessageHandle, Transport, UserId};

/// Builds every component from config and runs the bot until interrupted.
/// Closes the database pool before returning so shutdown is clean.
pub async fn run(token: Option<String>) -> Result<()> {
    let config = BotConfig::load(token)?;
    config.validate()?;

    if let Some(dir) = Path::new(&config.log_file).parent() {
        std::fs::create_dir_all(dir)?;
    }
    logger::init_tracing(&config.log_file)?;

    info!(
        allowed_users = ?config.allowed_users,
        database_url = %config.database_url,
        model = %config.model,
        "Starting bot"
    );

    if let Some(dir) = Path::new(config.database_url.trim_start_matches("sqlite:")).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let store = SqliteContextStore::new(&config.database_url).await?;
    let gateway = Arc::new(OpenAiGateway::new(&config));
    let bot = teloxide::Bot::new(config.bot_token.clone());
    let transport: Arc<dyn Transport> = Arc::new(telegram::TelegramTransport::new(bot.clone()));
    let dispatcher = OutboundDispatcher::new(Arc::clone(&transport), config.chunk_limit);
    let router = Arc::new(CommandRouter::new(
        &config,
        Arc::new(store.clone()),
        gateway,
        dispatcher,
    ));

    telegram::run_repl(bot, router, transport).await;

    store.close().await;
    info!("Database connection closed");
    Ok(())
}
