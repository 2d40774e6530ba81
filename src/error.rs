use thiserror::Error;

/// Errors raised while handling an inbound message.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("access denied for user {0}")]
    AccessDenied(i64),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("model call failed: {0}")]
    ModelCall(String),

    #[error("empty search query")]
    EmptyQuery,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
