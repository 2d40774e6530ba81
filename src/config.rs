//! Immutable runtime configuration, loaded once at startup from the
//! environment and passed to each component. No ambient globals.

use std::collections::HashSet;
use std::env;

use crate::error::{BotError, Result};

/// Default context bounds and limits; overridable via environment.
pub const DEFAULT_MAX_TURNS: usize = 30;
pub const DEFAULT_MAX_CHARS: usize = 20000;
pub const DEFAULT_CHUNK_LIMIT: usize = 4000;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// OPENAI_API_KEY
    pub api_key: String,
    /// OPENAI_BASE_URL
    pub api_base_url: String,
    /// ALLOWED_USERS, comma-separated ids
    pub allowed_users: HashSet<i64>,
    /// MODEL_NAME
    pub model: String,
    /// SEARCH_MODEL_NAME, used for `/search` turns
    pub search_model: String,
    /// MAX_TOKENS, output cap per model call
    pub max_tokens: u32,
    /// MAX_MESSAGES_IN_CONTEXT
    pub max_turns: usize,
    /// MAX_CHARS_IN_CONTEXT
    pub max_chars: usize,
    /// MAX_MESSAGE_LEN, per-message platform limit for outbound chunking
    pub chunk_limit: usize,
    /// MODEL_TIMEOUT_SECS
    pub model_timeout_secs: u64,
    /// DATABASE_URL (SQLite)
    pub database_url: String,
    /// LOG_FILE
    pub log_file: String,
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| BotError::Config(format!("{name} not set")))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_allowed_users(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| BotError::Config(format!("invalid user id in ALLOWED_USERS: {s}")))
        })
        .collect()
}

impl BotConfig {
    /// Loads config from environment variables. `token` overrides BOT_TOKEN
    /// if provided. Call [`validate`](Self::validate) after load to fail fast.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => required("BOT_TOKEN")?,
        };
        let api_key = required("OPENAI_API_KEY")?;
        let api_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.aitunnel.ru/v1/".to_string());
        let allowed_users = parse_allowed_users(&required("ALLOWED_USERS")?)?;
        let model = env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-5-mini".to_string());
        let search_model = env::var("SEARCH_MODEL_NAME")
            .unwrap_or_else(|_| "gpt-4o-mini-search-preview".to_string());
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:data/bot_contexts.db".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/ctxbot.log".to_string());

        Ok(Self {
            bot_token,
            api_key,
            api_base_url,
            allowed_users,
            model,
            search_model,
            max_tokens: parsed_or("MAX_TOKENS", DEFAULT_MAX_TOKENS),
            max_turns: parsed_or("MAX_MESSAGES_IN_CONTEXT", DEFAULT_MAX_TURNS),
            max_chars: parsed_or("MAX_CHARS_IN_CONTEXT", DEFAULT_MAX_CHARS),
            chunk_limit: parsed_or("MAX_MESSAGE_LEN", DEFAULT_CHUNK_LIMIT),
            model_timeout_secs: parsed_or("MODEL_TIMEOUT_SECS", DEFAULT_MODEL_TIMEOUT_SECS),
            database_url,
            log_file,
        })
    }

    /// Checks config consistency before any component is built.
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.api_base_url).is_err() {
            return Err(BotError::Config(format!(
                "OPENAI_BASE_URL is not a valid URL: {}",
                self.api_base_url
            )));
        }
        if self.allowed_users.is_empty() {
            return Err(BotError::Config(
                "ALLOWED_USERS is empty; nobody could talk to the bot".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(allowed: &[i64]) -> BotConfig {
        BotConfig {
            bot_token: "t".into(),
            api_key: "k".into(),
            api_base_url: "https://api.example.com/v1/".into(),
            allowed_users: allowed.iter().copied().collect(),
            model: "m".into(),
            search_model: "s".into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_turns: DEFAULT_MAX_TURNS,
            max_chars: DEFAULT_MAX_CHARS,
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            model_timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            database_url: "sqlite::memory:".into(),
            log_file: "logs/test.log".into(),
        }
    }

    #[test]
    fn parse_allowed_users_accepts_comma_list() {
        let users = parse_allowed_users("123, 345,678").unwrap();
        assert_eq!(users, [123, 345, 678].into_iter().collect());
    }

    #[test]
    fn parse_allowed_users_rejects_garbage() {
        assert!(parse_allowed_users("123,abc").is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = test_config(&[1]);
        config.api_base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_allow_list() {
        assert!(test_config(&[]).validate().is_err());
    }
}
