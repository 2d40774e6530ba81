//! Durable per-user context storage on SQLite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use super::{Role, Turn};
use crate::error::{BotError, Result};
use crate::transport::UserId;

/// Repository for one user's ordered turn history.
///
/// `save` replaces the whole stored context; there is no incremental append.
/// A user with no stored rows loads as an empty context, never as an error.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Loads all turns for the user, ordered by sequence index ascending.
    async fn load(&self, user: UserId) -> Result<Vec<Turn>>;
    /// Atomically replaces the stored context, renumbering `0..len-1`.
    async fn save(&self, user: UserId, turns: &[Turn]) -> Result<()>;
    /// Equivalent to `save(user, &[])`.
    async fn clear(&self, user: UserId) -> Result<()>;
}

/// SQLite-backed [`ContextStore`]. Creates the database file and schema on
/// first use.
#[derive(Clone)]
pub struct SqliteContextStore {
    pool: SqlitePool,
}

impl SqliteContextStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(BotError::Storage)?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contexts (
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                message_order INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contexts_user_order
                ON contexts(user_id, message_order);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Closes the pool; call before process exit.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ContextStore for SqliteContextStore {
    async fn load(&self, user: UserId) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            "SELECT role, content FROM contexts WHERE user_id = ? ORDER BY message_order ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let role_str: String = row.try_get("role")?;
                let content: String = row.try_get("content")?;
                let role = Role::parse(&role_str).ok_or_else(|| {
                    sqlx::Error::Decode(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("invalid role: {role_str}"),
                    )))
                })?;
                Ok(Turn { role, content })
            })
            .collect::<std::result::Result<Vec<Turn>, sqlx::Error>>()
            .map_err(BotError::Storage)
    }

    async fn save(&self, user: UserId, turns: &[Turn]) -> Result<()> {
        // Delete-then-insert inside one transaction so a crash mid-save can
        // never expose a mixed old/new context.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM contexts WHERE user_id = ?")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        let timestamp = Utc::now().timestamp_millis();
        for (order, turn) in turns.iter().enumerate() {
            sqlx::query(
                "INSERT INTO contexts (user_id, role, content, timestamp, message_order) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user)
            .bind(turn.role.as_str())
            .bind(&turn.content)
            .bind(timestamp)
            .bind(order as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(user_id = user, turns = turns.len(), "Replaced stored context");
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<()> {
        self.save(user, &[]).await
    }
}
