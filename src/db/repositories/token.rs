//! Auth token repository
//!
//! One API token per user; lookups by key resolve the request principal.

use crate::db::{Backend, DynDatabasePool};
use crate::models::AuthToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a new token
    async fn create(&self, token: &AuthToken) -> Result<AuthToken>;

    /// Get token by key
    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>>;

    /// Get the token of a user
    async fn get_by_user(&self, user_id: i64) -> Result<Option<AuthToken>>;
}

/// SQLx-based token repository implementation
pub struct SqlxTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn create(&self, token: &AuthToken) -> Result<AuthToken> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_token_sqlite(pool, token).await,
            Backend::Mysql(pool) => create_token_mysql(pool, token).await,
        }
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>> {
        let sql = "SELECT token_key, user_id, created_at FROM auth_tokens WHERE token_key = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(sql)
                    .bind(key)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get token")?;
                row.as_ref().map(row_to_token_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(sql)
                    .bind(key)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get token")?;
                row.as_ref().map(row_to_token_mysql).transpose()
            }
        }
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<AuthToken>> {
        let sql = "SELECT token_key, user_id, created_at FROM auth_tokens WHERE user_id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(sql)
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get token by user")?;
                row.as_ref().map(row_to_token_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(sql)
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get token by user")?;
                row.as_ref().map(row_to_token_mysql).transpose()
            }
        }
    }
}

async fn create_token_sqlite(pool: &SqlitePool, token: &AuthToken) -> Result<AuthToken> {
    sqlx::query("INSERT INTO auth_tokens (token_key, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token.key)
        .bind(token.user_id)
        .bind(token.created_at)
        .execute(pool)
        .await
        .context("Failed to create token")?;

    Ok(token.clone())
}

fn row_to_token_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<AuthToken> {
    Ok(AuthToken {
        key: row.try_get("token_key")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

async fn create_token_mysql(pool: &MySqlPool, token: &AuthToken) -> Result<AuthToken> {
    sqlx::query("INSERT INTO auth_tokens (token_key, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token.key)
        .bind(token.user_id)
        .bind(token.created_at)
        .execute(pool)
        .await
        .context("Failed to create token")?;

    Ok(token.clone())
}

fn row_to_token_mysql(row: &sqlx::mysql::MySqlRow) -> Result<AuthToken> {
    Ok(AuthToken {
        key: row.try_get("token_key")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}
