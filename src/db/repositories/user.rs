//! User repository
//!
//! Database operations for user accounts.

use crate::db::{Backend, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by (normalized) email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update profile fields and password hash
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user. Their tokens go with them; their articles lose the owner.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_user_sqlite(pool, user).await,
            Backend::Mysql(pool) => create_user_mysql(pool, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
                    .bind(email)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by email")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
                    .bind(email)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by email")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let sql = r#"
            UPDATE users
            SET email = ?, name = ?, surname = ?, password_hash = ?,
                is_active = ?, is_staff = ?, is_superuser = ?, updated_at = ?
            WHERE id = ?
        "#;

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql)
                    .bind(&user.email)
                    .bind(&user.name)
                    .bind(&user.surname)
                    .bind(&user.password_hash)
                    .bind(user.is_active)
                    .bind(user.is_staff)
                    .bind(user.is_superuser)
                    .bind(now)
                    .bind(user.id)
                    .execute(pool)
                    .await
                    .context("Failed to update user")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql)
                    .bind(&user.email)
                    .bind(&user.name)
                    .bind(&user.surname)
                    .bind(&user.password_hash)
                    .bind(user.is_active)
                    .bind(user.is_staff)
                    .bind(user.is_superuser)
                    .bind(now)
                    .bind(user.id)
                    .execute(pool)
                    .await
                    .context("Failed to update user")?;
            }
        }

        let mut updated = user.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
        };
        Ok(rows > 0)
    }
}

const SELECT_USER: &str = r#"
    SELECT id, email, name, surname, password_hash, is_active, is_staff, is_superuser,
           created_at, updated_at
    FROM users
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (email, name, surname, password_hash, is_active, is_staff, is_superuser, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;

    fn new_user(email: &str) -> User {
        User::new(
            email.to_string(),
            "Jan".to_string(),
            "Nowak".to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let repo = SqlxUserRepository::new(setup_pool().await);

        let created = repo.create(&new_user("jan@example.com")).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "jan@example.com");
        assert!(by_id.is_active);
        assert!(!by_id.is_superuser);

        let by_email = repo.get_by_email("jan@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = SqlxUserRepository::new(setup_pool().await);
        repo.create(&new_user("dup@example.com")).await.unwrap();
        assert!(repo.create(&new_user("dup@example.com")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_user() {
        let repo = SqlxUserRepository::new(setup_pool().await);
        let mut user = repo.create(&new_user("old@example.com")).await.unwrap();

        user.name = "Adam".to_string();
        user.is_superuser = true;
        repo.update(&user).await.unwrap();

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Adam");
        assert!(fetched.is_superuser);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqlxUserRepository::new(setup_pool().await);
        let user = repo.create(&new_user("a@example.com")).await.unwrap();
        let kept = repo.create(&new_user("b@example.com")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(repo.get_by_id(kept.id).await.unwrap().is_some());
        assert!(!repo.delete(user.id).await.unwrap());
    }
}
