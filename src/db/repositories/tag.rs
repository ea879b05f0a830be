//! Tag repository
//!
//! Database operations for tags and their article associations.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get the oldest tag with exactly this name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags, newest first
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Persist a new name and slug
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Replace the full tag set of an article
    async fn set_for_article(&self, article_id: i64, tag_ids: &[i64]) -> Result<()>;

    /// Get tags for an article, in id order
    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_tag_sqlite(pool, tag).await,
            Backend::Mysql(pool) => create_tag_mysql(pool, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_tag_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_tag_by_id_mysql(pool, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_tag_by_name_sqlite(pool, name).await,
            Backend::Mysql(pool) => get_tag_by_name_mysql(pool, name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_tags_sqlite(pool).await,
            Backend::Mysql(pool) => list_tags_mysql(pool).await,
        }
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_tag_sqlite(pool, tag).await,
            Backend::Mysql(pool) => update_tag_mysql(pool, tag).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_tag_sqlite(pool, id).await,
            Backend::Mysql(pool) => delete_tag_mysql(pool, id).await,
        }
    }

    async fn set_for_article(&self, article_id: i64, tag_ids: &[i64]) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => set_article_tags_sqlite(pool, article_id, tag_ids).await,
            Backend::Mysql(pool) => set_article_tags_mysql(pool, article_id, tag_ids).await,
        }
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_tags_by_article_sqlite(pool, article_id).await,
            Backend::Mysql(pool) => get_tags_by_article_mysql(pool, article_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO tags (name, slug, created_at) VALUES (?, ?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: tag.name.clone(),
        slug: tag.slug.clone(),
        created_at: now,
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn get_tag_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        "SELECT id, name, slug, created_at FROM tags WHERE name = ? ORDER BY id ASC LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, slug, created_at FROM tags ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    rows.iter().map(row_to_tag_sqlite).collect()
}

async fn update_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET name = ?, slug = ? WHERE id = ?")
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    Ok(tag.clone())
}

async fn delete_tag_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(result.rows_affected() > 0)
}

async fn set_article_tags_sqlite(pool: &SqlitePool, article_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear article tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to article")?;
    }

    tx.commit().await.context("Failed to commit article tags")?;
    Ok(())
}

async fn get_tags_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags by article")?;

    rows.iter().map(row_to_tag_sqlite).collect()
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO tags (name, slug, created_at) VALUES (?, ?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        name: tag.name.clone(),
        slug: tag.slug.clone(),
        created_at: now,
    })
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    row.as_ref().map(row_to_tag_mysql).transpose()
}

async fn get_tag_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Tag>> {
    // BINARY keeps the comparison case-sensitive like SQLite's default
    let row = sqlx::query(
        "SELECT id, name, slug, created_at FROM tags WHERE BINARY name = ? ORDER BY id ASC LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    row.as_ref().map(row_to_tag_mysql).transpose()
}

async fn list_tags_mysql(pool: &MySqlPool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, slug, created_at FROM tags ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    rows.iter().map(row_to_tag_mysql).collect()
}

async fn update_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET name = ?, slug = ? WHERE id = ?")
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    Ok(tag.clone())
}

async fn delete_tag_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(result.rows_affected() > 0)
}

async fn set_article_tags_mysql(pool: &MySqlPool, article_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear article tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to article")?;
    }

    tx.commit().await.context("Failed to commit article tags")?;
    Ok(())
}

async fn get_tags_by_article_mysql(pool: &MySqlPool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug, t.created_at
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags by article")?;

    rows.iter().map(row_to_tag_mysql).collect()
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        created_at: row.try_get("created_at")?,
    })
}
