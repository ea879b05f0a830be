//! Article repository
//!
//! Database operations for articles. Tags are stored separately and
//! handled by the tag repository; returned articles have an empty tag list.
//! Creation links the initial tags, and deletion reports the files the
//! article referenced, each within a single transaction.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Article, ArticleCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Media files referenced by a deleted article
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFiles {
    pub thumbnail: Option<String>,
    pub photos: Vec<String>,
}

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article linked to `tag_ids`. Nothing is stored if a link fails.
    async fn create(&self, article: &Article, tag_ids: &[i64]) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get the newest article with this slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// List all articles, newest first
    async fn list(&self) -> Result<Vec<Article>>;

    /// Persist the editable columns of an article
    async fn update(&self, article: &Article) -> Result<Article>;

    /// Set or clear the thumbnail path. Returns false if the article is gone.
    async fn set_thumbnail(&self, id: i64, thumbnail: Option<&str>) -> Result<bool>;

    /// Delete an article. Images and tag links go with it.
    ///
    /// Returns the files of the article as they were at deletion time, or
    /// `None` if there was no such article.
    async fn delete(&self, id: i64) -> Result<Option<ArticleFiles>>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ARTICLE: &str = r#"
    SELECT id, header, lead, main_text, slug, user_id, category, thumbnail,
           photos_source, created_at, updated_at
    FROM articles
"#;

const INSERT_ARTICLE: &str = r#"
    INSERT INTO articles (header, lead, main_text, slug, user_id, category, thumbnail,
                          photos_source, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE articles
    SET header = ?, lead = ?, main_text = ?, slug = ?, category = ?, photos_source = ?,
        updated_at = ?
    WHERE id = ?
"#;

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article, tag_ids: &[i64]) -> Result<Article> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_article_sqlite(pool, article, tag_ids).await,
            Backend::Mysql(pool) => create_article_mysql(pool, article, tag_ids).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("{} WHERE id = ?", SELECT_ARTICLE);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by ID")?;
                row.as_ref().map(row_to_article_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by ID")?;
                row.as_ref().map(row_to_article_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let sql = format!("{} WHERE slug = ? ORDER BY id DESC LIMIT 1", SELECT_ARTICLE);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by slug")?;
                row.as_ref().map(row_to_article_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get article by slug")?;
                row.as_ref().map(row_to_article_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Article>> {
        let sql = format!("{} ORDER BY id DESC", SELECT_ARTICLE);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list articles")?;
                rows.iter().map(row_to_article_sqlite).collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list articles")?;
                rows.iter().map(row_to_article_mysql).collect()
            }
        }
    }

    async fn update(&self, article: &Article) -> Result<Article> {
        let now = Utc::now();
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(UPDATE_ARTICLE)
                    .bind(&article.header)
                    .bind(&article.lead)
                    .bind(&article.main_text)
                    .bind(&article.slug)
                    .bind(article.category.as_str())
                    .bind(&article.photos_source)
                    .bind(now)
                    .bind(article.id)
                    .execute(pool)
                    .await
                    .context("Failed to update article")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(UPDATE_ARTICLE)
                    .bind(&article.header)
                    .bind(&article.lead)
                    .bind(&article.main_text)
                    .bind(&article.slug)
                    .bind(article.category.as_str())
                    .bind(&article.photos_source)
                    .bind(now)
                    .bind(article.id)
                    .execute(pool)
                    .await
                    .context("Failed to update article")?;
            }
        }

        let mut updated = article.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    async fn set_thumbnail(&self, id: i64, thumbnail: Option<&str>) -> Result<bool> {
        let sql = "UPDATE articles SET thumbnail = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(thumbnail)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to set article thumbnail")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(thumbnail)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to set article thumbnail")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<Option<ArticleFiles>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_article_sqlite(pool, id).await,
            Backend::Mysql(pool) => delete_article_mysql(pool, id).await,
        }
    }
}

fn parse_category(raw: &str) -> ArticleCategory {
    ArticleCategory::from_str(raw).unwrap_or_else(|| {
        tracing::warn!("Unknown article category '{}', using default", raw);
        ArticleCategory::default()
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(
    pool: &SqlitePool,
    article: &Article,
    tag_ids: &[i64],
) -> Result<Article> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&article.header)
        .bind(&article.lead)
        .bind(&article.main_text)
        .bind(&article.slug)
        .bind(article.user_id)
        .bind(article.category.as_str())
        .bind(&article.thumbnail)
        .bind(&article.photos_source)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create article")?;
    let id = result.last_insert_rowid();

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to article")?;
    }

    tx.commit().await.context("Failed to commit article")?;
    Ok(Article {
        id,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ArticleFiles>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let Some(row) = sqlx::query("SELECT thumbnail FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to get article")?
    else {
        return Ok(None);
    };
    let thumbnail: Option<String> = row.try_get("thumbnail")?;

    let photos = sqlx::query("SELECT photo FROM images WHERE article_id = ?")
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list article photos")?
        .iter()
        .map(|row| row.try_get("photo"))
        .collect::<Result<Vec<String>, _>>()?;

    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete article")?;

    tx.commit().await.context("Failed to commit article delete")?;
    Ok(Some(ArticleFiles { thumbnail, photos }))
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let category: String = row.try_get("category")?;
    Ok(Article {
        id: row.try_get("id")?,
        header: row.try_get("header")?,
        lead: row.try_get("lead")?,
        main_text: row.try_get("main_text")?,
        slug: row.try_get("slug")?,
        user_id: row.try_get("user_id")?,
        category: parse_category(&category),
        thumbnail: row.try_get("thumbnail")?,
        photos_source: row.try_get("photos_source")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        tags: Vec::new(),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(
    pool: &MySqlPool,
    article: &Article,
    tag_ids: &[i64],
) -> Result<Article> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&article.header)
        .bind(&article.lead)
        .bind(&article.main_text)
        .bind(&article.slug)
        .bind(article.user_id)
        .bind(article.category.as_str())
        .bind(&article.thumbnail)
        .bind(&article.photos_source)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create article")?;
    let id = result.last_insert_id() as i64;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to article")?;
    }

    tx.commit().await.context("Failed to commit article")?;
    Ok(Article {
        id,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ArticleFiles>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // The row lock holds off photo inserts until the delete commits
    let Some(row) = sqlx::query("SELECT thumbnail FROM articles WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to get article")?
    else {
        return Ok(None);
    };
    let thumbnail: Option<String> = row.try_get("thumbnail")?;

    let photos = sqlx::query("SELECT photo FROM images WHERE article_id = ?")
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list article photos")?
        .iter()
        .map(|row| row.try_get("photo"))
        .collect::<Result<Vec<String>, _>>()?;

    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete article")?;

    tx.commit().await.context("Failed to commit article delete")?;
    Ok(Some(ArticleFiles { thumbnail, photos }))
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let category: String = row.try_get("category")?;
    Ok(Article {
        id: row.try_get("id")?,
        header: row.try_get("header")?,
        lead: row.try_get("lead")?,
        main_text: row.try_get("main_text")?,
        slug: row.try_get("slug")?,
        user_id: row.try_get("user_id")?,
        category: parse_category(&category),
        thumbnail: row.try_get("thumbnail")?,
        photos_source: row.try_get("photos_source")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        tags: Vec::new(),
    })
}
