//! Image repository
//!
//! Database operations for article photos.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Image, NewImage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Image repository trait
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Insert all rows in one transaction; either every row is stored or none
    async fn create_many(&self, images: &[NewImage]) -> Result<Vec<Image>>;

    /// Get image by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Image>>;

    /// List images newest first, optionally only those of one article
    async fn list(&self, article_id: Option<i64>) -> Result<Vec<Image>>;

    /// Delete an image row. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based image repository implementation
pub struct SqlxImageRepository {
    pool: DynDatabasePool,
}

impl SqlxImageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ImageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepository {
    async fn create_many(&self, images: &[NewImage]) -> Result<Vec<Image>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_images_sqlite(pool, images).await,
            Backend::Mysql(pool) => create_images_mysql(pool, images).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Image>> {
        let sql = "SELECT id, article_id, photo, created_at FROM images WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get image by ID")?;
                row.as_ref().map(row_to_image_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get image by ID")?;
                row.as_ref().map(row_to_image_mysql).transpose()
            }
        }
    }

    async fn list(&self, article_id: Option<i64>) -> Result<Vec<Image>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_images_sqlite(pool, article_id).await,
            Backend::Mysql(pool) => list_images_mysql(pool, article_id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM images WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete image")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query("DELETE FROM images WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete image")?
                .rows_affected(),
        };
        Ok(result > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_images_sqlite(pool: &SqlitePool, images: &[NewImage]) -> Result<Vec<Image>> {
    let now = Utc::now();
    let mut created = Vec::with_capacity(images.len());
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    for image in images {
        let result = sqlx::query("INSERT INTO images (article_id, photo, created_at) VALUES (?, ?, ?)")
            .bind(image.article_id)
            .bind(&image.photo)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create image")?;

        created.push(Image {
            id: result.last_insert_rowid(),
            article_id: image.article_id,
            photo: image.photo.clone(),
            created_at: now,
        });
    }

    tx.commit().await.context("Failed to commit images")?;
    Ok(created)
}

async fn list_images_sqlite(pool: &SqlitePool, article_id: Option<i64>) -> Result<Vec<Image>> {
    let rows = match article_id {
        Some(article_id) => {
            sqlx::query(
                "SELECT id, article_id, photo, created_at FROM images WHERE article_id = ? ORDER BY id DESC",
            )
            .bind(article_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query("SELECT id, article_id, photo, created_at FROM images ORDER BY id DESC")
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list images")?;

    rows.iter().map(row_to_image_sqlite).collect()
}

fn row_to_image_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Image> {
    Ok(Image {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        photo: row.try_get("photo")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_images_mysql(pool: &MySqlPool, images: &[NewImage]) -> Result<Vec<Image>> {
    let now = Utc::now();
    let mut created = Vec::with_capacity(images.len());
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    for image in images {
        let result = sqlx::query("INSERT INTO images (article_id, photo, created_at) VALUES (?, ?, ?)")
            .bind(image.article_id)
            .bind(&image.photo)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create image")?;

        created.push(Image {
            id: result.last_insert_id() as i64,
            article_id: image.article_id,
            photo: image.photo.clone(),
            created_at: now,
        });
    }

    tx.commit().await.context("Failed to commit images")?;
    Ok(created)
}

async fn list_images_mysql(pool: &MySqlPool, article_id: Option<i64>) -> Result<Vec<Image>> {
    let rows = match article_id {
        Some(article_id) => {
            sqlx::query(
                "SELECT id, article_id, photo, created_at FROM images WHERE article_id = ? ORDER BY id DESC",
            )
            .bind(article_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query("SELECT id, article_id, photo, created_at FROM images ORDER BY id DESC")
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list images")?;

    rows.iter().map(row_to_image_mysql).collect()
}

fn row_to_image_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Image> {
    Ok(Image {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        photo: row.try_get("photo")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_article, setup_pool};

    fn new_image(article_id: i64, photo: &str) -> NewImage {
        NewImage {
            article_id,
            photo: photo.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_many_and_list() {
        let pool = setup_pool().await;
        let sqlite = pool.as_sqlite().unwrap().clone();
        let first = insert_article(&sqlite, None, "First").await;
        let second = insert_article(&sqlite, None, "Second").await;
        let repo = SqlxImageRepository::new(pool);

        let created = repo
            .create_many(&[new_image(first, "a.jpeg"), new_image(second, "b.jpeg"), new_image(second, "c.jpeg")])
            .await
            .unwrap();
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|i| i.id > 0));

        let all = repo.list(None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|i| i.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted);

        let only_second = repo.list(Some(second)).await.unwrap();
        assert_eq!(only_second.len(), 2);
        assert!(only_second.iter().all(|i| i.article_id == second));
        assert_eq!(only_second[0].photo, "c.jpeg");
    }

    #[tokio::test]
    async fn test_create_many_is_atomic() {
        let pool = setup_pool().await;
        let article = insert_article(pool.as_sqlite().unwrap(), None, "Only").await;
        let repo = SqlxImageRepository::new(pool);

        // Second row violates the foreign key
        let result = repo
            .create_many(&[new_image(article, "ok.jpeg"), new_image(9999, "bad.jpeg")])
            .await;
        assert!(result.is_err());
        assert!(repo.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_and_delete_image() {
        let pool = setup_pool().await;
        let article = insert_article(pool.as_sqlite().unwrap(), None, "A").await;
        let repo = SqlxImageRepository::new(pool);
        let image = repo.create_many(&[new_image(article, "x.jpeg")]).await.unwrap().remove(0);

        assert_eq!(repo.get_by_id(image.id).await.unwrap().unwrap().photo, "x.jpeg");
        assert!(repo.delete(image.id).await.unwrap());
        assert!(!repo.delete(image.id).await.unwrap());
        assert!(repo.get_by_id(image.id).await.unwrap().is_none());
    }
}
