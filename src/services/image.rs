//! Image service
//!
//! Article photos can be listed, fetched and deleted here. They are only
//! created through [`ArticleService::upload_photos`](super::ArticleService::upload_photos).

use crate::cache::{article_key, CacheLayer, MemoryCache};
use crate::db::repositories::{ArticleRepository, ImageRepository};
use crate::models::{Image, User};
use crate::services::media::MediaStorage;
use anyhow::Context;
use std::sync::Arc;

/// Error types for image service operations
#[derive(Debug, thiserror::Error)]
pub enum ImageServiceError {
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Only the owner of the article may remove its photos
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ImageService {
    repo: Arc<dyn ImageRepository>,
    articles: Arc<dyn ArticleRepository>,
    cache: Arc<MemoryCache>,
    media: MediaStorage,
}

impl ImageService {
    pub fn new(
        repo: Arc<dyn ImageRepository>,
        articles: Arc<dyn ArticleRepository>,
        cache: Arc<MemoryCache>,
        media: MediaStorage,
    ) -> Self {
        Self {
            repo,
            articles,
            cache,
            media,
        }
    }

    /// List photos newest first, optionally of one article
    pub async fn list(&self, article_id: Option<i64>) -> Result<Vec<Image>, ImageServiceError> {
        self.repo
            .list(article_id)
            .await
            .context("Failed to list images")
            .map_err(Into::into)
    }

    pub async fn get(&self, id: i64) -> Result<Image, ImageServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get image")?
            .ok_or_else(|| ImageServiceError::NotFound(format!("Image with ID {} not found", id)))
    }

    /// Delete a photo row and its file
    pub async fn delete(&self, editor: &User, id: i64) -> Result<(), ImageServiceError> {
        let image = self.get(id).await?;
        let article = self
            .articles
            .get_by_id(image.article_id)
            .await
            .context("Failed to get image article")?;

        let owner = article.and_then(|a| a.user_id);
        if !editor.can_edit(owner) {
            return Err(ImageServiceError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ));
        }

        self.repo.delete(id).await.context("Failed to delete image")?;
        self.media.delete_quietly(&image.photo).await;
        if let Err(e) = self.cache.delete(&article_key(image.article_id)).await {
            tracing::warn!("Failed to invalidate article {}: {:#}", image.article_id, e);
        }
        Ok(())
    }
}
