//! Tag service
//!
//! Tags are looked up by name before they are created, so adding the same
//! name twice (directly or through an article payload) reuses one row.
//! Cached article details embed their tags, so renaming or deleting a tag
//! drops every cached article.

use crate::cache::{CacheLayer, MemoryCache, ARTICLE_PATTERN};
use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagInput};
use crate::services::slug::slugify;
use crate::services::validation::{too_long, BLANK};
use anyhow::Context;
use std::sync::Arc;

/// Longest accepted tag name, in characters
pub const MAX_TAG_NAME_LENGTH: usize = 255;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    cache: Arc<MemoryCache>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Return the tag with this name, creating it first if needed.
    ///
    /// The name is trimmed before lookup. When several rows share a name the
    /// oldest one is returned.
    pub async fn create_or_get(&self, name: &str) -> Result<Tag, TagServiceError> {
        let name = validate_name(name)?;

        if let Some(existing) = self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to check existing tag")?
        {
            return Ok(existing);
        }

        let tag = Tag::new(name.to_string(), slugify(name));
        let created = self.repo.create(&tag).await.context("Failed to create tag")?;
        tracing::debug!("Created tag {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Get tag by ID
    pub async fn get(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", id)))
    }

    /// List all tags, newest first
    pub async fn list(&self) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    /// Rename a tag. The slug follows the new name.
    pub async fn update(&self, id: i64, name: &str) -> Result<Tag, TagServiceError> {
        let name = validate_name(name)?;
        let mut tag = self.get(id).await?;

        tag.name = name.to_string();
        tag.slug = slugify(name);

        let updated = self.repo.update(&tag).await.context("Failed to update tag")?;
        self.invalidate_articles().await;
        Ok(updated)
    }

    /// Delete a tag. Article links are removed with it.
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let deleted = self.repo.delete(id).await.context("Failed to delete tag")?;
        if !deleted {
            return Err(TagServiceError::NotFound(format!(
                "Tag with ID {} not found",
                id
            )));
        }
        self.invalidate_articles().await;
        Ok(())
    }

    /// Resolve article tag payloads to tag IDs, creating missing tags.
    ///
    /// Duplicate names collapse to one ID and the payload order is kept.
    pub async fn resolve(&self, inputs: &[TagInput]) -> Result<Vec<i64>, TagServiceError> {
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            let tag = self.create_or_get(&input.name).await?;
            if !ids.contains(&tag.id) {
                ids.push(tag.id);
            }
        }
        Ok(ids)
    }

    /// Replace the tag set of an article
    pub async fn set_for_article(
        &self,
        article_id: i64,
        inputs: &[TagInput],
    ) -> Result<Vec<Tag>, TagServiceError> {
        let ids = self.resolve(inputs).await?;
        self.repo
            .set_for_article(article_id, &ids)
            .await
            .context("Failed to set article tags")?;
        self.for_article(article_id).await
    }

    /// Tags of an article
    pub async fn for_article(&self, article_id: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .get_by_article_id(article_id)
            .await
            .context("Failed to get tags by article")
            .map_err(Into::into)
    }

    async fn invalidate_articles(&self) {
        if let Err(e) = self.cache.delete_pattern(ARTICLE_PATTERN).await {
            tracing::warn!("Failed to invalidate cached articles: {:#}", e);
        }
    }
}

fn validate_name(name: &str) -> Result<&str, TagServiceError> {
    check_name(name).map_err(TagServiceError::ValidationError)
}

/// Trim a tag name and check it, returning the message to show on failure
pub(crate) fn check_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BLANK.to_string());
    }
    if trimmed.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(too_long(MAX_TAG_NAME_LENGTH));
    }
    Ok(trimmed)
}
