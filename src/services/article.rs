//! Article service
//!
//! Implements business logic for articles:
//! - Create, read, update, delete with field validation
//! - Slug derivation from the header on every save
//! - Tag associations through [`TagService`]
//! - Thumbnail and photo uploads through the image pipeline
//! - Cache invalidation

use crate::cache::{article_key, CacheLayer, MemoryCache};
use crate::config::{ImageBox, UploadConfig};
use crate::db::repositories::{ArticleRepository, ImageRepository};
use crate::models::{
    Article, ArticleKey, CreateArticleInput, Image, NewImage, TagInput, UpdateArticleInput, User,
    DEFAULT_PHOTOS_SOURCE,
};
use crate::services::imaging::{resize_to_fit, ImageError, ProcessedImage};
use crate::services::media::MediaStorage;
use crate::services::slug::slugify;
use crate::services::tag::{check_name, TagService, TagServiceError};
use crate::services::validation::FieldErrors;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

pub const MAX_HEADER_LENGTH: usize = 255;
pub const MAX_LEAD_LENGTH: usize = 500;
pub const MAX_PHOTOS_SOURCE_LENGTH: usize = 255;

/// Multipart field carrying a thumbnail
pub const THUMBNAIL_FIELD: &str = "thumbnail";
/// Multipart field carrying photos
pub const PHOTOS_FIELD: &str = "photos";

const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// One or more fields are invalid
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// The caller may not modify this article
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for ArticleServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => ArticleServiceError::NotFound(msg),
            TagServiceError::ValidationError(msg) => {
                ArticleServiceError::ValidationError(FieldErrors::single("tags", msg))
            }
            TagServiceError::InternalError(e) => ArticleServiceError::InternalError(e),
        }
    }
}

/// Article service
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    images: Arc<dyn ImageRepository>,
    tags: Arc<TagService>,
    cache: Arc<MemoryCache>,
    media: MediaStorage,
    thumbnail_max: ImageBox,
    photo_max: ImageBox,
}

impl ArticleService {
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        images: Arc<dyn ImageRepository>,
        tags: Arc<TagService>,
        cache: Arc<MemoryCache>,
        media: MediaStorage,
        upload: &UploadConfig,
    ) -> Self {
        Self {
            repo,
            images,
            tags,
            cache,
            media,
            thumbnail_max: upload.thumbnail_max,
            photo_max: upload.photo_max,
        }
    }

    /// Create an article owned by `author`.
    ///
    /// Tags are resolved first; the row and its tag links are then stored
    /// together, so a failure leaves no article behind.
    pub async fn create(
        &self,
        author: &User,
        input: CreateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        let photos_source = input
            .photos_source
            .as_deref()
            .unwrap_or(DEFAULT_PHOTOS_SOURCE);
        validate_fields(
            &input.header,
            &input.lead,
            &input.main_text,
            photos_source,
            Some(input.tags.as_slice()),
        )
        .map_err(ArticleServiceError::ValidationError)?;

        let header = input.header.trim().to_string();
        let article = Article::new(
            header.clone(),
            input.lead.trim().to_string(),
            input.main_text.trim().to_string(),
            slugify(&header),
            Some(author.id),
            input.category.unwrap_or_default(),
            photos_source.trim().to_string(),
        );

        let tag_ids = self.tags.resolve(&input.tags).await?;
        let mut created = self
            .repo
            .create(&article, &tag_ids)
            .await
            .context("Failed to create article")?;
        created.tags = self.tags.for_article(created.id).await?;

        tracing::info!("Created article {} ({})", created.id, created.slug);
        Ok(created)
    }

    /// Look up an article by ID or slug, with its tags.
    ///
    /// A numeric key that matches no ID is retried as a slug. Slugs shared by
    /// several articles resolve to the newest one.
    pub async fn get(&self, key: &ArticleKey) -> Result<Article, ArticleServiceError> {
        match key {
            ArticleKey::Id(id) => {
                if let Some(article) = self.get_by_id(*id).await? {
                    return Ok(article);
                }
                self.get_by_slug(&id.to_string()).await
            }
            ArticleKey::Slug(slug) => self.get_by_slug(slug).await,
        }
    }

    /// Get article by ID through the cache
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        let cache_key = article_key(id);
        if let Some(article) = self.cache.get::<Article>(&cache_key).await.ok().flatten() {
            return Ok(Some(article));
        }

        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?;

        match article {
            Some(mut article) => {
                article.tags = self.tags.for_article(article.id).await?;
                if let Err(e) = self.cache.set(&cache_key, &article).await {
                    tracing::warn!("Failed to cache article {}: {:#}", id, e);
                }
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        let article = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get article by slug")?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("No article matches '{}'", slug)))?;

        self.get_by_id(article.id)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(format!("No article matches '{}'", slug)))
    }

    /// List all articles with their tags, newest first
    pub async fn list(&self) -> Result<Vec<Article>, ArticleServiceError> {
        let mut articles = self.repo.list().await.context("Failed to list articles")?;
        for article in &mut articles {
            article.tags = self.tags.for_article(article.id).await?;
        }
        Ok(articles)
    }

    /// Update an article.
    ///
    /// Only the owner may update. `tags: Some(..)` replaces the
    /// tag set, `None` keeps it. The slug is recomputed from the header.
    pub async fn update(
        &self,
        editor: &User,
        key: &ArticleKey,
        input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get(key).await?;
        ensure_can_edit(editor, &article)?;

        let header = input.header.clone().unwrap_or_else(|| article.header.clone());
        let lead = input.lead.clone().unwrap_or_else(|| article.lead.clone());
        let main_text = input
            .main_text
            .clone()
            .unwrap_or_else(|| article.main_text.clone());
        let photos_source = input
            .photos_source
            .clone()
            .unwrap_or_else(|| article.photos_source.clone());
        validate_fields(&header, &lead, &main_text, &photos_source, input.tags.as_deref())
            .map_err(ArticleServiceError::ValidationError)?;

        if input.has_field_changes() {
            article.header = header.trim().to_string();
            article.lead = lead.trim().to_string();
            article.main_text = main_text.trim().to_string();
            article.photos_source = photos_source.trim().to_string();
            if let Some(category) = input.category {
                article.category = category;
            }
            article.slug = slugify(&article.header);
            article.updated_at = Utc::now();

            let tags = std::mem::take(&mut article.tags);
            article = self
                .repo
                .update(&article)
                .await
                .context("Failed to update article")?;
            article.tags = tags;
        } else {
            tracing::debug!("No column changes for article {}", article.id);
        }

        if let Some(tags) = &input.tags {
            article.tags = self.tags.set_for_article(article.id, tags).await?;
        }

        self.invalidate(article.id).await;
        Ok(article)
    }

    /// Delete an article together with its photos and thumbnail file.
    ///
    /// The files removed are the ones the article referenced when its row
    /// was deleted, so photos stored by a concurrent upload are included.
    pub async fn delete(&self, editor: &User, key: &ArticleKey) -> Result<(), ArticleServiceError> {
        let article = self.get(key).await?;
        ensure_can_edit(editor, &article)?;

        let files = self
            .repo
            .delete(article.id)
            .await
            .context("Failed to delete article")?;
        self.invalidate(article.id).await;
        let files = files.ok_or_else(|| {
            ArticleServiceError::NotFound(format!("Article with ID {} not found", article.id))
        })?;

        if let Some(thumbnail) = &files.thumbnail {
            self.media.delete_quietly(thumbnail).await;
        }
        self.remove_files(&files.photos).await;

        tracing::info!(
            "Deleted article {} with {} photo(s)",
            article.id,
            files.photos.len()
        );
        Ok(())
    }

    /// Replace the thumbnail of an article.
    ///
    /// The upload is decoded and scaled into the thumbnail box before
    /// anything is written. The previous file is removed afterwards.
    pub async fn upload_thumbnail(
        &self,
        editor: &User,
        key: &ArticleKey,
        data: Vec<u8>,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get(key).await?;
        ensure_can_edit(editor, &article)?;

        let processed = process_upload(data, self.thumbnail_max, THUMBNAIL_FIELD).await?;
        let path = MediaStorage::thumbnail_path(processed.extension);
        self.media.save(&path, &processed.bytes).await?;

        match self.repo.set_thumbnail(article.id, Some(&path)).await {
            Ok(true) => {}
            Ok(false) => {
                self.media.delete_quietly(&path).await;
                self.invalidate(article.id).await;
                return Err(ArticleServiceError::NotFound(format!(
                    "Article with ID {} not found",
                    article.id
                )));
            }
            Err(e) => {
                self.media.delete_quietly(&path).await;
                return Err(e.context("Failed to store thumbnail").into());
            }
        }

        if let Some(previous) = article.thumbnail.replace(path) {
            self.media.delete_quietly(&previous).await;
        }
        self.invalidate(article.id).await;

        tracing::info!(
            "Stored thumbnail for article {} ({}x{})",
            article.id,
            processed.width,
            processed.height
        );
        Ok(article)
    }

    /// Attach a batch of photos to an article.
    ///
    /// Either every photo is stored or none is: all files are decoded and
    /// scaled first, then written, then inserted in one transaction. Files
    /// already written are removed if a later step fails.
    pub async fn upload_photos(
        &self,
        editor: &User,
        key: &ArticleKey,
        files: Vec<Vec<u8>>,
    ) -> Result<(Article, Vec<Image>), ArticleServiceError> {
        let article = self.get(key).await?;
        ensure_can_edit(editor, &article)?;

        if files.is_empty() {
            tracing::debug!("Empty photo upload for article {}", article.id);
            return Ok((article, Vec::new()));
        }

        let mut processed = Vec::with_capacity(files.len());
        for data in files {
            processed.push(process_upload(data, self.photo_max, PHOTOS_FIELD).await?);
        }

        let mut written: Vec<String> = Vec::with_capacity(processed.len());
        for image in &processed {
            let path = MediaStorage::photo_path(image.extension);
            if let Err(e) = self.media.save(&path, &image.bytes).await {
                self.remove_files(&written).await;
                return Err(e.into());
            }
            written.push(path);
        }

        let rows: Vec<NewImage> = written
            .iter()
            .map(|photo| NewImage {
                article_id: article.id,
                photo: photo.clone(),
            })
            .collect();

        let images = match self.images.create_many(&rows).await {
            Ok(images) => images,
            Err(e) => {
                self.remove_files(&written).await;
                return Err(e.context("Failed to store photos").into());
            }
        };
        self.invalidate(article.id).await;

        tracing::info!("Stored {} photo(s) for article {}", images.len(), article.id);
        Ok((article, images))
    }

    /// Drop the cached copy of an article
    pub async fn invalidate(&self, id: i64) {
        if let Err(e) = self.cache.delete(&article_key(id)).await {
            tracing::warn!("Failed to invalidate article {}: {:#}", id, e);
        }
    }

    async fn remove_files(&self, paths: &[String]) {
        for path in paths {
            self.media.delete_quietly(path).await;
        }
    }
}

fn ensure_can_edit(user: &User, article: &Article) -> Result<(), ArticleServiceError> {
    if user.can_edit(article.user_id) {
        Ok(())
    } else {
        Err(ArticleServiceError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
    }
}

fn validate_fields(
    header: &str,
    lead: &str,
    main_text: &str,
    photos_source: &str,
    tags: Option<&[TagInput]>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.require_text("header", header, Some(MAX_HEADER_LENGTH));
    errors.require_text("lead", lead, Some(MAX_LEAD_LENGTH));
    errors.require_text("main_text", main_text, None);
    errors.require_text("photos_source", photos_source, Some(MAX_PHOTOS_SOURCE_LENGTH));
    for tag in tags.unwrap_or_default() {
        if let Err(message) = check_name(&tag.name) {
            errors.add("tags", message);
        }
    }
    errors.into_result()
}

/// Run an upload through the resize pipeline off the async runtime
async fn process_upload(
    data: Vec<u8>,
    bounds: ImageBox,
    field: &str,
) -> Result<ProcessedImage, ArticleServiceError> {
    let result = tokio::task::spawn_blocking(move || resize_to_fit(&data, bounds))
        .await
        .context("Image processing task failed")?;

    result.map_err(|e| match e {
        ImageError::Invalid => {
            ArticleServiceError::ValidationError(FieldErrors::single(field, e.to_string()))
        }
        other => ArticleServiceError::InternalError(other.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxImageRepository};
    use crate::models::ArticleCategory;
    use crate::services::imaging::fixtures::{jpeg, png};
    use crate::services::test_support::{article_input, Fixture};

    #[tokio::test]
    async fn test_create_sets_owner_slug_and_defaults() {
        let fx = Fixture::new().await;

        let article = fx
            .articles
            .create(&fx.owner, article_input("Nowe Audi RS6 – pierwsza jazda").with_tags(["Audi", "Test"]))
            .await
            .unwrap();

        assert_eq!(article.user_id, Some(fx.owner.id));
        assert_eq!(article.slug, "nowe-audi-rs6-pierwsza-jazda");
        assert_eq!(article.category, ArticleCategory::Newsy);
        assert_eq!(article.photos_source, DEFAULT_PHOTOS_SOURCE);
        assert!(article.thumbnail.is_none());
        assert_eq!(article.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_create_validation_collects_fields() {
        let fx = Fixture::new().await;
        let mut input = CreateArticleInput::new(" ".into(), "x".repeat(501), "".into());
        input.tags = vec![TagInput { name: "  ".into() }];

        let err = fx.articles.create(&fx.owner, input).await.unwrap_err();
        let ArticleServiceError::ValidationError(errors) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        for field in ["header", "lead", "main_text", "tags"] {
            assert!(errors.contains(field), "missing {}", field);
        }
        assert!(fx.articles.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_and_slug() {
        let fx = Fixture::new().await;
        let first = fx.articles.create(&fx.owner, article_input("Same Header")).await.unwrap();
        let second = fx.articles.create(&fx.owner, article_input("Same Header")).await.unwrap();

        let by_id = fx.articles.get(&ArticleKey::Id(first.id)).await.unwrap();
        assert_eq!(by_id.id, first.id);

        let by_slug = fx.articles.get(&ArticleKey::parse("same-header")).await.unwrap();
        assert_eq!(by_slug.id, second.id);

        assert!(matches!(
            fx.articles.get(&ArticleKey::parse("missing")).await,
            Err(ArticleServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_numeric_key_falls_back_to_slug() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("2024")).await.unwrap();
        assert_eq!(article.slug, "2024");

        let found = fx.articles.get(&ArticleKey::parse("2024")).await.unwrap();
        assert_eq!(found.id, article.id);
    }

    #[tokio::test]
    async fn test_update_reslugs_and_keeps_tags() {
        let fx = Fixture::new().await;
        let article = fx
            .articles
            .create(&fx.owner, article_input("Old").with_tags(["keep"]))
            .await
            .unwrap();

        let updated = fx
            .articles
            .update(
                &fx.owner,
                &ArticleKey::Id(article.id),
                UpdateArticleInput::new().with_header("Brand New Header"),
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "brand-new-header");
        assert_eq!(updated.tags.len(), 1);

        let reloaded = fx.articles.get(&ArticleKey::Id(article.id)).await.unwrap();
        assert_eq!(reloaded.header, "Brand New Header");
        assert_eq!(reloaded.tags[0].name, "keep");
    }

    #[tokio::test]
    async fn test_update_replaces_tags() {
        let fx = Fixture::new().await;
        let article = fx
            .articles
            .create(&fx.owner, article_input("Tagged").with_tags(["a", "b"]))
            .await
            .unwrap();
        let key = ArticleKey::Id(article.id);

        let updated = fx
            .articles
            .update(&fx.owner, &key, UpdateArticleInput::new().with_tags(["c"]))
            .await
            .unwrap();
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].name, "c");

        let cleared = fx
            .articles
            .update(&fx.owner, &key, UpdateArticleInput::new().with_tags(Vec::<String>::new()))
            .await
            .unwrap();
        assert!(cleared.tags.is_empty());
    }

    #[tokio::test]
    async fn test_cached_detail_follows_tag_changes() {
        let fx = Fixture::new().await;
        let article = fx
            .articles
            .create(&fx.owner, article_input("Cached").with_tags(["Old"]))
            .await
            .unwrap();
        let key = ArticleKey::Id(article.id);

        let warm = fx.articles.get(&key).await.unwrap();
        assert_eq!(warm.tags[0].name, "Old");
        let tag_id = warm.tags[0].id;

        fx.tags.update(tag_id, "New").await.unwrap();
        let renamed = fx.articles.get(&key).await.unwrap();
        assert_eq!(renamed.tags.len(), 1);
        assert_eq!(renamed.tags[0].name, "New");
        assert_eq!(renamed.tags[0].slug, "new");

        fx.tags.delete(tag_id).await.unwrap();
        assert!(fx.articles.get(&key).await.unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Mine")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        let result = fx
            .articles
            .update(&fx.other, &key, UpdateArticleInput::new().with_header("Stolen"))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::Forbidden(_))));
        assert!(matches!(
            fx.articles.delete(&fx.other, &key).await,
            Err(ArticleServiceError::Forbidden(_))
        ));

        let unchanged = fx.articles.get(&key).await.unwrap();
        assert_eq!(unchanged.header, "Mine");
        assert_eq!(unchanged.slug, "mine");
    }

    #[tokio::test]
    async fn test_superuser_cannot_edit_foreign_article() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Owned")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        let result = fx
            .articles
            .update(&fx.admin, &key, UpdateArticleInput::new().with_header("Hijacked"))
            .await;
        assert!(matches!(result, Err(ArticleServiceError::Forbidden(_))));
        assert!(matches!(
            fx.articles.delete(&fx.admin, &key).await,
            Err(ArticleServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.articles.upload_thumbnail(&fx.admin, &key, png(10, 10)).await,
            Err(ArticleServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.articles.upload_photos(&fx.admin, &key, vec![png(10, 10)]).await,
            Err(ArticleServiceError::Forbidden(_))
        ));

        let unchanged = fx.articles.get(&key).await.unwrap();
        assert_eq!(unchanged.header, "Owned");
        assert_eq!(unchanged.slug, "owned");
        assert!(unchanged.thumbnail.is_none());
        assert!(fx.images.list(Some(article.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_owner_leaves_read_only_article() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Orphan")).await.unwrap();
        let key = ArticleKey::Id(article.id);
        assert_eq!(fx.articles.get(&key).await.unwrap().user_id, Some(fx.owner.id));

        fx.users.delete_account(&fx.owner).await.unwrap();

        let orphan = fx.articles.get(&key).await.unwrap();
        assert_eq!(orphan.header, "Orphan");
        assert_eq!(orphan.user_id, None);

        for editor in [&fx.owner, &fx.other, &fx.admin] {
            let result = fx
                .articles
                .update(editor, &key, UpdateArticleInput::new().with_header("Claimed"))
                .await;
            assert!(matches!(result, Err(ArticleServiceError::Forbidden(_))));
            assert!(matches!(
                fx.articles.delete(editor, &key).await,
                Err(ArticleServiceError::Forbidden(_))
            ));
            assert!(matches!(
                fx.articles.upload_thumbnail(editor, &key, png(10, 10)).await,
                Err(ArticleServiceError::Forbidden(_))
            ));
        }
        assert_eq!(fx.articles.get(&key).await.unwrap().header, "Orphan");
    }

    #[tokio::test]
    async fn test_thumbnail_upload_resizes_and_replaces() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Thumb")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        let first = fx
            .articles
            .upload_thumbnail(&fx.owner, &key, png(1600, 1200))
            .await
            .unwrap();
        let first_path = first.thumbnail.clone().unwrap();
        assert!(first_path.starts_with("uploads/article/thumbnails/"));
        assert!(first_path.ends_with("_thumbnail.jpeg"));

        let stored = image::open(fx.media_root().join(&first_path)).unwrap();
        assert!(stored.width() <= 800 && stored.height() <= 600);

        let second = fx
            .articles
            .upload_thumbnail(&fx.owner, &key, jpeg(20, 20))
            .await
            .unwrap();
        assert!(!fx.media.exists(&first_path).await);
        assert!(fx.media.exists(second.thumbnail.as_deref().unwrap()).await);

        let reloaded = fx.articles.get(&key).await.unwrap();
        assert_eq!(reloaded.thumbnail, second.thumbnail);
    }

    #[tokio::test]
    async fn test_invalid_thumbnail_rejected() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Bad")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        let err = fx
            .articles
            .upload_thumbnail(&fx.owner, &key, b"not an image".to_vec())
            .await
            .unwrap_err();
        let ArticleServiceError::ValidationError(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains(THUMBNAIL_FIELD));
        assert!(fx.articles.get(&key).await.unwrap().thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_photo_upload_is_all_or_nothing() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Photos")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        let result = fx
            .articles
            .upload_photos(&fx.owner, &key, vec![png(30, 30), b"garbage".to_vec()])
            .await;
        assert!(matches!(result, Err(ArticleServiceError::ValidationError(_))));
        assert!(fx.images.list(Some(article.id)).await.unwrap().is_empty());
        assert_eq!(fx.stored_photo_count(), 0);

        let (_, images) = fx
            .articles
            .upload_photos(&fx.owner, &key, vec![png(30, 30), png(2400, 800)])
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(fx.stored_photo_count(), 2);

        let big = image::open(fx.media_root().join(&images[1].photo)).unwrap();
        assert!(big.width() <= 1200 && big.height() <= 800);
    }

    #[tokio::test]
    async fn test_empty_photo_upload_is_noop() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("None")).await.unwrap();

        let (returned, images) = fx
            .articles
            .upload_photos(&fx.owner, &ArticleKey::Id(article.id), Vec::new())
            .await
            .unwrap();
        assert_eq!(returned.id, article.id);
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_uploads_require_ownership() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Owned")).await.unwrap();
        let key = ArticleKey::Id(article.id);

        assert!(matches!(
            fx.articles.upload_thumbnail(&fx.other, &key, png(5, 5)).await,
            Err(ArticleServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.articles.upload_photos(&fx.other, &key, vec![png(5, 5)]).await,
            Err(ArticleServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_photos_and_files() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Gone")).await.unwrap();
        let key = ArticleKey::Id(article.id);
        let with_thumb = fx
            .articles
            .upload_thumbnail(&fx.owner, &key, png(10, 10))
            .await
            .unwrap();
        fx.articles
            .upload_photos(&fx.owner, &key, vec![png(10, 10), png(12, 12)])
            .await
            .unwrap();

        fx.articles.delete(&fx.owner, &key).await.unwrap();

        assert!(fx.images.list(Some(article.id)).await.unwrap().is_empty());
        assert_eq!(fx.stored_photo_count(), 0);
        assert!(!fx.media.exists(with_thumb.thumbnail.as_deref().unwrap()).await);
    }

    #[tokio::test]
    async fn test_delete_removes_photos_stored_after_lookup() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Busy")).await.unwrap();
        let key = ArticleKey::Id(article.id);
        fx.articles.get(&key).await.unwrap();

        // Stored behind the cached copy's back
        let path = MediaStorage::photo_path("png");
        fx.media.save(&path, &png(10, 10)).await.unwrap();
        SqlxImageRepository::boxed(fx.pool.clone())
            .create_many(&[NewImage {
                article_id: article.id,
                photo: path.clone(),
            }])
            .await
            .unwrap();

        fx.articles.delete(&fx.owner, &key).await.unwrap();

        assert!(!fx.media.exists(&path).await);
        assert_eq!(fx.stored_photo_count(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_for_vanished_article_is_discarded() {
        let fx = Fixture::new().await;
        let article = fx.articles.create(&fx.owner, article_input("Vanished")).await.unwrap();
        let key = ArticleKey::Id(article.id);
        fx.articles.get(&key).await.unwrap();

        // Row removed while the cached copy is still served
        SqlxArticleRepository::boxed(fx.pool.clone())
            .delete(article.id)
            .await
            .unwrap();

        let result = fx.articles.upload_thumbnail(&fx.owner, &key, png(10, 10)).await;
        assert!(matches!(result, Err(ArticleServiceError::NotFound(_))));

        let thumbnails = fx.media_root().join("uploads/article/thumbnails");
        let stored = std::fs::read_dir(thumbnails).map(|d| d.count()).unwrap_or(0);
        assert_eq!(stored, 0);
        assert!(matches!(fx.articles.get(&key).await, Err(ArticleServiceError::NotFound(_))));
    }
}
