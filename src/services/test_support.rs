//! Fixtures shared by service and API tests

use crate::cache::MemoryCache;
use crate::config::UploadConfig;
use crate::db::repositories::test_support::setup_pool;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxImageRepository, SqlxTagRepository, SqlxTokenRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{CreateArticleInput, CreateUserInput, User};
use crate::services::{ArticleService, ImageService, MediaStorage, TagService, UserService};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const PASSWORD: &str = "testpass123";

/// Services wired to an in-memory database and a temporary media root,
/// with an owner, another regular user and a superuser
pub struct Fixture {
    pub pool: DynDatabasePool,
    pub articles: ArticleService,
    pub images: ImageService,
    pub tags: Arc<TagService>,
    pub users: UserService,
    pub media: MediaStorage,
    pub owner: User,
    pub other: User,
    pub admin: User,
    media_dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = setup_pool().await;
        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        let upload = UploadConfig::default();
        let media = MediaStorage::new(media_dir.path(), upload.url_prefix.clone());
        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));

        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let image_repo = SqlxImageRepository::boxed(pool.clone());
        let tags = Arc::new(TagService::new(
            SqlxTagRepository::boxed(pool.clone()),
            cache.clone(),
        ));

        let articles = ArticleService::new(
            article_repo.clone(),
            image_repo.clone(),
            tags.clone(),
            cache.clone(),
            media.clone(),
            &upload,
        );
        let images = ImageService::new(image_repo, article_repo, cache.clone(), media.clone());
        let users = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool.clone()),
            cache,
        );

        let owner = users.register(user_input("owner@example.com")).await.expect("owner");
        let other = users.register(user_input("other@example.com")).await.expect("other");
        let admin = users
            .create_superuser(user_input("admin@example.com"))
            .await
            .expect("admin");

        Self {
            pool,
            articles,
            images,
            tags,
            users,
            media,
            owner,
            other,
            admin,
            media_dir,
        }
    }

    pub fn media_root(&self) -> &Path {
        self.media_dir.path()
    }

    /// Number of photo files on disk, thumbnails excluded
    pub fn stored_photo_count(&self) -> usize {
        let dir = self.media_root().join("uploads/article");
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .count(),
            Err(_) => 0,
        }
    }
}

pub fn user_input(email: &str) -> CreateUserInput {
    CreateUserInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        name: "Test".to_string(),
        surname: "User".to_string(),
    }
}

pub fn article_input(header: &str) -> CreateArticleInput {
    CreateArticleInput::new(
        header.to_string(),
        "Krótki wstęp".to_string(),
        "Treść artykułu".to_string(),
    )
}
