//! Media storage
//!
//! Stores uploaded files below the configured media root. Paths handed out
//! and persisted in the database are relative to that root, e.g.
//! `uploads/article/thumbnails/<uuid>_thumbnail.jpeg`.

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

const THUMBNAIL_DIR: &str = "uploads/article/thumbnails";
const PHOTO_DIR: &str = "uploads/article";

/// File storage rooted at a directory, served under a URL prefix
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.media_root.clone(), config.url_prefix.clone())
    }

    /// Directory all media lives under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the media root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create media root: {:?}", self.root))
    }

    /// Fresh relative path for an article thumbnail
    pub fn thumbnail_path(extension: &str) -> String {
        format!("{}/{}_thumbnail.{}", THUMBNAIL_DIR, Uuid::new_v4(), extension)
    }

    /// Fresh relative path for an article photo
    pub fn photo_path(extension: &str) -> String {
        format!("{}/{}.{}", PHOTO_DIR, Uuid::new_v4(), extension)
    }

    /// Public URL of a stored file
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }

    /// Write a file, creating parent directories as needed
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write file: {:?}", path))
    }

    /// Remove a file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete file: {:?}", path)),
        }
    }

    /// Remove a file, logging instead of failing
    pub async fn delete_quietly(&self, relative: &str) {
        if let Err(e) = self.delete(relative).await {
            tracing::warn!("Failed to remove media file {}: {:#}", relative, e);
        }
    }

    /// Whether a stored file exists
    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Refusing media path outside the media root: {}", relative);
        }
        Ok(self.root.join(rel))
    }
}
