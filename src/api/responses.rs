//! Shared API response types
//!
//! Stored media paths are rendered as public URLs here.

use serde::{Deserialize, Serialize};

use crate::models::{Article, ArticleCategory, Image, Tag, User};
use crate::services::MediaStorage;

/// Tag as embedded in article payloads and returned by the tag endpoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
        }
    }
}

/// Article in list views
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub header: String,
    /// Owning user ID
    pub user: Option<i64>,
    pub slug: String,
    pub tags: Vec<TagResponse>,
    pub category: ArticleCategory,
    pub thumbnail: Option<String>,
}

impl ArticleSummary {
    pub fn new(article: Article, media: &MediaStorage) -> Self {
        Self {
            id: article.id,
            header: article.header,
            user: article.user_id,
            slug: article.slug,
            tags: article.tags.into_iter().map(TagResponse::from).collect(),
            category: article.category,
            thumbnail: article.thumbnail.as_deref().map(|path| media.url(path)),
        }
    }
}

/// Full article with its photos
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    pub lead: String,
    pub main_text: String,
    pub photos_source: String,
    pub images: Vec<ImageResponse>,
}

impl ArticleDetail {
    pub fn new(article: Article, images: Vec<Image>, media: &MediaStorage) -> Self {
        let lead = article.lead.clone();
        let main_text = article.main_text.clone();
        let photos_source = article.photos_source.clone();
        Self {
            summary: ArticleSummary::new(article, media),
            lead,
            main_text,
            photos_source,
            images: images
                .into_iter()
                .map(|image| ImageResponse::new(image, media))
                .collect(),
        }
    }
}

/// Article photo
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    pub id: i64,
    /// Article ID
    pub article: i64,
    /// Public URL of the photo
    pub photo: String,
}

impl ImageResponse {
    pub fn new(image: Image, media: &MediaStorage) -> Self {
        Self {
            id: image.id,
            article: image.article_id,
            photo: media.url(&image.photo),
        }
    }
}

/// Result of a thumbnail upload
#[derive(Debug, Serialize, Deserialize)]
pub struct ThumbnailResponse {
    pub id: i64,
    pub thumbnail: Option<String>,
}

/// Result of a photo upload
#[derive(Debug, Serialize, Deserialize)]
pub struct PhotosResponse {
    pub article: i64,
    pub photos: Vec<ImageResponse>,
}

/// API token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile of the current user
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
    pub surname: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
            surname: user.surname,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleCategory;

    fn article() -> Article {
        let mut article = Article::new(
            "Header".into(),
            "Lead".into(),
            "Text".into(),
            "header".into(),
            Some(3),
            ArticleCategory::Testy,
            "materiały producenta".into(),
        );
        article.id = 9;
        article.thumbnail = Some("uploads/article/thumbnails/x_thumbnail.jpeg".into());
        article
    }

    #[test]
    fn test_summary_renders_urls() {
        let media = MediaStorage::new("media", "/media");
        let json = serde_json::to_value(ArticleSummary::new(article(), &media)).unwrap();

        assert_eq!(json["user"], 3);
        assert_eq!(json["category"], "testy");
        assert_eq!(
            json["thumbnail"],
            "/media/uploads/article/thumbnails/x_thumbnail.jpeg"
        );
        assert!(json.get("main_text").is_none());
    }

    #[test]
    fn test_detail_is_flat() {
        let media = MediaStorage::new("media", "/media");
        let json = serde_json::to_value(ArticleDetail::new(article(), Vec::new(), &media)).unwrap();

        assert_eq!(json["id"], 9);
        assert_eq!(json["lead"], "Lead");
        assert_eq!(json["photos_source"], "materiały producenta");
        assert!(json["images"].as_array().unwrap().is_empty());
    }
}
