//! Article model
//!
//! This module provides:
//! - `Article` entity with its tags
//! - `ArticleCategory` enum of the fixed site sections
//! - `ArticleKey` for looking articles up by id or slug
//! - Input types for creating and updating articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tag;

/// Attribution used when the author does not name a photo source
pub const DEFAULT_PHOTOS_SOURCE: &str = "materiały producenta";

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub header: String,
    /// Short introduction
    pub lead: String,
    /// Body text
    pub main_text: String,
    /// Derived from the header on every save
    pub slug: String,
    /// Owning user; cleared when the user is deleted
    pub user_id: Option<i64>,
    pub category: ArticleCategory,
    /// Thumbnail path relative to the media root
    pub thumbnail: Option<String>,
    pub photos_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Associated tags, loaded by the service layer
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Article {
    /// Create a new article. The ID is assigned by the database.
    pub fn new(
        header: String,
        lead: String,
        main_text: String,
        slug: String,
        user_id: Option<i64>,
        category: ArticleCategory,
        photos_source: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            header,
            lead,
            main_text,
            slug,
            user_id,
            category,
            thumbnail: None,
            photos_source,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }
}

/// Site section an article is published in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleCategory {
    #[default]
    Newsy,
    Felietony,
    Relacje,
    Testy,
}

impl ArticleCategory {
    pub const ALL: [ArticleCategory; 4] = [
        ArticleCategory::Newsy,
        ArticleCategory::Felietony,
        ArticleCategory::Relacje,
        ArticleCategory::Testy,
    ];

    /// Convert category to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCategory::Newsy => "newsy",
            ArticleCategory::Felietony => "felietony",
            ArticleCategory::Relacje => "relacje",
            ArticleCategory::Testy => "testy",
        }
    }

    /// Parse category from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an article is addressed in a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleKey {
    Id(i64),
    Slug(String),
}

impl ArticleKey {
    /// Digits-only keys are ids, anything else is a slug
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) if !raw.starts_with('+') && !raw.starts_with('-') => ArticleKey::Id(id),
            _ => ArticleKey::Slug(raw.to_string()),
        }
    }
}

/// Tag reference inside an article payload, resolved by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagInput {
    pub name: String,
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleInput {
    pub header: String,
    pub lead: String,
    pub main_text: String,
    /// Defaults to `newsy`
    pub category: Option<ArticleCategory>,
    /// Defaults to [`DEFAULT_PHOTOS_SOURCE`]
    pub photos_source: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

#[cfg(test)]
impl CreateArticleInput {
    pub fn new(header: String, lead: String, main_text: String) -> Self {
        Self {
            header,
            lead,
            main_text,
            category: None,
            photos_source: None,
            tags: Vec::new(),
        }
    }

    /// Attach tags by name
    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = names
            .into_iter()
            .map(|name| TagInput { name: name.into() })
            .collect();
        self
    }
}

/// Input for updating an existing article
///
/// `tags: Some(..)` replaces the whole tag set, `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    pub header: Option<String>,
    pub lead: Option<String>,
    pub main_text: Option<String>,
    pub category: Option<ArticleCategory>,
    pub photos_source: Option<String>,
    pub tags: Option<Vec<TagInput>>,
}

#[cfg(test)]
impl UpdateArticleInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(
            names
                .into_iter()
                .map(|name| TagInput { name: name.into() })
                .collect(),
        );
        self
    }
}

impl UpdateArticleInput {
    /// Check if any column of the article row changes
    pub fn has_field_changes(&self) -> bool {
        self.header.is_some()
            || self.lead.is_some()
            || self.main_text.is_some()
            || self.category.is_some()
            || self.photos_source.is_some()
    }
}
