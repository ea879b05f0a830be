//! Image model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo attached to an article.
///
/// `photo` is the path relative to the media root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: i64,
    pub article_id: i64,
    pub photo: String,
    pub created_at: DateTime<Utc>,
}

/// Row to insert for a freshly stored photo
#[derive(Debug, Clone)]
pub struct NewImage {
    pub article_id: i64,
    pub photo: String,
}
