//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity.
///
/// The slug is always derived from the name; names are not unique in
/// storage, reuse happens through get-or-create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name
    pub name: String,
    /// URL-friendly slug
    pub slug: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag. The ID is assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: 0,
            name,
            slug,
            created_at: Utc::now(),
        }
    }
}
