//! Auth token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API token bound to a single user.
///
/// Tokens do not expire; a user keeps the same key until it is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    /// 32 hex characters
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Generate a fresh token for a user
    pub fn generate(user_id: i64) -> Self {
        Self {
            key: Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
