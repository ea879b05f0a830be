//! User model
//!
//! Users log in with their email address. Passwords are stored as argon2
//! hashes and never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, login identifier)
    pub email: String,
    pub name: String,
    pub surname: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Inactive users cannot obtain or use tokens
    pub is_active: bool,
    pub is_staff: bool,
    /// Admin account; grants no rights over other users' articles
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a regular active user.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(email: String, name: String, surname: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            name,
            surname,
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user may modify content owned by `owner_id`.
    ///
    /// Only the owner may; content without an owner is read-only.
    pub fn can_edit(&self, owner_id: Option<i64>) -> bool {
        owner_id == Some(self.id)
    }
}

/// Normalize an email address by lowercasing its domain part
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub name: String,
    pub surname: String,
}

/// Profile changes requested by the user
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    /// New plaintext password (will be hashed)
    pub password: Option<String>,
}
