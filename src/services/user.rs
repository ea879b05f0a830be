//! User service
//!
//! Implements account management for email-identified users:
//! - Registration of regular users and superusers
//! - Token issuing on valid credentials (one token per user, reused)
//! - Resolving request tokens to active users
//! - Profile updates with password re-hashing

use crate::cache::{CacheLayer, MemoryCache, ARTICLE_PATTERN};
use crate::db::repositories::{TokenRepository, UserRepository};
use crate::models::{normalize_email, AuthToken, CreateUserInput, UpdateProfileInput, User};
use crate::services::password::{hash_password, validate_password, verify_password};
use crate::services::validation::{FieldErrors, BLANK};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";
const EMAIL_TAKEN: &str = "User with this email already exists.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Credentials did not match an active user
    #[error("Authentication failed: {0}")]
    InvalidCredentials(String),

    /// One or more fields are invalid
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// User not found
    #[error("User not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and API tokens
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    token_repo: Arc<dyn TokenRepository>,
    cache: Arc<MemoryCache>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn TokenRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            cache,
        }
    }

    /// Register a regular user
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.create_user(input, false).await
    }

    /// Create a staff superuser
    pub async fn create_superuser(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.create_user(input, true).await
    }

    /// Create the configured superuser unless an account with that email exists.
    ///
    /// Returns the new user, or `None` if nothing was created.
    pub async fn ensure_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if self.get_by_email(email).await?.is_some() {
            tracing::debug!("Superuser {} already exists", email);
            return Ok(None);
        }

        let user = self
            .create_superuser(CreateUserInput {
                email: email.to_string(),
                password: password.to_string(),
                name: String::new(),
                surname: String::new(),
            })
            .await?;
        tracing::info!("Created superuser {}", user.email);
        Ok(Some(user))
    }

    async fn create_user(
        &self,
        input: CreateUserInput,
        superuser: bool,
    ) -> Result<User, UserServiceError> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, &input.email);
        if let Err(message) = validate_password(&input.password) {
            errors.add("password", message);
        }
        check_name(&mut errors, "name", &input.name);
        check_name(&mut errors, "surname", &input.surname);
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        if self.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::ValidationError(FieldErrors::single(
                "email",
                EMAIL_TAKEN,
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let mut user = User::new(
            email,
            input.name.trim().to_string(),
            input.surname.trim().to_string(),
            password_hash,
        );
        user.is_staff = superuser;
        user.is_superuser = superuser;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        tracing::info!("Registered user {} ({})", created.id, created.email);
        Ok(created)
    }

    /// Check credentials and return the user's API token, creating it on first use
    pub async fn obtain_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthToken, UserServiceError> {
        let mut errors = FieldErrors::new();
        if email.trim().is_empty() {
            errors.add("email", BLANK);
        }
        if password.is_empty() {
            errors.add("password", BLANK);
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        let user = match self.get_by_email(email).await? {
            Some(user) => user,
            None => {
                return Err(UserServiceError::InvalidCredentials(
                    INVALID_CREDENTIALS.to_string(),
                ))
            }
        };

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid || !user.is_active {
            tracing::debug!("Rejected token request for {}", user.email);
            return Err(UserServiceError::InvalidCredentials(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        if let Some(token) = self
            .token_repo
            .get_by_user(user.id)
            .await
            .context("Failed to get token")?
        {
            return Ok(token);
        }

        let token = self
            .token_repo
            .create(&AuthToken::generate(user.id))
            .await
            .context("Failed to create token")?;
        tracing::info!("Issued token for user {}", user.id);
        Ok(token)
    }

    /// Resolve a token key to its user. Unknown keys and inactive users give `None`.
    pub async fn authenticate_token(&self, key: &str) -> Result<Option<User>, UserServiceError> {
        let token = match self
            .token_repo
            .get_by_key(key)
            .await
            .context("Failed to look up token")?
        {
            Some(token) => token,
            None => return Ok(None),
        };

        let user = self
            .user_repo
            .get_by_id(token.user_id)
            .await
            .context("Failed to get token user")?;
        Ok(user.filter(|u| u.is_active))
    }

    /// Apply profile changes for `user`
    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut errors = FieldErrors::new();
        let email = input
            .email
            .as_deref()
            .map(|email| check_email(&mut errors, email));
        if let Some(name) = &input.name {
            check_name(&mut errors, "name", name);
        }
        if let Some(surname) = &input.surname {
            check_name(&mut errors, "surname", surname);
        }
        if let Some(password) = &input.password {
            if let Err(message) = validate_password(password) {
                errors.add("password", message);
            }
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        let mut updated = self
            .user_repo
            .get_by_id(user.id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(format!("User with ID {} not found", user.id)))?;

        if let Some(email) = email {
            if email != updated.email {
                if self.get_by_email(&email).await?.is_some() {
                    return Err(UserServiceError::ValidationError(FieldErrors::single(
                        "email",
                        EMAIL_TAKEN,
                    )));
                }
                updated.email = email;
            }
        }
        if let Some(name) = input.name {
            updated.name = name.trim().to_string();
        }
        if let Some(surname) = input.surname {
            updated.surname = surname.trim().to_string();
        }
        if let Some(password) = input.password {
            updated.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        updated.updated_at = Utc::now();

        self.user_repo
            .update(&updated)
            .await
            .context("Failed to update user")
            .map_err(Into::into)
    }

    /// Delete an account. Its token is revoked; its articles stay, without an owner.
    pub async fn delete_account(&self, user: &User) -> Result<(), UserServiceError> {
        let deleted = self
            .user_repo
            .delete(user.id)
            .await
            .context("Failed to delete user")?;
        if !deleted {
            return Err(UserServiceError::NotFound(format!(
                "User with ID {} not found",
                user.id
            )));
        }
        // Cached articles still carry the old owner ID
        if let Err(e) = self.cache.delete_pattern(ARTICLE_PATTERN).await {
            tracing::warn!("Failed to invalidate cached articles: {:#}", e);
        }
        tracing::info!("Deleted user {} ({})", user.email, user.id);
        Ok(())
    }

    /// Look up a user by email, normalizing it first
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        self.user_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to get user by email")
            .map_err(Into::into)
    }
}

/// Validate and normalize an email address
fn check_email(errors: &mut FieldErrors, email: &str) -> String {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        errors.add("email", BLANK);
    } else if normalized.chars().count() > MAX_EMAIL_LENGTH {
        errors.add("email", crate::services::validation::too_long(MAX_EMAIL_LENGTH));
    } else if !looks_like_email(&normalized) {
        errors.add("email", INVALID_EMAIL);
    }
    normalized
}

fn looks_like_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn check_name(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().chars().count() > MAX_NAME_LENGTH {
        errors.add(field, crate::services::validation::too_long(MAX_NAME_LENGTH));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use crate::db::repositories::{SqlxTokenRepository, SqlxUserRepository};
    use std::time::Duration;

    fn cache() -> Arc<MemoryCache> {
        Arc::new(MemoryCache::new(100, Duration::from_secs(60)))
    }

    async fn setup_test_service() -> UserService {
        let pool = setup_pool().await;
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool),
            cache(),
        )
    }

    fn input(email: &str, password: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            password: password.to_string(),
            name: "Test".to_string(),
            surname: "Userowsky".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let service = setup_test_service().await;

        let user = service.register(input("Jan@EXAMPLE.com", "testpass123")).await.unwrap();
        assert_eq!(user.email, "Jan@example.com");
        assert!(user.is_active);
        assert!(!user.is_staff && !user.is_superuser);
        assert_ne!(user.password_hash, "testpass123");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = setup_test_service().await;

        let err = service.register(input("not-an-email", "abc")).await.unwrap_err();
        let UserServiceError::ValidationError(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("email"));
        assert!(errors.contains("password"));

        assert!(matches!(
            service.register(input("", "testpass123")).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let service = setup_test_service().await;
        service.register(input("user@example.com", "testpass123")).await.unwrap();

        let err = service
            .register(input("user@EXAMPLE.com", "otherpass"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(ref e) if e.contains("email")));
    }

    #[tokio::test]
    async fn test_create_superuser_flags() {
        let service = setup_test_service().await;
        let admin = service
            .create_superuser(input("admin@example.com", "adminpass"))
            .await
            .unwrap();
        assert!(admin.is_staff && admin.is_superuser);
    }

    #[tokio::test]
    async fn test_ensure_superuser_is_idempotent() {
        let service = setup_test_service().await;

        let first = service.ensure_superuser("root@example.com", "rootpass").await.unwrap();
        assert!(first.is_some());
        let second = service.ensure_superuser("root@example.com", "rootpass").await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_obtain_token_reuses_key() {
        let service = setup_test_service().await;
        let user = service.register(input("user@example.com", "testpass123")).await.unwrap();

        let token = service.obtain_token("user@example.com", "testpass123").await.unwrap();
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.key.len(), 32);

        let again = service.obtain_token("user@example.com", "testpass123").await.unwrap();
        assert_eq!(token.key, again.key);

        let resolved = service.authenticate_token(&token.key).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(service.authenticate_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_obtain_token_rejections() {
        let service = setup_test_service().await;
        service.register(input("user@example.com", "testpass123")).await.unwrap();

        assert!(matches!(
            service.obtain_token("user@example.com", "badpass123").await,
            Err(UserServiceError::InvalidCredentials(_))
        ));
        assert!(matches!(
            service.obtain_token("ghost@example.com", "testpass123").await,
            Err(UserServiceError::InvalidCredentials(_))
        ));

        let err = service.obtain_token("", "").await.unwrap_err();
        let UserServiceError::ValidationError(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("email") && errors.contains("password"));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let pool = setup_pool().await;
        let users = SqlxUserRepository::boxed(pool.clone());
        let service = UserService::new(users.clone(), SqlxTokenRepository::boxed(pool), cache());

        let mut user = service.register(input("user@example.com", "testpass123")).await.unwrap();
        let token = service.obtain_token("user@example.com", "testpass123").await.unwrap();

        user.is_active = false;
        users.update(&user).await.unwrap();

        assert!(service.authenticate_token(&token.key).await.unwrap().is_none());
        assert!(matches!(
            service.obtain_token("user@example.com", "testpass123").await,
            Err(UserServiceError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = setup_test_service().await;
        let user = service.register(input("user@example.com", "pass123")).await.unwrap();

        let updated = service
            .update_profile(
                &user,
                UpdateProfileInput {
                    name: Some("TestChanged".to_string()),
                    password: Some("newpass123".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "TestChanged");
        assert_eq!(updated.surname, "Userowsky");
        assert!(verify_password("newpass123", &updated.password_hash).unwrap());
        assert!(service.obtain_token("user@example.com", "newpass123").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email_and_short_password() {
        let service = setup_test_service().await;
        let user = service.register(input("user@example.com", "pass123")).await.unwrap();
        service.register(input("other@example.com", "pass123")).await.unwrap();

        let taken = service
            .update_profile(
                &user,
                UpdateProfileInput {
                    email: Some("other@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(UserServiceError::ValidationError(_))));

        let short = service
            .update_profile(
                &user,
                UpdateProfileInput {
                    password: Some("123".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(short, Err(UserServiceError::ValidationError(_))));

        // Same email is not a conflict with itself
        service
            .update_profile(
                &user,
                UpdateProfileInput {
                    email: Some("user@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_account_revokes_token() {
        let service = setup_test_service().await;
        let user = service.register(input("gone@example.com", "pass123")).await.unwrap();
        let token = service.obtain_token("gone@example.com", "pass123").await.unwrap();

        service.delete_account(&user).await.unwrap();

        assert!(service.get_by_email("gone@example.com").await.unwrap().is_none());
        assert!(service.authenticate_token(&token.key).await.unwrap().is_none());
        assert!(matches!(
            service.delete_account(&user).await,
            Err(UserServiceError::NotFound(_))
        ));
    }
}
