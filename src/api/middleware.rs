//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and its mapping from service errors
//! - Token authentication (`Authorization: Token <key>` or `Bearer <key>`)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::models::User;
use crate::services::{
    ArticleService, ArticleServiceError, FieldErrors, ImageService, ImageServiceError,
    MediaStorage, TagService, TagServiceError, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub tag_service: Arc<TagService>,
    pub image_service: Arc<ImageService>,
    pub media: MediaStorage,
    pub upload_config: Arc<UploadConfig>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new("METHOD_NOT_ALLOWED", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Validation error carrying per-field messages
    pub fn invalid_fields(errors: &FieldErrors) -> Self {
        let details = serde_json::to_value(errors).unwrap_or_default();
        Self::with_details("VALIDATION_ERROR", errors.to_string(), details)
    }

    /// Validation error for a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::invalid_fields(&FieldErrors::single(field, message))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "METHOD_NOT_ALLOWED" => StatusCode::METHOD_NOT_ALLOWED,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", err);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(msg) => ApiError::not_found(msg),
            ArticleServiceError::ValidationError(errors) => ApiError::invalid_fields(&errors),
            ArticleServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ArticleServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => ApiError::not_found(msg),
            TagServiceError::ValidationError(msg) => ApiError::invalid_field("name", msg),
            TagServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<ImageServiceError> for ApiError {
    fn from(err: ImageServiceError) -> Self {
        match err {
            ImageServiceError::NotFound(msg) => ApiError::not_found(msg),
            ImageServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ImageServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidCredentials(msg) => {
                ApiError::invalid_field("non_field_errors", msg)
            }
            UserServiceError::ValidationError(errors) => ApiError::invalid_fields(&errors),
            UserServiceError::NotFound(msg) => ApiError::not_found(msg),
            UserServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

/// Handler for methods a resource does not support
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed.")
}

/// Extract the API token from the `Authorization` header
fn extract_token(request: &Request) -> Option<String> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))?;

    let user = state
        .user_service
        .authenticate_token(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token."))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request_with_auth(value: &str) -> Request {
        HttpRequest::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(
            extract_token(&request_with_auth("Token abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_token(&request_with_auth("Bearer abc123")),
            Some("abc123".to_string())
        );
        assert!(extract_token(&request_with_auth("Basic abc123")).is_none());
        assert!(extract_token(&request_with_auth("Token ")).is_none());
    }

    #[test]
    fn test_extract_token_missing() {
        let request = HttpRequest::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_token(&request).is_none());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::method_not_allowed("x").status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::new("CONFLICT", "x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::new("SOMETHING_ELSE", "x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_details_serialized() {
        let error = ApiError::invalid_field("thumbnail", "Upload a valid image.");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"]["thumbnail"][0], "Upload a valid image.");
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error: ApiError =
            ArticleServiceError::InternalError(anyhow::anyhow!("disk on fire")).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.error.message.contains("disk"));
    }
}
