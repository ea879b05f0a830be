//! User API endpoints
//!
//! Handles HTTP requests for accounts and tokens:
//! - POST /api/v1/user/register - User registration
//! - POST /api/v1/user/token - Exchange email and password for an API token
//! - GET /api/v1/user/profile - Get current user
//! - PUT/PATCH /api/v1/user/profile - Update current user
//! - DELETE /api/v1/user/profile - Delete current user, keeping their articles

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{method_not_allowed, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ProfileResponse, TokenResponse};
use crate::models::{CreateUserInput, UpdateProfileInput};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

impl From<RegisterRequest> for CreateUserInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            name: req.name,
            surname: req.surname,
        }
    }
}

/// Request body for obtaining a token
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for profile updates; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password: Option<String>,
}

impl From<ProfileRequest> for UpdateProfileInput {
    fn from(req: ProfileRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            surname: req.surname,
            password: req.password,
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(obtain_token))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile)
            .put(update_profile)
            .patch(update_profile)
            .delete(delete_profile)
            .post(method_not_allowed),
    )
}

/// POST /api/v1/user/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let user = state.user_service.register(body.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/user/token
async fn obtain_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .user_service
        .obtain_token(&body.email, &body.password)
        .await?;
    Ok(Json(TokenResponse { token: token.key }))
}

/// GET /api/v1/user/profile
async fn get_profile(AuthenticatedUser(user): AuthenticatedUser) -> Json<ProfileResponse> {
    Json(user.into())
}

/// PUT/PATCH /api/v1/user/profile
async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.user_service.update_profile(&user, body.into()).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/user/profile
async fn delete_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_account(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
