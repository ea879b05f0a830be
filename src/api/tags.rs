//! Tag API endpoints
//!
//! Handles HTTP requests for tag management:
//! - GET /api/v1/tags - List tags
//! - POST /api/v1/tags - Get or create a tag by name (auth required)
//! - GET /api/v1/tags/{id} - Get tag
//! - PUT/PATCH /api/v1/tags/{id} - Rename tag (auth required)
//! - DELETE /api/v1/tags/{id} - Delete tag (auth required)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::TagResponse;

/// Request body for creating or renaming a tag
#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/", post(create_tag)).route(
        "/{id}",
        axum::routing::put(update_tag)
            .patch(update_tag)
            .delete(delete_tag),
    )
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// POST /api/v1/tags
///
/// Returns the existing tag when one with this name already exists.
async fn create_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<TagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    let tag = state.tag_service.create_or_get(&body.name).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

/// GET /api/v1/tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagResponse>, ApiError> {
    let tag = state.tag_service.get(id).await?;
    Ok(Json(tag.into()))
}

/// PUT/PATCH /api/v1/tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<TagRequest>,
) -> Result<Json<TagResponse>, ApiError> {
    let tag = state.tag_service.update(id, &body.name).await?;
    Ok(Json(tag.into()))
}

/// DELETE /api/v1/tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
