//! Image API endpoints
//!
//! - GET /api/v1/images?article-id=N - List photos, optionally per article
//! - GET /api/v1/images/{id} - Get photo
//! - DELETE /api/v1/images/{id} - Delete photo (article owner only)
//!
//! Photos are only created through the article upload endpoint, so
//! POST /api/v1/images answers 405.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{method_not_allowed, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ImageResponse;

/// Query parameters for the image list
#[derive(Debug, Default, Deserialize)]
pub struct ListImagesQuery {
    #[serde(rename = "article-id")]
    pub article_id: Option<i64>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_images))
        .route("/{id}", get(get_image))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(method_not_allowed))
        .route("/{id}", delete(delete_image))
}

/// GET /api/v1/images
async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let images = state.image_service.list(query.article_id).await?;
    Ok(Json(
        images
            .into_iter()
            .map(|image| ImageResponse::new(image, &state.media))
            .collect(),
    ))
}

/// GET /api/v1/images/{id}
async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ImageResponse>, ApiError> {
    let image = state.image_service.get(id).await?;
    Ok(Json(ImageResponse::new(image, &state.media)))
}

/// DELETE /api/v1/images/{id}
async fn delete_image(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.image_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
