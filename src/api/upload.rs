//! Upload API endpoints
//!
//! Handles image uploads attached to articles:
//! - POST /api/v1/articles/{key}/upload-thumbnail - Replace the thumbnail
//! - POST /api/v1/articles/{key}/upload-photos - Add photos
//!
//! Files are checked for type and size here; decoding and scaling happen in
//! the article service.

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ImageResponse, PhotosResponse, ThumbnailResponse};
use crate::config::UploadConfig;
use crate::models::ArticleKey;

const THUMBNAIL_FIELD: &str = "thumbnail";
const PHOTOS_FIELD: &str = "photos";

/// Build the upload router, nested under `/articles`
pub fn router(max_request_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_request_size).unwrap_or(usize::MAX);
    Router::new()
        .route("/{key}/upload-thumbnail", post(upload_thumbnail))
        .route("/{key}/upload-photos", post(upload_photos))
        .layer(DefaultBodyLimit::max(limit))
}

/// POST /api/v1/articles/{key}/upload-thumbnail
///
/// Accepts multipart/form-data with a single file field named "thumbnail".
async fn upload_thumbnail(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    let config = &state.upload_config;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let data = read_image(field, THUMBNAIL_FIELD, config).await?;
        let article = state
            .article_service
            .upload_thumbnail(&user, &ArticleKey::parse(&key), data)
            .await?;

        return Ok(Json(ThumbnailResponse {
            id: article.id,
            thumbnail: article.thumbnail.as_deref().map(|path| state.media.url(path)),
        }));
    }

    Err(ApiError::invalid_field(
        THUMBNAIL_FIELD,
        "No file was submitted.",
    ))
}

/// POST /api/v1/articles/{key}/upload-photos
///
/// Accepts multipart/form-data with zero or more file fields named "photos".
/// Nothing is stored unless every file is accepted.
async fn upload_photos(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotosResponse>), ApiError> {
    let config = &state.upload_config;
    let mut files = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() != Some(PHOTOS_FIELD) {
            continue;
        }
        files.push(read_image(field, PHOTOS_FIELD, config).await?);
    }

    let (article, images) = state
        .article_service
        .upload_photos(&user, &ArticleKey::parse(&key), files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PhotosResponse {
            article: article.id,
            photos: images
                .into_iter()
                .map(|image| ImageResponse::new(image, &state.media))
                .collect(),
        }),
    ))
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Malformed multipart body: {}", e)))
}

/// Read one file part, checking its declared type and size
async fn read_image(
    field: Field<'_>,
    name: &str,
    config: &UploadConfig,
) -> Result<Vec<u8>, ApiError> {
    // Parts without a declared type are left to the decoder
    if let Some(content_type) = field.content_type() {
        if !config.is_type_allowed(content_type) {
            return Err(ApiError::invalid_field(
                name,
                format!(
                    "Upload a valid image. The file type {} is not supported.",
                    content_type
                ),
            ));
        }
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

    if data.is_empty() {
        return Err(ApiError::invalid_field(name, "The submitted file is empty."));
    }

    if data.len() as u64 > config.max_file_size {
        return Err(ApiError::invalid_field(
            name,
            format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            ),
        ));
    }

    Ok(data.to_vec())
}
