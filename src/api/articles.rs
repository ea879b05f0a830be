//! Article API endpoints
//!
//! Handles HTTP requests for article management:
//! - GET /api/v1/articles - List articles
//! - POST /api/v1/articles - Create article (auth required)
//! - GET /api/v1/articles/{key} - Get article by id or slug
//! - PUT/PATCH /api/v1/articles/{key} - Update article (owner only)
//! - DELETE /api/v1/articles/{key} - Delete article (owner only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ArticleDetail, ArticleSummary};
use crate::models::{Article, ArticleKey, CreateArticleInput, UpdateArticleInput};

/// Routes readable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles))
        .route("/{key}", get(get_article))
}

/// Routes that need an authenticated user
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/", post(create_article)).route(
        "/{key}",
        axum::routing::put(update_article)
            .patch(update_article)
            .delete(delete_article),
    )
}

/// GET /api/v1/articles - List articles, newest first
async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let articles = state.article_service.list().await?;
    Ok(Json(
        articles
            .into_iter()
            .map(|article| ArticleSummary::new(article, &state.media))
            .collect(),
    ))
}

/// POST /api/v1/articles - Create a new article owned by the caller
async fn create_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(input): Json<CreateArticleInput>,
) -> Result<(StatusCode, Json<ArticleDetail>), ApiError> {
    let article = state.article_service.create(&user, input).await?;
    let detail = detail(&state, article).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/articles/{key} - Get a single article with its photos
async fn get_article(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let article = state.article_service.get(&ArticleKey::parse(&key)).await?;
    Ok(Json(detail(&state, article).await?))
}

/// PUT/PATCH /api/v1/articles/{key} - Update an article
///
/// Omitted fields keep their values; a `tags` list replaces the tag set.
async fn update_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key): Path<String>,
    Json(input): Json<UpdateArticleInput>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let article = state
        .article_service
        .update(&user, &ArticleKey::parse(&key), input)
        .await?;
    Ok(Json(detail(&state, article).await?))
}

/// DELETE /api/v1/articles/{key} - Delete an article with its photos
async fn delete_article(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .article_service
        .delete(&user, &ArticleKey::parse(&key))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn detail(state: &AppState, article: Article) -> Result<ArticleDetail, ApiError> {
    let images = state.image_service.list(Some(article.id)).await?;
    Ok(ArticleDetail::new(article, images, &state.media))
}
