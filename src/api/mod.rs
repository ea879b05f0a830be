//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints of motoapi.
//! It includes:
//! - Article API endpoints, with thumbnail and photo uploads
//! - Tag API endpoints
//! - Image API endpoints
//! - User API endpoints (registration, tokens, profile)
//! - Media file serving

pub mod articles;
pub mod auth;
pub mod images;
pub mod middleware;
pub mod responses;
pub mod tags;
pub mod upload;


use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::cache::create_cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxImageRepository, SqlxTagRepository, SqlxTokenRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{ArticleService, ImageService, MediaStorage, TagService, UserService};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

impl AppState {
    /// Wire repositories, cache and services on top of a database pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let cache = create_cache(&config.cache);
        let media = MediaStorage::from_config(&config.upload);

        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let image_repo = SqlxImageRepository::boxed(pool.clone());
        let tag_service = Arc::new(TagService::new(
            SqlxTagRepository::boxed(pool.clone()),
            cache.clone(),
        ));

        let article_service = Arc::new(ArticleService::new(
            article_repo.clone(),
            image_repo.clone(),
            tag_service.clone(),
            cache.clone(),
            media.clone(),
            &config.upload,
        ));
        let image_service = Arc::new(ImageService::new(
            image_repo,
            article_repo,
            cache.clone(),
            media.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool),
            cache,
        ));

        Self {
            user_service,
            article_service,
            tag_service,
            image_service,
            media,
            upload_config: Arc::new(config.upload.clone()),
        }
    }
}

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .nest(
            "/articles",
            articles::protected_router()
                .merge(upload::router(state.upload_config.max_request_size)),
        )
        .nest("/tags", tags::protected_router())
        .nest("/images", images::protected_router())
        .nest("/user", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/articles", articles::public_router())
        .nest("/tags", tags::public_router())
        .nest("/images", images::public_router())
        .nest("/user", auth::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = cors_layer(cors_origin);

    let mut router = Router::new().nest("/api/v1", build_api_router(state.clone()));

    let prefix = state.upload_config.url_prefix.trim_end_matches('/');
    if prefix.len() > 1 && prefix.starts_with('/') {
        router = router.nest_service(prefix, ServeDir::new(state.media.root()));
    } else {
        tracing::info!("Media served externally at {}", state.upload_config.url_prefix);
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}
