//! motoapi - REST backend for a motorcycle news site

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motoapi::{
    api::{self, AppState},
    config::Config,
    db,
};

/// Config file path: first CLI argument, then `MOTOAPI_CONFIG`, then `config.yml`
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MOTOAPI_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yml"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motoapi=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting motoapi...");

    // Load configuration
    let path = config_path();
    let config = Config::load_with_env(&path)?;
    tracing::info!("Configuration loaded from {}", path.display());

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    pool.ping().await.context("Database is not reachable")?;
    tracing::info!("Database connected: {:?}", pool.driver());

    // Run migrations
    let pending = db::migrations::pending_count(&pool).await?;
    if pending > 0 {
        tracing::info!("Applying {} pending migration(s)", pending);
    }
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(pool.clone(), &config);

    if let Some((email, password)) = config.admin.credentials() {
        if let Some(admin) = state.user_service.ensure_superuser(email, password).await? {
            tracing::info!("Created superuser {}", admin.email);
        }
    }

    state
        .media
        .ensure_root()
        .await
        .context("Media root is not writable")?;
    tracing::info!("Serving media from {}", state.media.root().display());

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
