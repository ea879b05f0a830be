//! Database layer
//!
//! Storage for articles, tags, images, users and tokens. Supports:
//! - SQLite (default)
//! - MySQL
//!
//! The driver is selected from configuration; repositories dispatch on
//! [`Backend`] to run the matching SQL dialect.
//!
//! # Usage
//!
//! ```ignore
//! use motoapi::config::DatabaseConfig;
//! use motoapi::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};
