//! Cache layer
//!
//! Process-local cache for article detail lookups, backed by moka.
//!
//! # Usage
//!
//! ```rust,ignore
//! use motoapi::cache::{create_cache, CacheLayer};
//! use motoapi::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set(&article_key(1), &article).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Pattern matching every cached article
pub const ARTICLE_PATTERN: &str = "article:*";

/// Cache key of an article by ID
pub fn article_key(id: i64) -> String {
    format!("article:{}", id)
}

/// Cache layer trait
///
/// Generic over the stored value, so it is used through concrete types
/// rather than `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Store a value for the configured TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Build the cache described by `config`
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let cache = MemoryCache::new(config.max_capacity, Duration::from_secs(config.ttl_seconds));
    tracing::info!(
        "Using in-memory cache (ttl {:?}, capacity {})",
        cache.ttl(),
        config.max_capacity
    );
    Arc::new(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            ttl_seconds: 120,
            max_capacity: 10,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.ttl(), Duration::from_secs(120));

        cache.set(&article_key(7), &"seven").await.unwrap();
        let value: Option<String> = cache.get("article:7").await.unwrap();
        assert_eq!(value.as_deref(), Some("seven"));
    }
}
