//! Configuration management
//!
//! This module handles loading and parsing configuration for motoapi.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload and media configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Superuser seeded at startup
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/motoapi.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_capacity() -> u64 {
    1000
}

/// A bounding box images are scaled down to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBox {
    pub width: u32,
    pub height: u32,
}

impl ImageBox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded media is stored under
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// Public URL prefix the media root is served at
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Maximum size of a single uploaded file in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum size of a whole multipart request in bytes (default: 50MB)
    #[serde(default = "default_max_request_size")]
    pub max_request_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    /// Bounding box for article thumbnails
    #[serde(default = "default_thumbnail_max")]
    pub thumbnail_max: ImageBox,
    /// Bounding box for article photos
    #[serde(default = "default_photo_max")]
    pub photo_max: ImageBox,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            url_prefix: default_url_prefix(),
            max_file_size: default_max_file_size(),
            max_request_size: default_max_request_size(),
            allowed_types: default_allowed_types(),
            thumbnail_max: default_thumbnail_max(),
            photo_max: default_photo_max(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_url_prefix() -> String {
    "/media".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_request_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/bmp".to_string(),
    ]
}

fn default_thumbnail_max() -> ImageBox {
    ImageBox::new(800, 600)
}

fn default_photo_max() -> ImageBox {
    ImageBox::new(1200, 800)
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Credentials of the superuser created on first start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl AdminConfig {
    /// Both email and password, if configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides,
    /// then validate the result.
    ///
    /// Recognised variables:
    /// - MOTOAPI_HOST
    /// - MOTOAPI_PORT
    /// - MOTOAPI_DB_DRIVER
    /// - MOTOAPI_DB_URL
    /// - MOTOAPI_MEDIA_ROOT
    /// - MOTOAPI_ADMIN_EMAIL
    /// - MOTOAPI_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("MOTOAPI_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("MOTOAPI_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("MOTOAPI_DB_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("MOTOAPI_DB_URL") {
            self.database.url = url;
        }

        if let Ok(root) = std::env::var("MOTOAPI_MEDIA_ROOT") {
            self.upload.media_root = PathBuf::from(root);
        }

        if let Ok(email) = std::env::var("MOTOAPI_ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Ok(password) = std::env::var("MOTOAPI_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must not be 0".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }
        for (name, bounds) in [
            ("upload.thumbnail_max", self.upload.thumbnail_max),
            ("upload.photo_max", self.upload.photo_max),
        ] {
            if bounds.width == 0 || bounds.height == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} dimensions must be positive",
                    name
                )));
            }
        }
        if self.upload.max_file_size > self.upload.max_request_size {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size exceeds upload.max_request_size".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "MOTOAPI_HOST",
    "MOTOAPI_PORT",
    "MOTOAPI_DB_DRIVER",
    "MOTOAPI_DB_URL",
    "MOTOAPI_MEDIA_ROOT",
    "MOTOAPI_ADMIN_EMAIL",
    "MOTOAPI_ADMIN_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
