//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod article;
pub mod image;
pub mod tag;
pub mod token;
pub mod user;

pub use article::{ArticleFiles, ArticleRepository, SqlxArticleRepository};
pub use image::{ImageRepository, SqlxImageRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{SqlxUserRepository, UserRepository};
