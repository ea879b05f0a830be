//! Data models
//!
//! Plain data structures used throughout motoapi:
//! - Database entities (Article, Tag, Image, User, AuthToken)
//! - Input types consumed by the services

mod article;
mod image;
mod tag;
mod token;
mod user;

pub use article::{
    Article, ArticleCategory, ArticleKey, CreateArticleInput, TagInput, UpdateArticleInput,
    DEFAULT_PHOTOS_SOURCE,
};
pub use image::{Image, NewImage};
pub use tag::Tag;
pub use token::AuthToken;
pub use user::{normalize_email, CreateUserInput, UpdateProfileInput, User};
