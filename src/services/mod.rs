//! Services layer - Business logic
//!
//! Services implement the rules of the API on top of the repositories:
//! validation, ownership checks, slug derivation, the image pipeline and
//! cache invalidation.

pub mod article;
pub mod image;
pub mod imaging;
pub mod media;
pub mod password;
pub mod slug;
pub mod tag;
pub mod user;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use article::{ArticleService, ArticleServiceError};
pub use image::{ImageService, ImageServiceError};
pub use imaging::{resize_to_fit, ImageError, ProcessedImage};
pub use media::MediaStorage;
pub use password::{hash_password, verify_password};
pub use slug::slugify;
pub use tag::{TagService, TagServiceError};
pub use user::{UserService, UserServiceError};
pub use validation::FieldErrors;
