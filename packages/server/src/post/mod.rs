//! Post lifecycle: ownership, cover images and persistence.

mod cover;
mod service;

use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

use crate::entity::post;

pub use cover::{ALLOWED_EXTENSIONS, derive_image_name, store_upload, validate_upload};
pub use service::{PAGE_SIZE, PostPage, PostService, PostWithAuthor};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Caller does not own this post")]
    Unauthorized,

    #[error("Post {0} not found")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Identity of the user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
}

/// Cover image attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoverImage {
    #[default]
    None,
    /// Name of the image in the image store.
    Stored(String),
}

impl CoverImage {
    pub fn name(&self) -> Option<&str> {
        match self {
            CoverImage::None => None,
            CoverImage::Stored(name) => Some(name),
        }
    }
}

impl From<Option<String>> for CoverImage {
    fn from(column: Option<String>) -> Self {
        match column {
            Some(name) if !name.is_empty() => CoverImage::Stored(name),
            _ => CoverImage::None,
        }
    }
}

impl From<CoverImage> for Option<String> {
    fn from(cover: CoverImage) -> Self {
        match cover {
            CoverImage::None => None,
            CoverImage::Stored(name) => Some(name),
        }
    }
}

impl post::Model {
    pub fn cover(&self) -> CoverImage {
        CoverImage::from(self.cover_image.clone())
    }
}

/// An uploaded image file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name, including extension.
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Title, body and optional cover image submitted for create or update.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    pub cover_image: Option<ImageUpload>,
}

/// Whether `caller` owns `post`.
pub fn is_owner(post: &post::Model, caller: &Caller) -> bool {
    post.user_id == caller.user_id
}

/// Fails with `Unauthorized` unless `caller` owns `post`.
pub fn require_owner(post: &post::Model, caller: &Caller) -> Result<(), PostError> {
    if is_owner(post, caller) {
        Ok(())
    } else {
        Err(PostError::Unauthorized)
    }
}

/// Validate title, body and, if present, the cover image of a post form.
pub fn validate_input(input: &PostInput, max_image_size: u64) -> Result<(), PostError> {
    let title = input.title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(PostError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    if input.body.trim().is_empty() {
        return Err(PostError::Validation("Body is required".into()));
    }
    if let Some(upload) = &input.cover_image {
        validate_upload(upload, max_image_size)?;
    }
    Ok(())
}
