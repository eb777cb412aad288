use common::storage::ImageStore;
use uuid::Uuid;

use super::{ImageUpload, PostError};
use crate::utils::filename::{sanitize_stem, split_stem_ext, validate_flat_filename};

/// File extensions accepted for cover images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];

const MAX_STEM_LEN: usize = 64;

/// Check that an upload is a non-empty image file within `max_size` bytes.
pub fn validate_upload(upload: &ImageUpload, max_size: u64) -> Result<(), PostError> {
    let file_name = validate_flat_filename(&upload.file_name)
        .map_err(|e| PostError::Validation(e.message().into()))?;

    let ext = image_extension(file_name)?;

    if let Some(content_type) = upload.content_type.as_deref()
        && !content_type.starts_with("image/")
    {
        return Err(PostError::Validation(format!(
            "Cover image must be an image, got content type '{content_type}'"
        )));
    }

    let guessed = mime_guess::from_ext(&ext).first_or_octet_stream();
    if guessed.type_() != mime_guess::mime::IMAGE {
        return Err(PostError::Validation(format!(
            "Cover image must be an image, got '.{ext}'"
        )));
    }

    if upload.data.is_empty() {
        return Err(PostError::Validation("Cover image is empty".into()));
    }

    if upload.data.len() as u64 > max_size {
        return Err(PostError::Validation(format!(
            "Cover image exceeds maximum size of {max_size} bytes"
        )));
    }

    Ok(())
}

/// Lowercased extension of `file_name`, if it is an accepted image extension.
fn image_extension(file_name: &str) -> Result<String, PostError> {
    let (_, ext) = split_stem_ext(file_name);
    let ext = ext
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| PostError::Validation("Cover image must have a file extension".into()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PostError::Validation(format!(
            "Cover image must be one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// Derive the stored name for an uploaded file: `<basename>_<uuidv7>.<ext>`.
pub fn derive_image_name(uploaded: &str) -> Result<String, PostError> {
    let file_name = validate_flat_filename(uploaded)
        .map_err(|e| PostError::Validation(e.message().into()))?;
    let ext = image_extension(file_name)?;
    let (stem, _) = split_stem_ext(file_name);
    let stem = sanitize_stem(stem, MAX_STEM_LEN).unwrap_or_else(|| "image".to_string());

    Ok(format!("{stem}_{}.{ext}", Uuid::now_v7().simple()))
}

/// Store an upload in the image store under a freshly derived name.
pub async fn store_upload(
    images: &dyn ImageStore,
    upload: &ImageUpload,
) -> Result<String, PostError> {
    let name = derive_image_name(&upload.file_name)?;
    let size = images.put(&name, &upload.data).await?;
    tracing::info!(name = %name, size, "Stored cover image");
    Ok(name)
}
