use std::path::PathBuf;

use image::ImageFormat;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::error::DomainError;

const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";
const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Stores recipe images on the local filesystem under `root`.
///
/// Stored files are referenced by `url_prefix` joined with their path relative
/// to `root`, e.g. `/media/uploads/recipe/<uuid>.png`.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Checks that `bytes` decode as an image and returns the detected format.
    pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, DomainError> {
        let invalid = || DomainError::field("image", INVALID_IMAGE);
        if bytes.is_empty() {
            return Err(DomainError::field("image", "The submitted file is empty."));
        }
        let format = image::guess_format(bytes).map_err(|e| {
            debug!("unrecognised upload: {}", e);
            invalid()
        })?;
        image::load_from_memory_with_format(bytes, format).map_err(|e| {
            debug!(?format, "upload failed to decode: {}", e);
            invalid()
        })?;
        Ok(format)
    }

    /// Writes the image under a fresh name and returns its public reference.
    pub async fn save(&self, format: ImageFormat, bytes: &[u8]) -> Result<String, DomainError> {
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{}/{}.{}", RECIPE_UPLOAD_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!(dir = %parent.display(), "failed to create upload directory: {}", e);
                DomainError::Storage(e.to_string())
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            error!(path = %path.display(), "failed to write upload: {}", e);
            DomainError::Storage(e.to_string())
        })?;

        debug!(path = %path.display(), size = bytes.len(), "image stored");
        Ok(format!("{}{}", self.url_prefix, relative))
    }

    /// Deletes a previously stored image. Unknown references are ignored.
    pub async fn remove(&self, reference: &str) {
        let Some(path) = self.path_for(reference) else {
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), "failed to remove image: {}", e);
        }
    }

    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference.strip_prefix(&self.url_prefix)?;
        let file = relative.strip_prefix(RECIPE_UPLOAD_DIR)?.strip_prefix('/')?;
        if file.is_empty() || file.contains('/') || file.contains("..") {
            return None;
        }
        Some(self.root.join(RECIPE_UPLOAD_DIR).join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(10, 10);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn png_is_accepted() {
        assert_eq!(
            ImageStorage::validate_image(&png_bytes()).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn text_is_rejected_as_image_field_error() {
        let err = ImageStorage::validate_image(b"notanimage").unwrap_err();
        match err {
            DomainError::Validation(fields) => assert!(fields.get("image").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_png_is_rejected() {
        let bytes = png_bytes();
        assert!(ImageStorage::validate_image(&bytes[..16]).is_err());
    }

    #[tokio::test]
    async fn saved_image_lands_under_root_and_can_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path(), "/media/");

        let reference = storage.save(ImageFormat::Png, &png_bytes()).await.unwrap();
        assert!(reference.starts_with("/media/uploads/recipe/"));
        assert!(reference.ends_with(".png"));

        let path = storage.path_for(&reference).unwrap();
        assert!(path.exists());

        storage.remove(&reference).await;
        assert!(!path.exists());
    }

    #[test]
    fn foreign_references_do_not_resolve() {
        let storage = ImageStorage::new("/srv/media", "/media/");
        assert!(storage.path_for("/elsewhere/uploads/recipe/a.png").is_none());
        assert!(storage.path_for("/media/uploads/recipe/../../etc/passwd").is_none());
    }
}
