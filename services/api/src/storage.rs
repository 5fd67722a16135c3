//! Product image storage on the local filesystem
//!
//! Images are written into the uploads directory and referenced by their
//! public path, `/uploads/<file>`, which the router serves statically.

use chrono::Utc;
use rand::Rng;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum accepted image size: 5 MiB
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];
const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Only image files are allowed!")]
    NotAnImage,

    #[error("File too large")]
    TooLarge,

    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// An image received in a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-side file name; only its extension is kept
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Lowercased extension if both it and the declared MIME type are allowed images
    fn checked_extension(&self) -> Result<String, StorageError> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or(StorageError::NotAnImage)?;

        let content_type_allowed = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct.to_ascii_lowercase().as_str()));

        if !content_type_allowed {
            return Err(StorageError::NotAnImage);
        }

        Ok(extension)
    }
}

#[derive(Debug, Clone)]
pub struct ImageStorage {
    dir: PathBuf,
}

impl ImageStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored images
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory if it does not exist yet
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        info!("Serving uploads from {}", self.dir.display());
        Ok(())
    }

    /// Validate and persist an image, returning its public path
    pub async fn store(&self, upload: &ImageUpload) -> Result<String, StorageError> {
        if upload.data.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge);
        }

        let extension = upload.checked_extension()?;
        let file_name = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            rand::thread_rng().gen_range(0..1_000_000_000u32),
            extension
        );

        tokio::fs::write(self.dir.join(&file_name), &upload.data).await?;
        info!("Stored image {} ({} bytes)", file_name, upload.data.len());

        Ok(format!("{PUBLIC_PREFIX}{file_name}"))
    }

    /// Delete a previously stored image by its public path
    ///
    /// Only the final path component is used, so a crafted path cannot
    /// reach outside the uploads directory. Failures are logged, not returned.
    pub async fn remove(&self, public_path: &str) {
        let relative = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .unwrap_or(public_path);

        let Some(file_name) = Path::new(relative).file_name() else {
            warn!("Refusing to remove image with path {}", public_path);
            return;
        };

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => info!("Removed image {}", public_path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Image {} was already gone", public_path)
            }
            Err(e) => warn!("Failed to remove image {}: {}", public_path, e),
        }
    }
}
