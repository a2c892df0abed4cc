//! Profile picture processing and storage.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use inkwell_common::{AppError, AppResult, LocalStorage, generate_storage_key};

/// Thumbnails fit inside a square of this many pixels.
pub const THUMBNAIL_SIZE: u32 = 125;

/// Stores uploaded profile pictures and hands back a reference string.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Resize `data` to a thumbnail, store it, and return its file name.
    async fn store_profile_picture(&self, data: Vec<u8>, original_name: &str) -> AppResult<String>;

    /// Remove a stored picture.
    async fn remove(&self, image_ref: &str) -> AppResult<()>;
}

/// Shared image store handle.
pub type ImageStoreRef = Arc<dyn ImageStore>;

/// Output format for an upload, from its file extension.
pub fn format_for(original_name: &str) -> AppResult<ImageFormat> {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        _ => Err(AppError::field(
            "picture",
            "File does not have an approved extension: jpg, png",
        )),
    }
}

/// Decode `data` and shrink it to fit [`THUMBNAIL_SIZE`], keeping the aspect ratio.
pub fn make_thumbnail(data: &[u8], format: ImageFormat) -> AppResult<Vec<u8>> {
    let image = image::load_from_memory(data)
        .map_err(|e| AppError::field("picture", format!("Unreadable image: {e}")))?;

    let thumbnail = image.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
    let thumbnail = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumbnail.to_rgb8()),
        _ => thumbnail,
    };

    let mut out = Vec::new();
    thumbnail
        .write_to(&mut Cursor::new(&mut out), format)
        .map_err(|e| AppError::DependencyFailure(format!("Failed to encode thumbnail: {e}")))?;
    Ok(out)
}

/// Writes thumbnails to a local directory under random names.
pub struct LocalImageStore {
    storage: LocalStorage,
}

impl LocalImageStore {
    /// Create a store backed by `storage`.
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store_profile_picture(&self, data: Vec<u8>, original_name: &str) -> AppResult<String> {
        let format = format_for(original_name)?;

        let thumbnail = tokio::task::spawn_blocking(move || make_thumbnail(&data, format))
            .await
            .map_err(|e| AppError::Internal(format!("Thumbnail task failed: {e}")))??;

        let key = generate_storage_key(original_name);
        self.storage.upload(&key, &thumbnail).await?;

        tracing::info!(image_ref = %key, size = thumbnail.len(), "Stored profile picture");
        Ok(key)
    }

    async fn remove(&self, image_ref: &str) -> AppResult<()> {
        self.storage.delete(image_ref).await
    }
}
