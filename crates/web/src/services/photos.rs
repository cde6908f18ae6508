//! Store photo ingestion.
//!
//! Uploaded images are decoded, scaled to a fixed width keeping the aspect
//! ratio, re-encoded in the uploaded format and written to the uploads
//! directory under a random name. Decoding and resizing are CPU-bound and run
//! on the blocking pool.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use uuid::Uuid;

/// Width every stored photo is scaled to.
pub const PHOTO_WIDTH: u32 = 800;

/// Errors that can occur while ingesting a photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Content type is not `image/*`.
    #[error("That filetype isn't allowed!")]
    UnsupportedType(String),

    /// The bytes are not a readable image.
    #[error("That image could not be read: {0}")]
    Decode(image::ImageError),

    /// Re-encoding the resized image failed.
    #[error("failed to encode photo: {0}")]
    Encode(image::ImageError),

    /// Writing the file failed.
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking resize task panicked or was cancelled.
    #[error("resize task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PhotoError {
    /// Whether the failure is ours rather than the uploader's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Encode(_) | Self::Io(_) | Self::Task(_))
    }
}

/// A file part taken from a multipart form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Declared content type, e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Bytes,
}

/// Writes resized store photos to the uploads directory.
#[derive(Debug, Clone)]
pub struct PhotoService {
    uploads_dir: PathBuf,
}

impl PhotoService {
    /// Create a service writing under `uploads_dir`.
    #[must_use]
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Store the upload if there is one; `Ok(None)` otherwise.
    ///
    /// # Errors
    ///
    /// See [`PhotoService::store`].
    pub async fn ingest(&self, upload: Option<PhotoUpload>) -> Result<Option<String>, PhotoError> {
        match upload {
            Some(upload) => self.store(upload).await.map(Some),
            None => Ok(None),
        }
    }

    /// Resize and persist an upload, returning the generated filename.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::UnsupportedType` for non-image content types,
    /// `PhotoError::Decode` for unreadable image data, and I/O or encoding
    /// errors if the file cannot be written.
    #[tracing::instrument(skip_all, fields(content_type = %upload.content_type, size = upload.bytes.len()))]
    pub async fn store(&self, upload: PhotoUpload) -> Result<String, PhotoError> {
        let extension = photo_extension(&upload.content_type)?;
        let format = ImageFormat::from_mime_type(&upload.content_type);
        let filename = format!("{}.{extension}", Uuid::new_v4());

        let encoded =
            tokio::task::spawn_blocking(move || resize_and_encode(&upload.bytes, format)).await??;

        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::write(self.uploads_dir.join(&filename), encoded).await?;

        tracing::info!(%filename, "Photo stored");
        Ok(filename)
    }
}

/// File extension for an upload: the content-type subtype (`image/jpeg` -> `jpeg`).
///
/// # Errors
///
/// Returns `PhotoError::UnsupportedType` if the type is not `image/*`.
pub fn photo_extension(content_type: &str) -> Result<String, PhotoError> {
    let unsupported = || PhotoError::UnsupportedType(content_type.to_string());
    let subtype = content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .map(|rest| {
            rest.split(';')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        })
        .ok_or_else(unsupported)?;

    if subtype.is_empty() {
        return Err(unsupported());
    }
    Ok(subtype)
}

/// Target dimensions for a `width x height` image scaled to [`PHOTO_WIDTH`].
///
/// Height is rounded and never drops below one pixel.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn resized_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 {
        return (PHOTO_WIDTH, height.max(1));
    }
    let scaled = (f64::from(height) * f64::from(PHOTO_WIDTH) / f64::from(width)).round();
    (PHOTO_WIDTH, (scaled as u32).max(1))
}

fn resize_and_encode(bytes: &[u8], format: Option<ImageFormat>) -> Result<Vec<u8>, PhotoError> {
    let format = match format {
        Some(format) => format,
        None => image::guess_format(bytes).map_err(PhotoError::Decode)?,
    };
    let img = image::load_from_memory(bytes).map_err(PhotoError::Decode)?;

    let (width, height) = resized_dimensions(img.width(), img.height());
    let mut resized = img.resize_exact(width, height, FilterType::Lanczos3);
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        resized = DynamicImage::ImageRgb8(resized.to_rgb8());
    }

    let mut out = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut out), format)
        .map_err(PhotoError::Encode)?;
    Ok(out)
}
