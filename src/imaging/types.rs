//! Error and output types for image ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning an image input into uploadable bytes.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The referenced file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path we attempted to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A raw byte buffer contained no data.
    #[error("Image buffer is empty")]
    EmptyBuffer,
    /// Pixel array dimensions do not describe its storage.
    #[error("Invalid pixel array: {0}")]
    InvalidShape(String),
    /// A figure handle failed to render itself.
    #[error("Failed to render figure: {0}")]
    Render(String),
    /// The image codec rejected the data.
    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

/// Encoded image ready for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// File name sent with the upload.
    pub filename: String,
    /// MIME type sniffed from the encoded bytes.
    pub mime_type: String,
}

impl EncodedImage {
    /// Wrap encoded bytes, sniffing their MIME type.
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        let mime_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("image/jpeg")
            .to_string();
        Self {
            bytes,
            filename: filename.into(),
            mime_type,
        }
    }
}
