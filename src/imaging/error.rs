//! Image engine error types
//!
//! Every engine operation reports failures through [`ImageError`]. The
//! watermark layer wraps these into its own taxonomy without altering them.

use thiserror::Error;

/// Errors raised by an [`ImageEngine`](super::ImageEngine) operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    // === Decoding Errors ===
    /// Image format is not supported
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Failed to decode image data
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: String },

    // === Processing Errors ===
    /// Resize operation failed
    #[error("Resize failed: {message}")]
    ResizeFailed { message: String },

    /// Requested or resulting dimensions are unusable
    #[error("Invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: i64,
        height: i64,
        reason: String,
    },

    /// The image is not in a colour model the operation accepts
    #[error("Colour space mismatch: {message}")]
    ColorspaceMismatch { message: String },

    /// A sequentially decoded image was read a second time
    #[error("Image is sequential and was already read; copy it to memory first")]
    SequentialReread,

    /// Tiling the image across a canvas failed
    #[error("Replicate failed: {message}")]
    TileFailed { message: String },

    /// Any other failure reported by the engine
    #[error("Image engine failure in {operation}: {message}")]
    EngineFailure { operation: String, message: String },
}

impl ImageError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn invalid_dimensions(width: i64, height: i64, reason: impl Into<String>) -> Self {
        ImageError::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    pub fn colorspace_mismatch(message: impl Into<String>) -> Self {
        ImageError::ColorspaceMismatch {
            message: message.into(),
        }
    }

    pub fn tile_failed(message: impl Into<String>) -> Self {
        ImageError::TileFailed {
            message: message.into(),
        }
    }

    pub fn engine_failure(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EngineFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => ImageError::unsupported_format(e.to_string()),
            other => ImageError::decode_failed(other.to_string()),
        }
    }
}
