//! Watermark error types.
//!
//! Every failure of the watermark core falls into one of four kinds. Callers
//! at the service boundary usually collapse them into a single "processing
//! failed" outcome; [`WatermarkError::kind`] makes that mapping explicit.

use thiserror::Error;

use crate::imaging::ImageError;
use crate::pipeline::StageError;

/// Errors that can occur while applying a watermark.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// Watermark bytes could not be decoded
    #[error("Failed to load watermark image: {0}")]
    Load(#[source] ImageError),

    /// A transform stage failed (resize, colour conversion, rotation, padding)
    #[error("Failed to transform watermark: {0}")]
    Transform(#[source] StageError),

    /// Tiling the watermark failed
    #[error("Failed to replicate watermark: {0}")]
    Replication(#[source] ImageError),

    /// Compositing the watermark onto the image failed
    #[error("Failed to blend watermark: {0}")]
    Blend(#[source] ImageError),
}

/// Coarse classification of a [`WatermarkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatermarkErrorKind {
    Load,
    Transform,
    Replication,
    Blend,
}

impl WatermarkError {
    pub fn kind(&self) -> WatermarkErrorKind {
        match self {
            Self::Load(_) => WatermarkErrorKind::Load,
            Self::Transform(_) => WatermarkErrorKind::Transform,
            Self::Replication(_) => WatermarkErrorKind::Replication,
            Self::Blend(_) => WatermarkErrorKind::Blend,
        }
    }

    /// Transform failure outside of a pipeline stage.
    pub(crate) fn transform(stage: &'static str, source: ImageError) -> Self {
        Self::Transform(StageError::new(stage, source))
    }

    /// The engine error at the root of this failure.
    pub fn image_error(&self) -> &ImageError {
        match self {
            Self::Load(e) | Self::Replication(e) | Self::Blend(e) => e,
            Self::Transform(e) => &e.source,
        }
    }
}

impl From<StageError> for WatermarkError {
    fn from(err: StageError) -> Self {
        Self::Transform(err)
    }
}
