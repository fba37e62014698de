//! Watermark module for applying an image watermark to processed images.
//!
//! One watermark image is configured per process. Requests opt in through
//! [`WatermarkOptions`] and choose opacity, size, placement and whether the
//! watermark is tiled across the whole image.
//!
//! # Flow
//!
//! - [`Watermarker`] decides whether a request gets a watermark at all
//! - [`Compositor`] prepares the watermark and blends it per frame
//! - [`processor::prepare_watermark`] runs the watermark through the shared
//!   transform pipeline
//! - [`position`] turns gravity options into pixel offsets
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   opacity: 0.8          # process-wide multiplier
//!   path: /etc/imgmark/logo.png
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod position;
pub mod processor;

use std::sync::Arc;

use tracing::trace;

// Re-export main types for convenience
pub use compositor::Compositor;
pub use config::WatermarkOptions;
pub use error::{WatermarkError, WatermarkErrorKind};
pub use position::{
    resolve_offset, resolve_placement, resolve_tile_gap, split_inset, PlacementPosition,
};
pub use processor::prepare_watermark;

use crate::config::{ConfigError, WatermarkConfig};
use crate::imaging::{ImageData, ImageEngine, ProcessingOptions};

/// Entry point that applies the configured watermark to processed images.
///
/// Built once at start-up and shared (usually behind an `Arc`) by every
/// request; it holds no mutable state.
#[derive(Debug)]
pub struct Watermarker<E> {
    engine: E,
    source: Option<Arc<ImageData>>,
    opacity_multiplier: f64,
}

impl<E: ImageEngine> Watermarker<E> {
    pub fn new(engine: E, source: Option<Arc<ImageData>>, opacity_multiplier: f64) -> Self {
        Self {
            engine,
            source,
            opacity_multiplier,
        }
    }

    /// Build from the process configuration, loading the watermark image.
    pub fn from_config(engine: E, config: &WatermarkConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(engine, config.load_source()?, config.opacity))
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn source(&self) -> Option<&Arc<ImageData>> {
        self.source.as_ref()
    }

    pub fn opacity_multiplier(&self) -> f64 {
        self.opacity_multiplier
    }

    /// Apply the watermark requested in `po` to `img`.
    ///
    /// Does nothing when the request does not enable a watermark or no
    /// watermark image is configured. `dpr_scale` multiplies absolute gravity
    /// offsets.
    pub fn watermark(
        &self,
        img: &mut E::Image,
        po: &ProcessingOptions,
        dpr_scale: f64,
    ) -> Result<(), WatermarkError> {
        let source = match &self.source {
            Some(source) if po.watermark.enabled => source,
            _ => {
                trace!("Watermark not requested or not configured");
                return Ok(());
            }
        };

        Compositor::new(&self.engine, self.opacity_multiplier).apply(
            img,
            source,
            &po.watermark,
            dpr_scale,
            1,
        )
    }
}
