//! Per-request watermark options.
//!
//! Options arrive as part of [`ProcessingOptions`](crate::imaging::ProcessingOptions)
//! and can be deserialized directly:
//!
//! ```yaml
//! watermark:
//!   enabled: true
//!   opacity: 0.5
//!   scale: 0.2
//!   replicate: false
//!   gravity:
//!     type: south-east
//!     x: 10
//!     y: 10
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REQUEST_OPACITY;
use crate::imaging::GravityOptions;

fn default_opacity() -> f64 {
    DEFAULT_REQUEST_OPACITY
}

/// How a watermark should be applied to one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Apply the watermark at all (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque) (default: 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    /// Watermark size as a share of the image size; 0 keeps the native size
    #[serde(default)]
    pub scale: f64,

    /// Tile the watermark over the whole image instead of placing it once
    #[serde(default)]
    pub replicate: bool,

    /// Anchor and offsets; with `replicate` the offsets are the gap between tiles
    #[serde(default)]
    pub gravity: GravityOptions,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            opacity: default_opacity(),
            scale: 0.0,
            replicate: false,
            gravity: GravityOptions::default(),
        }
    }
}

impl WatermarkOptions {
    /// Enabled options with everything else at its default.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}
