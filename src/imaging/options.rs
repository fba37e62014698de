//! Processing options consumed by the transform pipeline
//!
//! Only the subset the watermark path reads is modelled here. Parsing these
//! from request URLs is the surrounding service's job.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ImageError;
use super::imagedata::ImageType;
use crate::watermark::WatermarkOptions;

/// How to fit the image within target dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizingType {
    /// Scale to fit within dimensions, preserving aspect ratio
    #[default]
    Fit,
    /// Scale to cover the dimensions, preserving aspect ratio
    Fill,
    /// Scale each axis independently to the exact dimensions
    Force,
}

impl FromStr for ResizingType {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fit" => Ok(ResizingType::Fit),
            "fill" => Ok(ResizingType::Fill),
            "force" => Ok(ResizingType::Force),
            _ => Err(ImageError::engine_failure(
                "resizing_type",
                format!("unknown resizing type: {}", s),
            )),
        }
    }
}

/// Gravity/anchor point for placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GravityType {
    #[default]
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl GravityType {
    /// Anchored to the top edge.
    pub fn is_north(&self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    /// Anchored to the bottom edge.
    pub fn is_south(&self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }

    /// Anchored to the right edge.
    pub fn is_east(&self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    /// Anchored to the left edge.
    pub fn is_west(&self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }
}

impl FromStr for GravityType {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "center" | "c" | "ce" => Ok(GravityType::Center),
            "north" | "n" | "no" => Ok(GravityType::North),
            "south" | "s" | "so" => Ok(GravityType::South),
            "east" | "e" | "ea" => Ok(GravityType::East),
            "west" | "w" | "we" => Ok(GravityType::West),
            "northeast" | "north-east" | "ne" | "noea" => Ok(GravityType::NorthEast),
            "northwest" | "north-west" | "nw" | "nowe" => Ok(GravityType::NorthWest),
            "southeast" | "south-east" | "se" | "soea" => Ok(GravityType::SouthEast),
            "southwest" | "south-west" | "sw" | "sowe" => Ok(GravityType::SouthWest),
            _ => Err(ImageError::engine_failure(
                "gravity",
                format!("unknown gravity: {}", s),
            )),
        }
    }
}

/// Anchor plus offsets.
///
/// An offset with magnitude of at least 1.0 is an absolute pixel offset
/// (multiplied by the device pixel ratio); a smaller magnitude is a fraction
/// of the target dimension.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GravityOptions {
    #[serde(default, rename = "type")]
    pub kind: GravityType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl GravityOptions {
    pub fn new(kind: GravityType, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }
}

/// Four-sided pixel insets. Negative values shrink the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Insets {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn horizontal(&self) -> i64 {
        i64::from(self.left) + i64::from(self.right)
    }

    pub fn vertical(&self) -> i64 {
        i64::from(self.top) + i64::from(self.bottom)
    }

    pub fn is_zero(&self) -> bool {
        *self == Insets::default()
    }
}

/// Canvas padding added by the last pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaddingOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub insets: Insets,
}

/// Resolved per-request processing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Target width in CSS pixels (0 = unconstrained)
    #[serde(default)]
    pub width: u32,
    /// Target height in CSS pixels (0 = unconstrained)
    #[serde(default)]
    pub height: u32,
    /// Device pixel ratio
    #[serde(default = "default_dpr")]
    pub dpr: f64,
    #[serde(default)]
    pub resizing_type: ResizingType,
    /// Allow upscaling beyond the source size
    #[serde(default)]
    pub enlarge: bool,
    /// Output format (None = keep the source format). Resolved by the
    /// `prepare` stage into `PipelineContext::output_type` for the encoder.
    #[serde(default)]
    pub format: Option<ImageType>,
    #[serde(default)]
    pub padding: PaddingOptions,
    /// Extra rotation in degrees (0, 90, 180, 270)
    #[serde(default)]
    pub rotate: u16,
    /// Extra horizontal flip
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub watermark: WatermarkOptions,
}

fn default_dpr() -> f64 {
    1.0
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            dpr: default_dpr(),
            resizing_type: ResizingType::default(),
            enlarge: false,
            format: None,
            padding: PaddingOptions::default(),
            rotate: 0,
            flip: false,
            watermark: WatermarkOptions::default(),
        }
    }
}
