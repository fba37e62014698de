//! Image engine capability
//!
//! The watermark core never touches pixels directly. It drives an
//! [`ImageEngine`], which owns decoding, resizing, colour handling, tiling
//! and blending. Two engines ship with the crate:
//!
//! - [`RasterEngine`]: an in-process engine built on the `image`,
//!   `fast_image_resize` and `kamadak-exif` crates
//! - [`MockEngine`]: records every call, for tests and dry runs
//!
//! Working images are released when dropped, so every exit path (including
//! `?` early returns) frees them.

pub mod error;
pub mod imagedata;
pub mod mock;
pub mod ops;
pub mod options;
pub mod raster;

pub use error::ImageError;
pub use imagedata::{ImageData, ImageType};
pub use mock::{EngineCall, MockEngine, MockImage, MockOp};
pub use options::{
    GravityOptions, GravityType, Insets, PaddingOptions, ProcessingOptions, ResizingType,
};
pub use raster::{RasterEngine, RasterImage};

/// Rotation and mirroring recorded in image metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Clockwise rotation in degrees (0, 90, 180 or 270)
    pub angle: u16,
    /// Horizontal flip applied after the rotation
    pub flip: bool,
}

impl Orientation {
    pub fn new(angle: u16, flip: bool) -> Self {
        Self {
            angle: angle % 360,
            flip,
        }
    }

    /// Map an EXIF orientation tag (1-8) to rotate-then-flip steps.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::new(0, true),
            3 => Self::new(180, false),
            4 => Self::new(180, true),
            5 => Self::new(90, true),
            6 => Self::new(90, false),
            7 => Self::new(270, true),
            8 => Self::new(270, false),
            _ => Self::default(),
        }
    }

    /// Width and height trade places after this rotation.
    pub fn swaps_axes(&self) -> bool {
        self.angle == 90 || self.angle == 270
    }
}

/// Image primitives the watermark core is built on.
///
/// Implementations must be shareable across threads: one engine serves every
/// concurrent request, each with its own working images.
pub trait ImageEngine: Send + Sync {
    /// Working image handle. Dropping it releases its resources.
    type Image: Send;

    /// Decode `data` into a fresh working image.
    ///
    /// `shrink` is a decode-time JPEG shrink factor (1, 2, 4 or 8), `scale`
    /// a decode-time scale hint for other formats and `pages` the number of
    /// frames to stack vertically.
    fn load(
        &self,
        data: &ImageData,
        shrink: u32,
        scale: f64,
        pages: usize,
    ) -> Result<Self::Image, ImageError>;

    fn width(&self, img: &Self::Image) -> u32;

    fn height(&self, img: &Self::Image) -> u32;

    /// Number of vertically stacked frames.
    fn pages(&self, img: &Self::Image) -> usize;

    /// Orientation recorded in the image metadata.
    fn orientation(&self, img: &Self::Image) -> Orientation;

    /// Resize to exactly `width` x `height`.
    fn resize(&self, img: &mut Self::Image, width: u32, height: u32) -> Result<(), ImageError>;

    /// Rotate clockwise by `angle`, then mirror horizontally when `flip` is
    /// set. Resets the metadata orientation.
    fn rotate_and_flip(
        &self,
        img: &mut Self::Image,
        angle: u16,
        flip: bool,
    ) -> Result<(), ImageError>;

    fn color_profile_imported(&self, img: &Self::Image) -> bool;

    /// Import the embedded colour profile. Importing twice is a no-op.
    fn import_color_profile(&self, img: &mut Self::Image) -> Result<(), ImageError>;

    /// Convert to an RGB-family colour space.
    fn to_rgb_colorspace(&self, img: &mut Self::Image) -> Result<(), ImageError>;

    /// Expand (or, for negative insets, crop) the canvas.
    fn embed(&self, img: &mut Self::Image, insets: Insets) -> Result<(), ImageError>;

    /// Materialize into random-access memory so it can be read repeatedly.
    fn copy_memory(&self, img: &mut Self::Image) -> Result<(), ImageError>;

    /// Repeat the image to exactly fill `width` x `height`.
    fn replicate(&self, img: &mut Self::Image, width: u32, height: u32)
        -> Result<(), ImageError>;

    /// Remove all embedded metadata (EXIF, ICC, ...).
    fn strip_all(&self, img: &mut Self::Image) -> Result<(), ImageError>;

    /// Blend `watermark` over `img` with its top-left corner at
    /// (`left`, `top`), scaling its alpha by `opacity`.
    fn apply_watermark(
        &self,
        img: &mut Self::Image,
        watermark: &Self::Image,
        left: i32,
        top: i32,
        opacity: f64,
    ) -> Result<(), ImageError>;
}
