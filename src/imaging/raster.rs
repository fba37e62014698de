//! In-process raster engine
//!
//! Decodes with the `image` crate, resizes with `fast_image_resize` and reads
//! EXIF orientation with `kamadak-exif`. A freshly decoded image is treated
//! as sequential: it may be used as an overlay or tile source once, and must
//! be copied to memory before it is read again.

use std::borrow::Cow;
use std::cell::Cell;
use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegDecoder;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, RgbaImage};
use tracing::{debug, trace};

use super::error::ImageError;
use super::imagedata::{ImageData, ImageType};
use super::ops;
use super::options::Insets;
use super::{ImageEngine, Orientation};
use crate::constants::DEFAULT_MAX_PIXELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Sequential,
    Random,
}

#[derive(Debug, Clone, Default)]
struct Metadata {
    exif: Option<Vec<u8>>,
    orientation: Orientation,
}

/// Working image of the [`RasterEngine`].
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    pages: usize,
    metadata: Metadata,
    profile_imported: bool,
    access: Access,
    reads: Cell<u32>,
}

impl RasterImage {
    /// Wrap already decoded pixels, e.g. a host image produced elsewhere.
    pub fn from_dynamic(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            pages: 1,
            metadata: Metadata::default(),
            profile_imported: false,
            access: Access::Random,
            reads: Cell::new(0),
        }
    }

    /// Declare the pixels as `pages` frames stacked vertically.
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages.max(1);
        self
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.pixels
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.exif.is_some() || self.metadata.orientation != Orientation::default()
    }

    pub fn is_in_memory(&self) -> bool {
        self.access == Access::Random
    }

    fn mark_read(&self) -> Result<(), ImageError> {
        if self.access == Access::Sequential && self.reads.get() > 0 {
            return Err(ImageError::SequentialReread);
        }
        self.reads.set(self.reads.get() + 1);
        Ok(())
    }

    fn rgba(&self) -> Cow<'_, RgbaImage> {
        match &self.pixels {
            DynamicImage::ImageRgba8(buf) => Cow::Borrowed(buf),
            other => Cow::Owned(other.to_rgba8()),
        }
    }

    fn replace_pixels(&mut self, pixels: DynamicImage) {
        self.pixels = pixels;
    }
}

/// Engine backed by the `image` crate family.
#[derive(Debug, Clone)]
pub struct RasterEngine {
    max_pixels: u64,
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl RasterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to hold images larger than `max_pixels` (image bomb guard).
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    fn check_pixels(&self, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.max_pixels {
            return Err(ImageError::invalid_dimensions(
                width as i64,
                height as i64,
                format!("{} pixels exceed limit of {}", pixels, self.max_pixels),
            ));
        }
        Ok(())
    }
}

impl ImageEngine for RasterEngine {
    type Image = RasterImage;

    fn load(
        &self,
        data: &ImageData,
        shrink: u32,
        scale: f64,
        pages: usize,
    ) -> Result<RasterImage, ImageError> {
        let image_type = data.image_type();

        let (pixels, pages) = match image_type {
            ImageType::Jpeg if shrink > 1 => (decode_jpeg_shrunk(data.bytes(), shrink)?, 1),
            ImageType::Gif if pages > 1 => decode_gif_frames(data.bytes(), pages)?,
            _ => (
                image::load_from_memory_with_format(data.bytes(), image_type.to_image_format())?,
                1,
            ),
        };
        self.check_pixels(pixels.width(), pixels.height())?;

        let pixels = if image_type != ImageType::Jpeg && scale > 0.0 && scale < 1.0 {
            let width = ((pixels.width() as f64 * scale).round() as u32).max(1);
            let height = ((pixels.height() as f64 * scale).round() as u32).max(1);
            ops::resize(&pixels, width, height)?
        } else {
            pixels
        };

        debug!(
            image_type = %image_type,
            width = pixels.width(),
            height = pixels.height(),
            pages,
            shrink,
            scale,
            "Decoded image"
        );

        Ok(RasterImage {
            pixels,
            pages,
            metadata: read_metadata(data.bytes()),
            profile_imported: false,
            access: Access::Sequential,
            reads: Cell::new(0),
        })
    }

    fn width(&self, img: &RasterImage) -> u32 {
        img.pixels.width()
    }

    fn height(&self, img: &RasterImage) -> u32 {
        img.pixels.height()
    }

    fn pages(&self, img: &RasterImage) -> usize {
        img.pages
    }

    fn orientation(&self, img: &RasterImage) -> Orientation {
        img.metadata.orientation
    }

    fn resize(&self, img: &mut RasterImage, width: u32, height: u32) -> Result<(), ImageError> {
        self.check_pixels(width, height)?;
        let resized = ops::resize(&img.pixels, width, height)?;
        img.replace_pixels(resized);
        Ok(())
    }

    fn rotate_and_flip(
        &self,
        img: &mut RasterImage,
        angle: u16,
        flip: bool,
    ) -> Result<(), ImageError> {
        if angle % 90 != 0 {
            return Err(ImageError::engine_failure(
                "rotate_and_flip",
                format!("angle {} is not a multiple of 90", angle),
            ));
        }
        let rotated = ops::rotate_and_flip(&img.pixels, angle, flip);
        img.replace_pixels(rotated);
        img.metadata.orientation = Orientation::default();
        Ok(())
    }

    fn color_profile_imported(&self, img: &RasterImage) -> bool {
        img.profile_imported
    }

    fn import_color_profile(&self, img: &mut RasterImage) -> Result<(), ImageError> {
        if img.profile_imported {
            return Ok(());
        }

        let converted = match &img.pixels {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => None,
            DynamicImage::ImageLuma16(_) => Some(DynamicImage::ImageLuma8(img.pixels.to_luma8())),
            DynamicImage::ImageLumaA16(_) => {
                Some(DynamicImage::ImageLumaA8(img.pixels.to_luma_alpha8()))
            }
            other if other.color().has_alpha() => {
                Some(DynamicImage::ImageRgba8(other.to_rgba8()))
            }
            other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
        };

        if let Some(pixels) = converted {
            trace!("Normalized high bit depth image to 8-bit sRGB");
            img.replace_pixels(pixels);
        }
        img.profile_imported = true;
        Ok(())
    }

    fn to_rgb_colorspace(&self, img: &mut RasterImage) -> Result<(), ImageError> {
        let converted = match &img.pixels {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => None,
            DynamicImage::ImageLuma8(_) => Some(DynamicImage::ImageRgb8(img.pixels.to_rgb8())),
            DynamicImage::ImageLumaA8(_) => Some(DynamicImage::ImageRgba8(img.pixels.to_rgba8())),
            other => {
                return Err(ImageError::colorspace_mismatch(format!(
                    "{:?} must have its colour profile imported first",
                    other.color()
                )))
            }
        };

        if let Some(pixels) = converted {
            img.replace_pixels(pixels);
        }
        Ok(())
    }

    fn embed(&self, img: &mut RasterImage, insets: Insets) -> Result<(), ImageError> {
        let (width, height) = ops::padded_size(self.width(img), self.height(img), insets)?;
        self.check_pixels(width, height)?;
        let padded = ops::embed(&img.rgba(), insets)?;
        img.replace_pixels(DynamicImage::ImageRgba8(padded));
        Ok(())
    }

    fn copy_memory(&self, img: &mut RasterImage) -> Result<(), ImageError> {
        img.access = Access::Random;
        Ok(())
    }

    fn replicate(&self, img: &mut RasterImage, width: u32, height: u32) -> Result<(), ImageError> {
        self.check_pixels(width, height)
            .map_err(|e| ImageError::tile_failed(e.to_string()))?;
        img.mark_read()?;

        let tiled = ops::tile(&img.rgba(), width, height)?;
        img.replace_pixels(DynamicImage::ImageRgba8(tiled));
        img.pages = 1;
        img.access = Access::Random;
        img.reads.set(0);
        Ok(())
    }

    fn strip_all(&self, img: &mut RasterImage) -> Result<(), ImageError> {
        img.metadata = Metadata::default();
        Ok(())
    }

    fn apply_watermark(
        &self,
        img: &mut RasterImage,
        watermark: &RasterImage,
        left: i32,
        top: i32,
        opacity: f64,
    ) -> Result<(), ImageError> {
        watermark.mark_read()?;
        let overlay = watermark.rgba();
        let opacity = opacity as f32;

        match &mut img.pixels {
            DynamicImage::ImageRgba8(target) => {
                ops::blend_layer(target, &overlay, left, top, opacity)
            }
            DynamicImage::ImageRgb8(target) => {
                ops::blend_layer_opaque(target, &overlay, left, top, opacity)
            }
            other => {
                return Err(ImageError::colorspace_mismatch(format!(
                    "cannot blend onto {:?}; convert to RGB first",
                    other.color()
                )))
            }
        }
        Ok(())
    }
}

/// Decode a JPEG with DCT-domain downscaling by `shrink`.
fn decode_jpeg_shrunk(bytes: &[u8], shrink: u32) -> Result<DynamicImage, ImageError> {
    let mut decoder = JpegDecoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions();

    let req_width = (width / shrink).clamp(1, u16::MAX as u32) as u16;
    let req_height = (height / shrink).clamp(1, u16::MAX as u32) as u16;
    decoder.scale(req_width, req_height)?;

    Ok(DynamicImage::from_decoder(decoder)?)
}

/// Decode up to `pages` GIF frames and stack them top to bottom.
fn decode_gif_frames(bytes: &[u8], pages: usize) -> Result<(DynamicImage, usize), ImageError> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let frames = decoder
        .into_frames()
        .take(pages)
        .collect::<Result<Vec<_>, _>>()?;

    let first = frames
        .first()
        .ok_or_else(|| ImageError::decode_failed("GIF has no frames"))?;
    let (width, frame_height) = first.buffer().dimensions();

    let mut canvas = RgbaImage::new(width, frame_height * frames.len() as u32);
    for (index, frame) in frames.iter().enumerate() {
        image::imageops::replace(
            &mut canvas,
            frame.buffer(),
            0,
            (index as u32 * frame_height) as i64,
        );
    }

    Ok((DynamicImage::ImageRgba8(canvas), frames.len()))
}

fn read_metadata(bytes: &[u8]) -> Metadata {
    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => {
            let orientation = exif
                .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
                .map(Orientation::from_exif)
                .unwrap_or_default();

            Metadata {
                exif: Some(exif.buf().to_vec()),
                orientation,
            }
        }
        Err(_) => Metadata::default(),
    }
}
