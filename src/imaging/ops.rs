//! Pixel operations behind [`RasterEngine`](super::RasterEngine)
//!
//! Resizing goes through `fast_image_resize`; everything else is plain
//! buffer work on `image` crate buffers.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::num::NonZeroU32;

use super::error::ImageError;
use super::options::Insets;

/// Resize using fast-image-resize with Lanczos3 filter
pub fn resize(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let src_w = img.width();
    let src_h = img.height();

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let result_buf = dst_image.into_vec();
    let rgba_image = RgbaImage::from_raw(target_w, target_h, result_buf)
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}

/// Rotate clockwise by `angle` degrees, then mirror horizontally.
pub fn rotate_and_flip(img: &DynamicImage, angle: u16, flip: bool) -> DynamicImage {
    let rotated = match angle % 360 {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => img.clone(),
    };

    if flip {
        rotated.fliph()
    } else {
        rotated
    }
}

/// Canvas size after applying `insets` to a `width` x `height` image.
pub fn padded_size(width: u32, height: u32, insets: Insets) -> Result<(u32, u32), ImageError> {
    let padded_width = i64::from(width) + insets.horizontal();
    let padded_height = i64::from(height) + insets.vertical();

    if padded_width <= 0
        || padded_height <= 0
        || padded_width > i64::from(u32::MAX)
        || padded_height > i64::from(u32::MAX)
    {
        return Err(ImageError::invalid_dimensions(
            padded_width,
            padded_height,
            "padding leaves no canvas",
        ));
    }
    Ok((padded_width as u32, padded_height as u32))
}

/// Place `img` on a transparent canvas grown by `insets`.
///
/// Negative insets cut into the source instead of adding space.
pub fn embed(img: &RgbaImage, insets: Insets) -> Result<RgbaImage, ImageError> {
    let (width, height) = padded_size(img.width(), img.height(), insets)?;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    copy_region(&mut canvas, img, insets.left as i64, insets.top as i64);
    Ok(canvas)
}

/// Repeat `tile` from the top-left corner until it fills `width` x `height`.
pub fn tile(tile: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, ImageError> {
    if tile.width() == 0 || tile.height() == 0 {
        return Err(ImageError::tile_failed(format!(
            "tile is {}x{}",
            tile.width(),
            tile.height()
        )));
    }
    if width == 0 || height == 0 {
        return Err(ImageError::tile_failed(format!(
            "canvas is {}x{}",
            width, height
        )));
    }

    let (tile_w, tile_h) = tile.dimensions();
    Ok(RgbaImage::from_fn(width, height, |x, y| {
        *tile.get_pixel(x % tile_w, y % tile_h)
    }))
}

/// Blend `overlay` onto an RGBA target with its corner at (`left`, `top`).
pub fn blend_layer(target: &mut RgbaImage, overlay: &RgbaImage, left: i32, top: i32, opacity: f32) {
    let Some(region) = visible_region(target.dimensions(), overlay.dimensions(), left, top) else {
        return;
    };

    for ty in region.y_start..region.y_end {
        for tx in region.x_start..region.x_end {
            let wx = (tx as i64 - left as i64) as u32;
            let wy = (ty as i64 - top as i64) as u32;

            let wm_pixel = overlay.get_pixel(wx, wy);
            let target_pixel = target.get_pixel(tx, ty);

            let blended = blend_pixels(*target_pixel, *wm_pixel, opacity);
            target.put_pixel(tx, ty, blended);
        }
    }
}

/// Blend `overlay` onto an opaque RGB target.
pub fn blend_layer_opaque(
    target: &mut RgbImage,
    overlay: &RgbaImage,
    left: i32,
    top: i32,
    opacity: f32,
) {
    let Some(region) = visible_region(target.dimensions(), overlay.dimensions(), left, top) else {
        return;
    };

    for ty in region.y_start..region.y_end {
        for tx in region.x_start..region.x_end {
            let wx = (tx as i64 - left as i64) as u32;
            let wy = (ty as i64 - top as i64) as u32;

            let wm_pixel = overlay.get_pixel(wx, wy);
            let Rgb([r, g, b]) = *target.get_pixel(tx, ty);

            let blended = blend_pixels(Rgba([r, g, b, 255]), *wm_pixel, opacity);
            target.put_pixel(tx, ty, Rgb([blended[0], blended[1], blended[2]]));
        }
    }
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

struct Region {
    x_start: u32,
    y_start: u32,
    x_end: u32,
    y_end: u32,
}

/// Part of the target covered by an overlay at (`left`, `top`), if any.
fn visible_region(
    (target_w, target_h): (u32, u32),
    (overlay_w, overlay_h): (u32, u32),
    left: i32,
    top: i32,
) -> Option<Region> {
    let x_start = (left as i64).max(0);
    let y_start = (top as i64).max(0);
    let x_end = (left as i64 + overlay_w as i64).min(target_w as i64);
    let y_end = (top as i64 + overlay_h as i64).min(target_h as i64);

    if x_start >= x_end || y_start >= y_end {
        return None;
    }

    Some(Region {
        x_start: x_start as u32,
        y_start: y_start as u32,
        x_end: x_end as u32,
        y_end: y_end as u32,
    })
}

/// Copy `src` into `dst` at (`left`, `top`), dropping whatever falls outside.
fn copy_region(dst: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64) {
    let Some(region) = visible_region(dst.dimensions(), src.dimensions(), left as i32, top as i32)
    else {
        return;
    };

    for ty in region.y_start..region.y_end {
        for tx in region.x_start..region.x_end {
            let sx = (tx as i64 - left) as u32;
            let sy = (ty as i64 - top) as u32;
            dst.put_pixel(tx, ty, *src.get_pixel(sx, sy));
        }
    }
}
