//! Pipeline stage functions
//!
//! Each stage is a plain function over the shared context, the engine, the
//! working image, the resolved options and the source bytes.

use tracing::{debug, trace};

use super::PipelineContext;
use crate::constants::{JPEG_SHRINK_FACTORS, MIN_SHRINK_ON_LOAD};
use crate::imaging::{
    ImageData, ImageEngine, ImageError, ImageType, Insets, Orientation, ProcessingOptions,
    ResizingType,
};
use crate::imath;

/// Record the source type and orientation and compute the result size.
pub fn prepare<E: ImageEngine>(
    ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    po: &ProcessingOptions,
    data: &ImageData,
) -> Result<(), ImageError> {
    if !(po.dpr.is_finite() && po.dpr > 0.0) {
        return Err(ImageError::engine_failure(
            "prepare",
            format!("device pixel ratio must be positive, got {}", po.dpr),
        ));
    }
    if po.rotate % 90 != 0 {
        return Err(ImageError::engine_failure(
            "prepare",
            format!("rotation must be a multiple of 90, got {}", po.rotate),
        ));
    }

    ctx.image_type = Some(data.image_type());
    ctx.output_type = Some(po.format.unwrap_or(data.image_type()));
    ctx.orientation = engine.orientation(img);
    ctx.requested = Orientation::new(po.rotate, po.flip);
    ctx.dpr_scale = po.dpr;

    set_source_size(ctx, engine, img);

    let (wscale, hscale) = calc_scale(ctx.src_width, ctx.src_height, po);
    ctx.target_width = scaled_dimension(ctx.src_width, wscale);
    ctx.target_height = scaled_dimension(ctx.src_height, hscale);

    debug!(
        src_width = ctx.src_width,
        src_height = ctx.src_height,
        target_width = ctx.target_width,
        target_height = ctx.target_height,
        "Prepared transform"
    );
    Ok(())
}

/// Reload with a cheaper decode-time downscale when the result is much smaller.
pub fn scale_on_load<E: ImageEngine>(
    ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    _po: &ProcessingOptions,
    data: &ImageData,
) -> Result<(), ImageError> {
    let Some(image_type) = ctx.image_type else {
        return Ok(());
    };
    if !image_type.supports_scale_on_load() || ctx.src_width == 0 || ctx.src_height == 0 {
        return Ok(());
    }

    let prescale = (ctx.target_width as f64 / ctx.src_width as f64)
        .max(ctx.target_height as f64 / ctx.src_height as f64);
    if 1.0 / prescale < MIN_SHRINK_ON_LOAD {
        return Ok(());
    }

    let shrink = if image_type == ImageType::Jpeg {
        jpeg_shrink(prescale)
    } else {
        1
    };
    if image_type == ImageType::Jpeg && shrink == 1 {
        return Ok(());
    }

    trace!(shrink, prescale, "Scaling on load");
    *img = engine.load(data, shrink, prescale, engine.pages(img))?;
    set_source_size(ctx, engine, img);
    Ok(())
}

/// Import the embedded colour profile unless that already happened.
pub fn import_color_profile<E: ImageEngine>(
    _ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    _po: &ProcessingOptions,
    _data: &ImageData,
) -> Result<(), ImageError> {
    if engine.color_profile_imported(img) {
        return Ok(());
    }
    engine.import_color_profile(img)
}

/// Resize to the size computed by `prepare`.
pub fn scale<E: ImageEngine>(
    ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    _po: &ProcessingOptions,
    _data: &ImageData,
) -> Result<(), ImageError> {
    // Rotation happens later, so resize in the unrotated frame
    let (width, height) = if ctx.swaps_axes() {
        (ctx.target_height, ctx.target_width)
    } else {
        (ctx.target_width, ctx.target_height)
    };

    if width == engine.width(img) && height == engine.height(img) {
        return Ok(());
    }
    engine.resize(img, width, height)
}

/// Apply the metadata orientation, then the requested rotation and flip.
pub fn rotate_and_flip<E: ImageEngine>(
    ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    _po: &ProcessingOptions,
    _data: &ImageData,
) -> Result<(), ImageError> {
    for orientation in [ctx.orientation, ctx.requested] {
        if orientation != Orientation::default() {
            engine.rotate_and_flip(img, orientation.angle, orientation.flip)?;
        }
    }
    Ok(())
}

/// Expand the canvas by the requested insets.
pub fn padding<E: ImageEngine>(
    ctx: &mut PipelineContext,
    engine: &E,
    img: &mut E::Image,
    po: &ProcessingOptions,
    _data: &ImageData,
) -> Result<(), ImageError> {
    if !po.padding.enabled {
        return Ok(());
    }

    let insets = po.padding.insets;
    let insets = if (ctx.dpr_scale - 1.0).abs() > f64::EPSILON {
        Insets::new(
            imath::scale(insets.top, ctx.dpr_scale),
            imath::scale(insets.right, ctx.dpr_scale),
            imath::scale(insets.bottom, ctx.dpr_scale),
            imath::scale(insets.left, ctx.dpr_scale),
        )
    } else {
        insets
    };

    if insets.is_zero() {
        return Ok(());
    }
    engine.embed(img, insets)
}

fn set_source_size<E: ImageEngine>(ctx: &mut PipelineContext, engine: &E, img: &E::Image) {
    let (width, height) = (engine.width(img), engine.height(img));
    if ctx.swaps_axes() {
        ctx.src_width = height;
        ctx.src_height = width;
    } else {
        ctx.src_width = width;
        ctx.src_height = height;
    }
}

/// Per-axis scale factors for the requested size and resizing type.
pub fn calc_scale(src_width: u32, src_height: u32, po: &ProcessingOptions) -> (f64, f64) {
    if src_width == 0 || src_height == 0 {
        return (1.0, 1.0);
    }

    let dst_width = po.width as f64 * po.dpr;
    let dst_height = po.height as f64 * po.dpr;

    let wscale = (dst_width > 0.0).then(|| dst_width / src_width as f64);
    let hscale = (dst_height > 0.0).then(|| dst_height / src_height as f64);

    let (wscale, hscale) = match (wscale, hscale) {
        (None, None) => (1.0, 1.0),
        (Some(w), None) => (w, w),
        (None, Some(h)) => (h, h),
        (Some(w), Some(h)) => match po.resizing_type {
            ResizingType::Fit => (w.min(h), w.min(h)),
            ResizingType::Fill => (w.max(h), w.max(h)),
            ResizingType::Force => (w, h),
        },
    };

    if po.enlarge {
        (wscale, hscale)
    } else {
        (wscale.min(1.0), hscale.min(1.0))
    }
}

fn scaled_dimension(dimension: u32, scale: f64) -> u32 {
    ((dimension as f64 * scale).round() as u32).max(1)
}

/// Largest decode-time JPEG shrink factor not exceeding the downscale.
fn jpeg_shrink(prescale: f64) -> u32 {
    let shrink = 1.0 / prescale;
    JPEG_SHRINK_FACTORS
        .iter()
        .copied()
        .find(|factor| shrink >= *factor as f64)
        .unwrap_or(1)
}
