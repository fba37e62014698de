//! Watermark preparation.
//!
//! Brings the configured watermark image to the size and shape it will be
//! blended at: decode, run the shared transform pipeline with watermark
//! options, materialize it when it will be read more than once, tile it when
//! replicating, and drop its metadata.

use tracing::{debug, debug_span};

use super::position::resolve_tile_gap;
use super::{WatermarkError, WatermarkOptions};
use crate::imaging::{ImageData, ImageEngine, PaddingOptions, ProcessingOptions, ResizingType};
use crate::imath;
use crate::pipeline::Pipeline;

/// Transient processing options used to run the watermark through the pipeline.
///
/// `target_width` x `target_height` is the area the watermark is prepared for
/// (one frame of the host image).
pub fn watermark_processing_options(
    data: &ImageData,
    opts: &WatermarkOptions,
    target_width: u32,
    target_height: u32,
    offset_scale: f64,
) -> ProcessingOptions {
    let mut po = ProcessingOptions {
        resizing_type: ResizingType::Fit,
        dpr: 1.0,
        enlarge: true,
        format: Some(data.image_type()),
        ..ProcessingOptions::default()
    };

    if opts.scale > 0.0 {
        po.width = scaled_target(target_width, opts.scale);
        po.height = scaled_target(target_height, opts.scale);
    }

    if opts.replicate {
        po.padding = PaddingOptions {
            enabled: true,
            insets: resolve_tile_gap(target_width, target_height, &opts.gravity, offset_scale),
        };
    }

    po
}

/// Decode and prepare the watermark for a `target_width` x `target_height`
/// frame.
///
/// The returned image is stripped of metadata. It sits in random-access memory
/// when `opts.replicate` is set or `frames > 1`, and is already tiled across
/// the frame when replicating. A failure at any step drops the partial image.
pub fn prepare_watermark<E: ImageEngine>(
    engine: &E,
    data: &ImageData,
    opts: &WatermarkOptions,
    target_width: u32,
    target_height: u32,
    offset_scale: f64,
    frames: usize,
) -> Result<E::Image, WatermarkError> {
    let _span = debug_span!(
        "prepare_watermark",
        image_type = data.image_type().as_str(),
        target_width,
        target_height,
        frames
    )
    .entered();

    // Watermarks are never animated: decode the first page only
    let mut wm = engine
        .load(data, 1, 1.0, 1)
        .map_err(WatermarkError::Load)?;

    let po = watermark_processing_options(data, opts, target_width, target_height, offset_scale);
    Pipeline::<E>::watermark().run(engine, &mut wm, &po, data)?;

    if opts.replicate || frames > 1 {
        // Tiling and per-frame blending read the pixels more than once
        engine
            .copy_memory(&mut wm)
            .map_err(|e| WatermarkError::transform("copy-memory", e))?;
    }

    if opts.replicate {
        engine
            .replicate(&mut wm, target_width, target_height)
            .map_err(WatermarkError::Replication)?;
    }

    engine
        .strip_all(&mut wm)
        .map_err(|e| WatermarkError::transform("strip-metadata", e))?;

    debug!(
        width = engine.width(&wm),
        height = engine.height(&wm),
        "Prepared watermark"
    );
    Ok(wm)
}

fn scaled_target(dimension: u32, scale: f64) -> u32 {
    imath::scale_to_even(dimension, scale).max(1) as u32
}
