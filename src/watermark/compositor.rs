//! Watermark compositor for blending a prepared watermark onto an image.
//!
//! The host image may hold several frames stacked vertically (animated
//! images). Each frame gets the same watermark at the same relative position.
//!
//! # Example
//!
//! ```
//! use imgmark::imaging::{ImageData, ImageType, MockEngine};
//! use imgmark::watermark::{Compositor, WatermarkOptions};
//!
//! let engine = MockEngine::new(100, 50);
//! let data = ImageData::new(vec![0u8; 8], ImageType::Png);
//! let mut host = engine.host(800, 600);
//!
//! let compositor = Compositor::new(&engine, 0.5);
//! compositor
//!     .apply(&mut host, &data, &WatermarkOptions::enabled(), 1.0, 1)
//!     .unwrap();
//! ```

use tracing::{debug, debug_span};

use super::position::{resolve_placement, PlacementPosition};
use super::processor::prepare_watermark;
use super::{WatermarkError, WatermarkOptions};
use crate::imaging::{ImageData, ImageEngine, ImageError};

/// Blends watermarks onto host images through an engine.
#[derive(Debug)]
pub struct Compositor<'a, E> {
    engine: &'a E,
    opacity_multiplier: f64,
}

impl<'a, E: ImageEngine> Compositor<'a, E> {
    /// Create a compositor. `opacity_multiplier` scales every request opacity.
    pub fn new(engine: &'a E, opacity_multiplier: f64) -> Self {
        Self {
            engine,
            opacity_multiplier,
        }
    }

    /// Opacity handed to the blend primitive.
    pub fn final_opacity(&self, opts: &WatermarkOptions) -> f64 {
        opts.opacity * self.opacity_multiplier
    }

    /// Prepare the watermark in `data` and blend it onto every frame of `img`.
    ///
    /// `frames` is the number of vertically stacked frames in `img`;
    /// `offset_scale` multiplies absolute gravity offsets. The prepared
    /// watermark is released before returning, on success or failure.
    pub fn apply(
        &self,
        img: &mut E::Image,
        data: &ImageData,
        opts: &WatermarkOptions,
        offset_scale: f64,
        frames: usize,
    ) -> Result<(), WatermarkError> {
        let engine = self.engine;
        let width = engine.width(img);
        let height = engine.height(img);

        if frames == 0 {
            return Err(WatermarkError::transform(
                "frames",
                ImageError::invalid_dimensions(
                    width as i64,
                    height as i64,
                    "frame count must be at least 1",
                ),
            ));
        }
        let frame_height = height / frames as u32;

        let _span = debug_span!(
            "apply_watermark",
            width,
            height,
            frames,
            replicate = opts.replicate
        )
        .entered();

        let mut wm = prepare_watermark(
            engine,
            data,
            opts,
            width,
            frame_height,
            offset_scale,
            frames,
        )?;

        if !engine.color_profile_imported(img) {
            engine
                .import_color_profile(img)
                .map_err(|e| WatermarkError::transform("import-color-profile", e))?;
        }
        engine
            .to_rgb_colorspace(img)
            .map_err(|e| WatermarkError::transform("rgb-colorspace", e))?;

        let opacity = self.final_opacity(opts);

        // One whole-canvas blend is cheaper than a blend per frame. The
        // watermark is frame-sized here, so tiling it again lines up with
        // every frame band.
        if opts.replicate && frames > 1 {
            engine
                .replicate(&mut wm, width, height)
                .map_err(WatermarkError::Replication)?;

            debug!(opacity, "Blending replicated watermark in a single pass");
            return engine
                .apply_watermark(img, &wm, 0, 0, opacity)
                .map_err(WatermarkError::Blend);
        }

        let PlacementPosition { x: left, mut y } = if opts.replicate {
            PlacementPosition::default()
        } else {
            resolve_placement(
                width,
                frame_height,
                engine.width(&wm),
                engine.height(&wm),
                &opts.gravity,
                offset_scale,
                true,
            )
        };

        for frame in 0..frames {
            debug!(frame, left, top = y, opacity, "Blending watermark");
            engine
                .apply_watermark(img, &wm, left, y, opacity)
                .map_err(WatermarkError::Blend)?;
            y += frame_height as i32;
        }

        Ok(())
    }
}
