// Transform pipeline module - ordered, reusable image transformation stages
//
// A pipeline is a list of named stage functions run in order over one working
// image. The first failing stage aborts the run; later stages never see a
// half-transformed image.

pub mod stages;

use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::imaging::{ImageData, ImageEngine, ImageError, ImageType, Orientation, ProcessingOptions};

/// A stage function.
///
/// Stages share the [`PipelineContext`] so that values computed early (such as
/// the result size) are available to later stages.
pub type StageFn<E> = fn(
    &mut PipelineContext,
    &E,
    &mut <E as ImageEngine>::Image,
    &ProcessingOptions,
    &ImageData,
) -> Result<(), ImageError>;

/// Failure of a single pipeline stage
#[derive(Error, Debug, Clone, PartialEq)]
#[error("pipeline stage '{stage}' failed: {source}")]
pub struct StageError {
    pub stage: &'static str,
    pub source: ImageError,
}

impl StageError {
    pub fn new(stage: &'static str, source: ImageError) -> Self {
        Self { stage, source }
    }
}

/// State handed from one stage to the next
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineContext {
    /// Type of the source bytes
    pub image_type: Option<ImageType>,
    /// Format the result is encoded to after the pipeline
    pub output_type: Option<ImageType>,
    /// Orientation recorded in the source metadata
    pub orientation: Orientation,
    /// Rotation and flip requested on top of the metadata orientation
    pub requested: Orientation,
    /// Source width after orientation is applied
    pub src_width: u32,
    /// Source height after orientation is applied
    pub src_height: u32,
    /// Result width after orientation is applied
    pub target_width: u32,
    /// Result height after orientation is applied
    pub target_height: u32,
    /// Device pixel ratio applied to pixel options
    pub dpr_scale: f64,
}

impl PipelineContext {
    /// Width and height trade places once all rotations are applied.
    pub fn swaps_axes(&self) -> bool {
        (self.orientation.angle + self.requested.angle) % 180 == 90
    }
}

/// An ordered list of named stages
pub struct Pipeline<E: ImageEngine> {
    stages: Vec<(&'static str, StageFn<E>)>,
}

impl<E: ImageEngine> Default for Pipeline<E> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<E: ImageEngine> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<E: ImageEngine> std::fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl<E: ImageEngine> Pipeline<E> {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn with_stage(mut self, name: &'static str, stage: StageFn<E>) -> Self {
        self.stages.push((name, stage));
        self
    }

    /// Stages used to bring a watermark to its requested size and shape:
    /// prepare, scale-on-load, import-color-profile, scale, rotate-and-flip,
    /// padding.
    pub fn watermark() -> Self {
        Self::new()
            .with_stage("prepare", stages::prepare::<E>)
            .with_stage("scale-on-load", stages::scale_on_load::<E>)
            .with_stage("import-color-profile", stages::import_color_profile::<E>)
            .with_stage("scale", stages::scale::<E>)
            .with_stage("rotate-and-flip", stages::rotate_and_flip::<E>)
            .with_stage("padding", stages::padding::<E>)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, stopping at the first error.
    pub fn run(
        &self,
        engine: &E,
        img: &mut E::Image,
        po: &ProcessingOptions,
        data: &ImageData,
    ) -> Result<PipelineContext, StageError> {
        let span = debug_span!("pipeline", stages = self.stages.len());
        let _guard = span.enter();

        let mut ctx = PipelineContext {
            dpr_scale: 1.0,
            ..PipelineContext::default()
        };

        for (name, stage) in &self.stages {
            debug!(stage = *name, "Running pipeline stage");
            stage(&mut ctx, engine, img, po, data).map_err(|e| {
                warn!(stage = *name, error = %e, "Pipeline stage failed");
                StageError::new(*name, e)
            })?;
        }

        Ok(ctx)
    }
}
