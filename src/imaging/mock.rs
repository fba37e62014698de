//! Mock image engine for testing (records calls, tracks dimensions only)

use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::ImageError;
use super::imagedata::ImageData;
use super::options::Insets;
use super::{ImageEngine, Orientation};

/// Operation names, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Load,
    Resize,
    RotateAndFlip,
    ImportColorProfile,
    RgbColorspace,
    Embed,
    CopyMemory,
    Replicate,
    StripAll,
    ApplyWatermark,
}

/// A recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load {
        shrink: u32,
        scale: f64,
        pages: usize,
    },
    Resize {
        image: u64,
        width: u32,
        height: u32,
    },
    RotateAndFlip {
        image: u64,
        angle: u16,
        flip: bool,
    },
    ImportColorProfile {
        image: u64,
    },
    RgbColorspace {
        image: u64,
    },
    Embed {
        image: u64,
        insets: Insets,
    },
    CopyMemory {
        image: u64,
    },
    Replicate {
        image: u64,
        width: u32,
        height: u32,
    },
    StripAll {
        image: u64,
    },
    ApplyWatermark {
        image: u64,
        watermark: u64,
        left: i32,
        top: i32,
        opacity: f64,
    },
}

impl EngineCall {
    pub fn op(&self) -> MockOp {
        match self {
            Self::Load { .. } => MockOp::Load,
            Self::Resize { .. } => MockOp::Resize,
            Self::RotateAndFlip { .. } => MockOp::RotateAndFlip,
            Self::ImportColorProfile { .. } => MockOp::ImportColorProfile,
            Self::RgbColorspace { .. } => MockOp::RgbColorspace,
            Self::Embed { .. } => MockOp::Embed,
            Self::CopyMemory { .. } => MockOp::CopyMemory,
            Self::Replicate { .. } => MockOp::Replicate,
            Self::StripAll { .. } => MockOp::StripAll,
            Self::ApplyWatermark { .. } => MockOp::ApplyWatermark,
        }
    }
}

/// Working image of the [`MockEngine`]: dimensions and flags, no pixels.
#[derive(Debug)]
pub struct MockImage {
    id: u64,
    width: u32,
    height: u32,
    pages: usize,
    orientation: Orientation,
    profile_imported: bool,
    in_memory: bool,
    has_metadata: bool,
    reads: Cell<u32>,
    live: Arc<AtomicUsize>,
}

impl MockImage {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    pub fn has_metadata(&self) -> bool {
        self.has_metadata
    }

    /// Pretend the colour profile was imported earlier in the pipeline.
    pub fn with_profile_imported(mut self) -> Self {
        self.profile_imported = true;
        self
    }
}

impl Drop for MockImage {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock engine that records every call for later inspection
#[derive(Clone)]
pub struct MockEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failures: Arc<Mutex<Vec<MockOp>>>,
    live: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
    /// Size and orientation reported by `load`
    source: Arc<Mutex<(u32, u32, Orientation)>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new(100, 50)
    }
}

impl MockEngine {
    /// Engine whose `load` yields a `width` x `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            live: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
            source: Arc::new(Mutex::new((width, height, Orientation::default()))),
        }
    }

    /// Make loaded images report `orientation`.
    pub fn set_source_orientation(&self, orientation: Orientation) {
        self.source.lock().2 = orientation;
    }

    /// Make every call of `op` fail from now on.
    pub fn fail_on(&self, op: MockOp) {
        self.failures.lock().push(op);
    }

    /// Create a host image that is already in memory.
    pub fn host(&self, width: u32, height: u32) -> MockImage {
        let mut img = self.new_image(width, height, 1);
        img.in_memory = true;
        img
    }

    /// Snapshot of the calls recorded so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls of one kind
    pub fn calls_of(&self, op: MockOp) -> Vec<EngineCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    /// Images created and not yet dropped
    pub fn live_images(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn new_image(&self, width: u32, height: u32, pages: usize) -> MockImage {
        self.live.fetch_add(1, Ordering::SeqCst);
        MockImage {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            width,
            height,
            pages,
            orientation: Orientation::default(),
            profile_imported: false,
            in_memory: false,
            has_metadata: false,
            reads: Cell::new(0),
            live: Arc::clone(&self.live),
        }
    }

    fn record(&self, call: EngineCall) -> Result<(), ImageError> {
        let op = call.op();
        self.calls.lock().push(call);
        if self.failures.lock().contains(&op) {
            return Err(ImageError::engine_failure(
                format!("{:?}", op),
                "simulated failure",
            ));
        }
        Ok(())
    }

    fn mark_read(img: &MockImage) -> Result<(), ImageError> {
        if !img.in_memory && img.reads.get() > 0 {
            return Err(ImageError::SequentialReread);
        }
        img.reads.set(img.reads.get() + 1);
        Ok(())
    }
}

impl ImageEngine for MockEngine {
    type Image = MockImage;

    fn load(
        &self,
        _data: &ImageData,
        shrink: u32,
        scale: f64,
        pages: usize,
    ) -> Result<MockImage, ImageError> {
        self.record(EngineCall::Load {
            shrink,
            scale,
            pages,
        })
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

        let (width, height, orientation) = *self.source.lock();
        let (width, height) = if shrink > 1 {
            ((width / shrink).max(1), (height / shrink).max(1))
        } else {
            (width, height)
        };

        let mut img = self.new_image(width, height, pages.max(1));
        img.orientation = orientation;
        img.has_metadata = true;
        Ok(img)
    }

    fn width(&self, img: &MockImage) -> u32 {
        img.width
    }

    fn height(&self, img: &MockImage) -> u32 {
        img.height
    }

    fn pages(&self, img: &MockImage) -> usize {
        img.pages
    }

    fn orientation(&self, img: &MockImage) -> Orientation {
        img.orientation
    }

    fn resize(&self, img: &mut MockImage, width: u32, height: u32) -> Result<(), ImageError> {
        self.record(EngineCall::Resize {
            image: img.id,
            width,
            height,
        })?;
        if width == 0 || height == 0 {
            return Err(ImageError::resize_failed("Target dimension is 0"));
        }
        img.width = width;
        img.height = height;
        Ok(())
    }

    fn rotate_and_flip(&self, img: &mut MockImage, angle: u16, flip: bool) -> Result<(), ImageError> {
        self.record(EngineCall::RotateAndFlip {
            image: img.id,
            angle,
            flip,
        })?;
        if angle % 180 == 90 {
            std::mem::swap(&mut img.width, &mut img.height);
        }
        img.orientation = Orientation::default();
        Ok(())
    }

    fn color_profile_imported(&self, img: &MockImage) -> bool {
        img.profile_imported
    }

    fn import_color_profile(&self, img: &mut MockImage) -> Result<(), ImageError> {
        self.record(EngineCall::ImportColorProfile { image: img.id })?;
        img.profile_imported = true;
        Ok(())
    }

    fn to_rgb_colorspace(&self, img: &mut MockImage) -> Result<(), ImageError> {
        self.record(EngineCall::RgbColorspace { image: img.id })
    }

    fn embed(&self, img: &mut MockImage, insets: Insets) -> Result<(), ImageError> {
        self.record(EngineCall::Embed {
            image: img.id,
            insets,
        })?;
        let width = img.width as i64 + insets.horizontal();
        let height = img.height as i64 + insets.vertical();
        if width <= 0 || height <= 0 {
            return Err(ImageError::invalid_dimensions(
                width,
                height,
                "padding leaves no canvas",
            ));
        }
        img.width = width as u32;
        img.height = height as u32;
        Ok(())
    }

    fn copy_memory(&self, img: &mut MockImage) -> Result<(), ImageError> {
        self.record(EngineCall::CopyMemory { image: img.id })?;
        img.in_memory = true;
        Ok(())
    }

    fn replicate(&self, img: &mut MockImage, width: u32, height: u32) -> Result<(), ImageError> {
        self.record(EngineCall::Replicate {
            image: img.id,
            width,
            height,
        })?;
        if width == 0 || height == 0 || img.width == 0 || img.height == 0 {
            return Err(ImageError::tile_failed("zero-sized tile or canvas"));
        }
        Self::mark_read(img)?;
        img.width = width;
        img.height = height;
        img.pages = 1;
        img.reads.set(0);
        Ok(())
    }

    fn strip_all(&self, img: &mut MockImage) -> Result<(), ImageError> {
        self.record(EngineCall::StripAll { image: img.id })?;
        img.has_metadata = false;
        Ok(())
    }

    fn apply_watermark(
        &self,
        img: &mut MockImage,
        watermark: &MockImage,
        left: i32,
        top: i32,
        opacity: f64,
    ) -> Result<(), ImageError> {
        self.record(EngineCall::ApplyWatermark {
            image: img.id,
            watermark: watermark.id,
            left,
            top,
            opacity,
        })?;
        Self::mark_read(watermark)
    }
}
