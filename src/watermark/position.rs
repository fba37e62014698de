//! Position calculation for watermark placement.
//!
//! Gravity options carry an anchor plus an `x`/`y` offset per axis. An offset
//! with `|value| >= 1.0` is an absolute pixel count multiplied by the offset
//! scale (the device pixel ratio); anything smaller is a fraction of the target
//! dimension. Both readings round to an even pixel count.
//!
//! The same offsets are read two ways:
//!
//! - [`resolve_placement`]: where a single watermark lands inside the target
//! - [`resolve_tile_gap`]: the gap left around each tile when replicating
//!
//! # Example
//!
//! ```
//! use imgmark::imaging::{GravityOptions, GravityType};
//! use imgmark::watermark::position::resolve_placement;
//!
//! let gravity = GravityOptions::new(GravityType::SouthEast, 10.0, 10.0);
//! let pos = resolve_placement(800, 600, 100, 50, &gravity, 1.0, true);
//! assert_eq!((pos.x, pos.y), (690, 540)); // 800 - 100 - 10, 600 - 50 - 10
//! ```

use tracing::debug;

use crate::imaging::{GravityOptions, GravityType, Insets};
use crate::imath;

/// A single position where a watermark should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Where the watermark's box sits on one axis before the offset is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn horizontal(kind: GravityType) -> Self {
        if kind.is_west() {
            Self::Start
        } else if kind.is_east() {
            Self::End
        } else {
            Self::Middle
        }
    }

    fn vertical(kind: GravityType) -> Self {
        if kind.is_north() {
            Self::Start
        } else if kind.is_south() {
            Self::End
        } else {
            Self::Middle
        }
    }

    // i64: saturated offsets must not wrap before clamping
    fn place(self, target: i64, inner: i64, offset: i64) -> i64 {
        match self {
            Self::Start => offset,
            Self::Middle => i64::from(imath::round_to_even((target - inner) as f64 / 2.0)) + offset,
            Self::End => target - inner - offset,
        }
    }
}

/// Resolve one gravity offset to pixels.
///
/// `|value| >= 1.0` is absolute and scaled by `offset_scale`; smaller values
/// are a fraction of `dimension`. The result is always even.
pub fn resolve_offset(value: f64, dimension: u32, offset_scale: f64) -> i32 {
    if value.abs() >= 1.0 {
        imath::round_to_even(value * offset_scale)
    } else {
        imath::scale_to_even(dimension, value)
    }
}

/// Split an offset into two insets that add up to it exactly.
///
/// The first half uses truncating division, so odd and negative offsets put
/// the remainder on the second side.
pub fn split_inset(offset: i32) -> (i32, i32) {
    let first = offset / 2;
    (first, offset - first)
}

/// Resolve where a watermark of `inner_*` size lands in a `target_*` area.
///
/// With `allow_overflow` the watermark may hang over the edges as long as one
/// pixel stays inside; otherwise it is kept fully within the target.
pub fn resolve_placement(
    target_width: u32,
    target_height: u32,
    inner_width: u32,
    inner_height: u32,
    gravity: &GravityOptions,
    offset_scale: f64,
    allow_overflow: bool,
) -> PlacementPosition {
    let off_x = resolve_offset(gravity.x, target_width, offset_scale);
    let off_y = resolve_offset(gravity.y, target_height, offset_scale);

    let (tw, th) = (i64::from(target_width), i64::from(target_height));
    let (iw, ih) = (i64::from(inner_width), i64::from(inner_height));

    let x = Anchor::horizontal(gravity.kind).place(tw, iw, i64::from(off_x));
    let y = Anchor::vertical(gravity.kind).place(th, ih, i64::from(off_y));

    let position = PlacementPosition::new(
        clamp_axis(x, tw, iw, allow_overflow),
        clamp_axis(y, th, ih, allow_overflow),
    );

    debug!(
        gravity = ?gravity.kind,
        offset_x = off_x,
        offset_y = off_y,
        x = position.x,
        y = position.y,
        "Resolved watermark placement"
    );
    position
}

/// Padding that leaves the gravity offset as a gap between repeated tiles.
pub fn resolve_tile_gap(
    target_width: u32,
    target_height: u32,
    gravity: &GravityOptions,
    offset_scale: f64,
) -> Insets {
    let (left, right) = split_inset(resolve_offset(gravity.x, target_width, offset_scale));
    let (top, bottom) = split_inset(resolve_offset(gravity.y, target_height, offset_scale));
    Insets::new(top, right, bottom, left)
}

fn clamp_axis(value: i64, target: i64, inner: i64, allow_overflow: bool) -> i32 {
    let (min, max) = if allow_overflow {
        (-inner + 1, target - 1)
    } else {
        (0, target - inner)
    };
    // A watermark larger than the target leaves max < min; pin to the start
    let clamped = value.min(max).max(min);
    clamped.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
