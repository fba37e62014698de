//! Integer pixel math shared by geometry and scaling.
//!
//! Offsets and scaled sizes are rounded to even pixel counts so that frames
//! and padding stay seam-free when an image is later halved or doubled.

/// Round to the nearest even integer.
pub fn round_to_even(value: f64) -> i32 {
    ((value / 2.0).round() * 2.0) as i32
}

/// Scale a pixel dimension and round the result to an even count.
pub fn scale_to_even(dimension: u32, scale: f64) -> i32 {
    round_to_even(dimension as f64 * scale)
}

/// Scale a pixel value with ordinary rounding.
pub fn scale(value: i32, scale: f64) -> i32 {
    (value as f64 * scale).round() as i32
}
