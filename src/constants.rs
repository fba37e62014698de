// Constants module - centralized default values for configuration
//
// Defaults used by the configuration layer and the raster engine live here
// instead of as magic numbers at the call sites.

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default process-wide watermark opacity multiplier
pub const DEFAULT_WATERMARK_OPACITY: f64 = 1.0;

/// Default per-request watermark opacity
pub const DEFAULT_REQUEST_OPACITY: f64 = 1.0;

// =============================================================================
// Engine defaults
// =============================================================================

/// Maximum pixel count a raster image may reach (image bomb protection)
pub const DEFAULT_MAX_PIXELS: u64 = 50_000_000;

/// Decode-time JPEG shrink factors, largest first
pub const JPEG_SHRINK_FACTORS: [u32; 3] = [8, 4, 2];

/// Smallest downscale worth a decode-time shrink
pub const MIN_SHRINK_ON_LOAD: f64 = 2.0;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";
