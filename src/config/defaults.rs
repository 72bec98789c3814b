//! System-wide default constants.
//!
//! Centralises magic numbers so every tunable has exactly one home.
//! Grouped by subsystem.

// ============================================================================
// Capture cadence
// ============================================================================

/// Seconds between capture cycles. The cadence is unconditional — it does
/// not stretch when a cycle's convergence attempts run long.
pub const CAPTURE_CADENCE_SECS: u64 = 60;

/// Milliseconds to let the LED reach full brightness before capture.
pub const LED_WARMUP_MS: u64 = 500;

// ============================================================================
// Auto-exposure
// ============================================================================

/// Target mean brightness for auto-exposure (0-255).
pub const TARGET_BRIGHTNESS: f64 = 120.0;

/// Acceptable deviation from the target brightness.
pub const BRIGHTNESS_TOLERANCE: f64 = 20.0;

/// Minimum exposure time (microseconds).
pub const MIN_EXPOSURE_US: u32 = 5_000;

/// Maximum exposure time (microseconds).
pub const MAX_EXPOSURE_US: u32 = 10_000_000;

/// Fraction of the full proportional correction applied per attempt.
/// Conservative to avoid oscillating between over- and under-corrections.
pub const EXPOSURE_DAMPING: f64 = 0.5;

/// Maximum brightness-correction attempts per capture cycle.
pub const MAX_EXPOSURE_ATTEMPTS: u32 = 5;

/// The camera has applied a requested exposure when the reported value is
/// within this many microseconds of the request.
pub const EXPOSURE_SETTLE_TOLERANCE_US: u32 = 50;

/// Re-requests of the same exposure while waiting for the camera to apply it.
pub const EXPOSURE_SETTLE_RETRIES: u32 = 5;

/// Accepted exposures kept for history-weighted starting points.
pub const EXPOSURE_HISTORY_DEPTH: usize = 5;

/// Weight of the recent-history mean when blending a starting exposure.
/// The schedule value carries the remaining weight.
pub const HISTORY_BLEND_WEIGHT: f64 = 0.7;

// ============================================================================
// Temperature sampling
// ============================================================================

/// Seconds between temperature records.
pub const TEMPERATURE_INTERVAL_SECS: u64 = 1;

// ============================================================================
// Power failure monitor
// ============================================================================

/// Digital input poll interval (milliseconds). Short relative to the
/// debounce window so restoration cancels the pending alert promptly.
pub const POWER_POLL_INTERVAL_MS: u64 = 250;

/// Seconds a failure must persist before the alert fires.
pub const POWER_DEBOUNCE_SECS: u64 = 60;

/// GPIO input pin sensing the power rail (0 = failure, 1 = normal).
pub const POWER_INPUT_PIN: u8 = 12;

/// GPIO output pin driving the illumination LED.
pub const LED_PIN: u8 = 27;

// ============================================================================
// Day / night boundary
// ============================================================================

/// First hour of the day interval (inclusive).
pub const DAY_START_HOUR: u8 = 6;

/// First hour after the day interval (exclusive).
pub const DAY_END_HOUR: u8 = 19;
