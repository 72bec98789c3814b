//! Frame and capture-attempt types

use serde::{Deserialize, Serialize};

/// Reduced-resolution frame size used for exposure test captures.
pub const TEST_FRAME_SIZE: (u32, u32) = (1920, 1080);

/// Full-resolution frame size used for stored captures.
pub const FULL_FRAME_SIZE: (u32, u32) = (4608, 2592);

/// An 8-bit grayscale pixel buffer as returned by the camera collaborator.
///
/// Color conversion happens in the driver; the analysis pipeline only ever
/// sees luminance values.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        !self.pixels.is_empty() && self.pixels.len() == (self.width as usize) * (self.height as usize)
    }
}

/// Image quality statistics computed from one frame.
///
/// Immutable once computed; attached to exactly one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean pixel value (0-255)
    pub mean_brightness: f64,
    /// 95th percentile / 5th percentile pixel value (p95 itself when p5 is 0)
    pub contrast_ratio: f64,
    /// Standard deviation of the pixel value distribution
    pub histogram_stddev: f64,
}

/// One exposure trial within a capture cycle.
///
/// A cycle terminates when `actual_exposure_us` matches the request within
/// the camera settle tolerance AND brightness lands inside the configured
/// target band, or when the attempt budget runs out.
#[derive(Debug, Clone, Copy)]
pub struct CaptureAttempt {
    pub requested_exposure_us: u32,
    pub actual_exposure_us: u32,
    pub metrics: QualityMetrics,
}
