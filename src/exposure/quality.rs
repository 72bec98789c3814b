//! Image quality measurement
//!
//! Single histogram pass over a (possibly subsampled) grayscale buffer,
//! producing the brightness / contrast / tonal-spread statistics the
//! exposure controller and the per-image quality log both consume.

use super::CaptureError;
use crate::types::{Frame, QualityMetrics};

/// Cap on sampled pixels per frame. Full-resolution frames are subsampled
/// with a fixed stride; the statistics are insensitive to the stride because
/// scene content dominates any aliasing.
const MAX_SAMPLES: usize = 100_000;

/// Compute quality metrics for one frame.
///
/// An empty or dimension-inconsistent buffer is a caller precondition
/// violation and reports `InvalidFrame`.
pub fn analyze(frame: &Frame) -> Result<QualityMetrics, CaptureError> {
    if !frame.is_well_formed() {
        return Err(CaptureError::InvalidFrame(format!(
            "{}x{} frame with {} pixels",
            frame.width,
            frame.height,
            frame.pixels.len()
        )));
    }

    let stride = (frame.pixels.len() / MAX_SAMPLES).max(1);
    let mut histogram = [0u64; 256];
    let mut count = 0u64;
    for &pixel in frame.pixels.iter().step_by(stride) {
        histogram[pixel as usize] += 1;
        count += 1;
    }

    let mean = histogram
        .iter()
        .enumerate()
        .map(|(value, &n)| value as f64 * n as f64)
        .sum::<f64>()
        / count as f64;

    let variance = histogram
        .iter()
        .enumerate()
        .map(|(value, &n)| (value as f64 - mean).powi(2) * n as f64)
        .sum::<f64>()
        / count as f64;

    let p5 = percentile(&histogram, count, 0.05);
    let p95 = percentile(&histogram, count, 0.95);
    let contrast_ratio = if p5 > 0.0 { p95 / p5 } else { p95 };

    Ok(QualityMetrics {
        mean_brightness: mean,
        contrast_ratio,
        histogram_stddev: variance.sqrt(),
    })
}

/// Smallest pixel value whose cumulative share reaches `q`.
fn percentile(histogram: &[u64; 256], count: u64, q: f64) -> f64 {
    let threshold = (q * count as f64).ceil() as u64;
    let mut cumulative = 0u64;
    for (value, &n) in histogram.iter().enumerate() {
        cumulative += n;
        if cumulative >= threshold {
            return value as f64;
        }
    }
    255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(value: u8, len: usize) -> Frame {
        Frame::new(len as u32, 1, vec![value; len])
    }

    #[test]
    fn uniform_frame_has_mean_and_zero_spread() {
        let m = analyze(&uniform_frame(120, 4096)).unwrap();
        assert_eq!(m.mean_brightness, 120.0);
        assert_eq!(m.histogram_stddev, 0.0);
        // p95 == p5 == 120
        assert_eq!(m.contrast_ratio, 1.0);
    }

    #[test]
    fn contrast_falls_back_to_p95_when_p5_is_zero() {
        let mut pixels = vec![0u8; 500];
        pixels.extend(vec![200u8; 500]);
        let m = analyze(&Frame::new(1000, 1, pixels)).unwrap();
        assert_eq!(m.contrast_ratio, 200.0);
    }

    #[test]
    fn split_frame_statistics() {
        let mut pixels = vec![50u8; 512];
        pixels.extend(vec![150u8; 512]);
        let m = analyze(&Frame::new(1024, 1, pixels)).unwrap();
        assert!((m.mean_brightness - 100.0).abs() < 1e-9);
        assert!((m.histogram_stddev - 50.0).abs() < 1e-9);
        assert!((m.contrast_ratio - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_buffer_is_invalid_frame() {
        let err = analyze(&Frame::new(0, 0, vec![])).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidFrame(_)));
    }

    #[test]
    fn mismatched_dimensions_are_invalid() {
        let err = analyze(&Frame::new(10, 10, vec![0u8; 50])).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidFrame(_)));
    }
}
