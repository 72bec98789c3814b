//! Closed-loop brightness controller
//!
//! Converges on an exposure that puts the measured mean brightness inside
//! the target band, using reduced-resolution test frames. The correction per
//! attempt is a damped proportional step; the attempt budget is bounded so
//! convergence can never starve the capture cadence.

use super::{quality, CaptureError, ExposureHistory};
use crate::config::AutoExposureConfig;
use crate::hardware::Camera;
use crate::types::{CaptureAttempt, Frame};
use tracing::{debug, info, warn};

pub struct AutoExposureController {
    config: AutoExposureConfig,
}

impl AutoExposureController {
    pub fn new(config: AutoExposureConfig) -> Self {
        Self { config }
    }

    /// Run the convergence loop and return the accepted attempt.
    ///
    /// On an in-tolerance result the accepted exposure is recorded into the
    /// history. When the attempt budget runs out the last attempt is returned
    /// as a best-effort result instead of failing the cycle — a dim or bright
    /// frame beats skipping the capture entirely. Camera failures propagate
    /// to the orchestrator.
    pub async fn converge<C: Camera>(
        &self,
        camera: &C,
        history: &mut ExposureHistory,
        start_exposure_us: u32,
    ) -> Result<CaptureAttempt, CaptureError> {
        let cfg = &self.config;
        let mut current = start_exposure_us.clamp(cfg.min_exposure_us, cfg.max_exposure_us);
        let mut attempt_no = 0u32;

        loop {
            attempt_no += 1;
            let (actual, frame) = self.settled_capture(camera, current).await?;
            let metrics = quality::analyze(&frame)?;
            let trial = CaptureAttempt {
                requested_exposure_us: current,
                actual_exposure_us: actual,
                metrics,
            };
            debug!(
                attempt = attempt_no,
                requested_us = current,
                applied_us = actual,
                brightness = format!("{:.1}", metrics.mean_brightness),
                "Test frame"
            );

            if (metrics.mean_brightness - cfg.target_brightness).abs() <= cfg.tolerance {
                info!(
                    attempts = attempt_no,
                    exposure_us = actual,
                    brightness = format!("{:.1}", metrics.mean_brightness),
                    "Auto-exposure converged"
                );
                history.record(actual);
                return Ok(trial);
            }

            if attempt_no >= cfg.max_attempts {
                warn!(
                    attempts = attempt_no,
                    exposure_us = actual,
                    brightness = format!("{:.1}", metrics.mean_brightness),
                    target = cfg.target_brightness,
                    "Attempt budget exhausted — accepting best-effort exposure"
                );
                return Ok(trial);
            }

            current = self.corrected_exposure(current, metrics.mean_brightness);
        }
    }

    /// Damped proportional correction toward the target brightness.
    fn corrected_exposure(&self, current_us: u32, brightness: f64) -> u32 {
        let cfg = &self.config;
        let proportional =
            f64::from(current_us) * cfg.target_brightness / brightness.max(1.0);
        let next = f64::from(current_us) + cfg.damping * (proportional - f64::from(current_us));
        next.round().clamp(
            f64::from(cfg.min_exposure_us),
            f64::from(cfg.max_exposure_us),
        ) as u32
    }

    /// Capture a test frame, re-requesting the same exposure while the camera
    /// has not yet applied it. Measuring brightness at a stale exposure would
    /// poison the correction, so the request is repeated unchanged up to the
    /// retry bound; past that the attempt proceeds with whatever was applied
    /// (degraded but usable).
    async fn settled_capture<C: Camera>(
        &self,
        camera: &C,
        exposure_us: u32,
    ) -> Result<(u32, Frame), CaptureError> {
        let cfg = &self.config;
        let mut result = camera.capture_test_frame(exposure_us).await?;
        let mut retries = 0;
        while result.0.abs_diff(exposure_us) > cfg.settle_tolerance_us
            && retries < cfg.settle_retries
        {
            debug!(
                requested_us = exposure_us,
                applied_us = result.0,
                retry = retries + 1,
                "Camera exposure not yet applied — re-requesting"
            );
            result = camera.capture_test_frame(exposure_us).await?;
            retries += 1;
        }
        if result.0.abs_diff(exposure_us) > cfg.settle_tolerance_us {
            warn!(
                requested_us = exposure_us,
                applied_us = result.0,
                "Camera never settled on requested exposure — proceeding with applied value"
            );
        }
        Ok(result)
    }
}
