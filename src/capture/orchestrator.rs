//! Capture cycle orchestration

use super::led::{self, LedGuard};
use crate::config::{CaptureConfig, DayNightBoundary, LedConfig, StationConfig};
use crate::exposure::{self, AutoExposureController, CaptureError, ExposureHistory, ExposureSchedule};
use crate::hardware::{Camera, CameraError, Gpio, GpioError};
use crate::storage::{CaptureSink, StorageError};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Any failure within one cycle. Caught at the cycle boundary: logged, and
/// the loop proceeds to the next cadence tick. Never terminates the process.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("LED control failed: {0}")]
    Led(#[from] GpioError),
}

impl From<CameraError> for CycleError {
    fn from(e: CameraError) -> Self {
        Self::Capture(e.into())
    }
}

/// Outcome of one successful cycle, for the log line.
#[derive(Debug)]
pub struct CycleSummary {
    pub filename: String,
    pub exposure_us: u32,
    pub brightness: f64,
    pub led_used: bool,
}

/// Top-level capture loop.
///
/// Sole owner of the camera and the LED output — the camera is an exclusive
/// hardware resource with no concurrent-access contract. Runs one cycle per
/// cadence tick; the tick period is independent of how long convergence
/// takes (convergence is attempt-bounded so it cannot starve the cadence).
pub struct CaptureOrchestrator<C: Camera, G: Gpio, S: CaptureSink> {
    camera: C,
    gpio: Arc<G>,
    sink: S,
    schedule: ExposureSchedule,
    history: ExposureHistory,
    controller: AutoExposureController,
    led: LedConfig,
    day: DayNightBoundary,
    capture: CaptureConfig,
}

impl<C: Camera, G: Gpio, S: CaptureSink> CaptureOrchestrator<C, G, S> {
    pub fn new(camera: C, gpio: Arc<G>, sink: S, config: &StationConfig) -> Self {
        Self {
            camera,
            gpio,
            sink,
            schedule: ExposureSchedule::new(config.schedule.clone()),
            history: ExposureHistory::new(&config.auto_exposure),
            controller: AutoExposureController::new(config.auto_exposure),
            led: config.led,
            day: config.day,
            capture: config.capture,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            cadence_secs = self.capture.cadence_secs,
            auto_exposure = self.capture.auto_exposure,
            led = self.led.use_led,
            "Capture orchestrator started"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.capture.cadence_secs));
        // A cycle that overruns the cadence skips the missed ticks rather
        // than bursting back-to-back captures.
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // The cycle races the shutdown token: a mid-cycle shutdown drops
            // the cycle future, and the LED guard's Drop still runs.
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown during capture cycle");
                    break;
                }
                result = self.run_cycle() => match result {
                    Ok(s) => info!(
                        file = %s.filename,
                        exposure_us = s.exposure_us,
                        brightness = format!("{:.1}", s.brightness),
                        led = s.led_used,
                        "Image captured"
                    ),
                    Err(e) => warn!(error = %e, "Capture cycle failed — continuing to next tick"),
                }
            }
        }
        info!("Capture orchestrator stopped");
    }

    /// One capture cycle: schedule lookup, weighted start, LED policy,
    /// convergence, full-resolution capture, persistence.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, CycleError> {
        let now = Local::now();
        let schedule_value = self.schedule.lookup(now.time());
        let led_used = led::should_use_led(
            self.led.use_led,
            self.led.night_only,
            &self.day,
            now.time(),
        );

        // Scoped activation: the guard turns the LED off on every exit path
        // from this function, early error returns included.
        let _led = if led_used {
            let guard = LedGuard::activate(self.gpio.as_ref(), self.led.pin)?;
            tokio::time::sleep(Duration::from_millis(self.capture.led_warmup_ms)).await;
            Some(guard)
        } else {
            None
        };

        // Auto-exposure is an optional refinement layer, never a hard
        // dependency: disabled, the schedule value drives the camera directly.
        let (initial_us, exposure_us) = if self.capture.auto_exposure {
            let start = self.history.weighted_start(schedule_value);
            let accepted = self
                .controller
                .converge(&self.camera, &mut self.history, start)
                .await?;
            (start, accepted.actual_exposure_us)
        } else {
            (schedule_value, schedule_value)
        };

        let (applied_us, frame) = self.camera.capture_full_frame(exposure_us).await?;
        let metrics = exposure::analyze(&frame)?;

        let filename = self.sink.store_image(now, &frame, applied_us)?;
        self.sink.log_exposure(
            now,
            initial_us,
            applied_us,
            metrics.mean_brightness,
            metrics.contrast_ratio,
            led_used,
        )?;
        self.sink.log_quality(now, &filename, &metrics, applied_us)?;

        Ok(CycleSummary {
            filename,
            exposure_us: applied_us,
            brightness: metrics.mean_brightness,
            led_used,
        })
    }
}
