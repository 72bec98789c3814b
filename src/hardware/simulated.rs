//! Simulated hardware backends
//!
//! Rand-driven stand-ins for the camera, GPIO lines, and sensor bus, used on
//! development machines and in tests. The camera's brightness response is a
//! saturating monotonic function of exposure, which is what the closed-loop
//! controller assumes of the real sensor.

use super::{Camera, CameraError, Gpio, GpioError, SensorBus, SensorError};
use crate::types::{Frame, FULL_FRAME_SIZE, TEST_FRAME_SIZE};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// Camera
// ============================================================================

#[derive(Debug)]
struct CamState {
    applied_us: u32,
    pending_us: Option<u32>,
    countdown: u32,
}

/// Simulated still camera.
///
/// Brightness follows `255 * (1 - exp(-exposure / scene_scale))`, so longer
/// exposures always produce brighter frames with diminishing returns.
/// `settle_frames` models the real sensor's lag between requesting an
/// exposure and the pipeline actually applying it.
pub struct SimCamera {
    scene_scale: f64,
    settle_frames: u32,
    state: Mutex<CamState>,
}

impl SimCamera {
    pub fn new(scene_scale: f64, initial_exposure_us: u32) -> Self {
        Self {
            scene_scale,
            settle_frames: 0,
            state: Mutex::new(CamState {
                applied_us: initial_exposure_us,
                pending_us: None,
                countdown: 0,
            }),
        }
    }

    /// Number of captures a new exposure request takes to be applied.
    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames;
        self
    }

    /// Advance the settle model and return the exposure the sensor reports.
    fn apply(&self, requested_us: u32) -> u32 {
        let mut st = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if st.applied_us != requested_us {
            if st.pending_us == Some(requested_us) && st.countdown > 0 {
                st.countdown -= 1;
            } else if st.pending_us != Some(requested_us) {
                st.pending_us = Some(requested_us);
                st.countdown = self.settle_frames;
            }
            if st.countdown == 0 {
                st.applied_us = requested_us;
                st.pending_us = None;
            }
        }
        st.applied_us
    }

    fn render(&self, applied_us: u32, (width, height): (u32, u32)) -> Frame {
        let mean = 255.0 * (1.0 - (-f64::from(applied_us) / self.scene_scale).exp());
        let mut rng = rand::thread_rng();
        let pixels = (0..(width as usize) * (height as usize))
            .map(|_| {
                let noise: f64 = rng.gen_range(-4.0..4.0);
                (mean + noise).clamp(0.0, 255.0) as u8
            })
            .collect();
        Frame::new(width, height, pixels)
    }
}

#[async_trait]
impl Camera for SimCamera {
    async fn capture_test_frame(&self, exposure_us: u32) -> Result<(u32, Frame), CameraError> {
        let applied = self.apply(exposure_us);
        Ok((applied, self.render(applied, TEST_FRAME_SIZE)))
    }

    async fn capture_full_frame(&self, exposure_us: u32) -> Result<(u32, Frame), CameraError> {
        let applied = self.apply(exposure_us);
        Ok((applied, self.render(applied, FULL_FRAME_SIZE)))
    }
}

// ============================================================================
// GPIO
// ============================================================================

/// Simulated digital I/O. Pins default high, so the power-sense line reads
/// "normal" until a test or simulation script drives it low.
#[derive(Default)]
pub struct SimGpio {
    levels: Mutex<HashMap<u8, bool>>,
    transitions: Mutex<Vec<(u8, bool)>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive an input line from outside the station (test / simulation hook).
    pub fn set_input_level(&self, pin: u8, level: bool) {
        self.levels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(pin, level);
    }

    /// Current level of a pin (outputs included). Unwritten pins read high.
    pub fn level(&self, pin: u8) -> bool {
        *self
            .levels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&pin)
            .unwrap_or(&true)
    }

    /// Ordered output writes observed on one pin. Lets tests assert the LED
    /// on/off pairing rather than just the final level.
    pub fn writes(&self, pin: u8) -> Vec<bool> {
        self.transitions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, level)| *level)
            .collect()
    }
}

impl Gpio for SimGpio {
    fn set_output(&self, pin: u8, active: bool) -> Result<(), GpioError> {
        self.levels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(pin, active);
        self.transitions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((pin, active));
        Ok(())
    }

    fn read_input(&self, pin: u8) -> Result<bool, GpioError> {
        Ok(self.level(pin))
    }
}

// ============================================================================
// Sensor bus
// ============================================================================

/// Handle to one simulated DS18B20.
#[derive(Debug, Clone)]
pub struct SimSensorHandle {
    id: usize,
}

/// Simulated 1-Wire bus with a fixed number of attached sensors.
pub struct SimSensorBus {
    count: usize,
    failing: Mutex<Vec<usize>>,
}

impl SimSensorBus {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Make one sensor start failing its reads (test hook).
    pub fn fail_sensor(&self, id: usize) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(id);
    }
}

#[async_trait]
impl SensorBus for SimSensorBus {
    type Handle = SimSensorHandle;

    async fn discover(&self) -> Vec<SimSensorHandle> {
        (0..self.count).map(|id| SimSensorHandle { id }).collect()
    }

    async fn read(&self, handle: &SimSensorHandle) -> Result<f64, SensorError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&handle.id);
        if failing {
            return Err(SensorError::ReadFailed(format!(
                "simulated fault on sensor {}",
                handle.id
            )));
        }
        // Each sensor sits at a slightly different base temperature.
        let base = 20.0 + handle.id as f64;
        let jitter: f64 = rand::thread_rng().gen_range(-1.0..1.0);
        Ok(base + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn brightness_is_monotonic_in_exposure() {
        let cam = SimCamera::new(150_000.0, 5_000);
        let (_, dim) = cam.capture_test_frame(5_000).await.unwrap();
        let (_, bright) = cam.capture_test_frame(500_000).await.unwrap();
        let mean = |f: &Frame| {
            f.pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / f.pixels.len() as f64
        };
        assert!(mean(&bright) > mean(&dim));
    }

    #[tokio::test]
    async fn settle_lag_reports_stale_exposure_first() {
        let cam = SimCamera::new(150_000.0, 10_000).with_settle_frames(1);
        let (applied, _) = cam.capture_test_frame(50_000).await.unwrap();
        assert_eq!(applied, 10_000);
        let (applied, _) = cam.capture_test_frame(50_000).await.unwrap();
        assert_eq!(applied, 50_000);
    }

    #[test]
    fn gpio_records_write_order() {
        let gpio = SimGpio::new();
        gpio.set_output(27, true).unwrap();
        gpio.set_output(27, false).unwrap();
        assert_eq!(gpio.writes(27), vec![true, false]);
        assert!(!gpio.level(27));
    }
}
