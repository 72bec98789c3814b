//! Hardware collaborator interfaces
//!
//! The station core never talks to drivers directly: the camera, GPIO lines,
//! and the 1-Wire temperature bus sit behind these traits. Production
//! deployments supply driver-backed implementations; `simulated` provides
//! rand-driven backends for development and tests.
//!
//! The camera is an exclusive resource with no concurrent-access contract —
//! only the capture orchestrator ever holds it.

pub mod simulated;

use crate::types::Frame;
use async_trait::async_trait;
use thiserror::Error;

/// The camera driver could not produce a frame.
#[derive(Debug, Error)]
#[error("camera unavailable: {0}")]
pub struct CameraError(pub String);

/// A single sensor slot failed to produce a reading this tick.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    ReadFailed(String),
}

/// A digital I/O operation failed.
#[derive(Debug, Error)]
#[error("gpio pin {pin}: {reason}")]
pub struct GpioError {
    pub pin: u8,
    pub reason: String,
}

/// Still camera with explicit exposure control.
///
/// Both capture calls return the exposure the sensor actually applied, which
/// can lag the request by several frames while the pipeline settles.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Reduced-resolution frame for brightness analysis (~1920x1080).
    async fn capture_test_frame(&self, exposure_us: u32) -> Result<(u32, Frame), CameraError>;

    /// Full-resolution frame for storage (~4608x2592).
    async fn capture_full_frame(&self, exposure_us: u32) -> Result<(u32, Frame), CameraError>;
}

/// Digital I/O lines. Writes and reads are immediate, so the interface is
/// synchronous — this is what lets the LED guard release in `Drop`.
pub trait Gpio: Send + Sync {
    fn set_output(&self, pin: u8, active: bool) -> Result<(), GpioError>;

    /// Read a digital input. For the power-sense line, `false` means failure
    /// and `true` means normal.
    fn read_input(&self, pin: u8) -> Result<bool, GpioError>;
}

/// Temperature sensor bus (1-Wire DS18B20 in the original deployment).
///
/// Discovery happens once at startup; slot assignment is stable for the
/// process lifetime.
#[async_trait]
pub trait SensorBus: Send + Sync {
    type Handle: Send + Sync;

    async fn discover(&self) -> Vec<Self::Handle>;

    async fn read(&self, handle: &Self::Handle) -> Result<f64, SensorError>;
}
