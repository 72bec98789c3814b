//! Record sinks
//!
//! The capture loop and the temperature sampler never write files directly;
//! they push fixed-schema rows through these traits. The in-tree backend is
//! the day-rolling CSV layout of the original deployment; tests substitute
//! in-memory sinks.
//!
//! A sink failure is a per-cycle / per-tick error: logged by the owning loop,
//! never fatal.

mod day_store;

pub use day_store::DayRollingStore;

use crate::types::{Frame, QualityMetrics, TemperatureReading};
use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-cycle capture records: one exposure row per cycle, one quality row and
/// one stored image per captured frame.
pub trait CaptureSink: Send {
    /// Record one auto-exposure outcome (starting vs accepted exposure).
    fn log_exposure(
        &mut self,
        timestamp: DateTime<Local>,
        initial_exposure_us: u32,
        final_exposure_us: u32,
        brightness: f64,
        contrast: f64,
        led_used: bool,
    ) -> Result<(), StorageError>;

    /// Record quality metrics for a stored image.
    fn log_quality(
        &mut self,
        timestamp: DateTime<Local>,
        filename: &str,
        metrics: &QualityMetrics,
        exposure_us: u32,
    ) -> Result<(), StorageError>;

    /// Persist the full-resolution frame; returns the stored filename.
    fn store_image(
        &mut self,
        timestamp: DateTime<Local>,
        frame: &Frame,
        exposure_us: u32,
    ) -> Result<String, StorageError>;
}

/// 1 Hz temperature rows, fixed-width regardless of sensor population.
pub trait TemperatureSink: Send {
    fn log_reading(&mut self, reading: &TemperatureReading) -> Result<(), StorageError>;
}
