//! Shared data structures for the recording station
//!
//! Core types flow one way into the capture orchestrator:
//! - `Frame` — pixel buffers returned by the camera collaborator
//! - `QualityMetrics` / `CaptureAttempt` — auto-exposure measurements
//! - `TemperatureReading` — 1 Hz sensor rows
//! - `PowerState` — owned exclusively by the power failure monitor

mod capture;
mod telemetry;

pub use capture::*;
pub use telemetry::*;
