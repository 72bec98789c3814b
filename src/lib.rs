//! Fieldstation: unattended environmental recording
//!
//! Adaptive capture-and-monitoring control loop for a long-running field
//! station.
//!
//! ## Architecture
//!
//! - **Capture orchestrator**: 60-second image cadence with dual-tier
//!   exposure control (schedule lookup + closed-loop brightness correction)
//!   and scoped LED illumination
//! - **Temperature sampler**: 1 Hz fixed-width records over up to 4 sensors
//! - **Power failure monitor**: debounced outage detection, one alert per
//!   confirmed episode
//!
//! The three loops are independent: they share no mutable state beyond their
//! own append-only sinks and shut down individually on a process-wide
//! cancellation token.

pub mod alert;
pub mod capture;
pub mod config;
pub mod exposure;
pub mod hardware;
pub mod power;
pub mod storage;
pub mod telemetry;
pub mod types;

// Re-export configuration
pub use config::StationConfig;

// Re-export commonly used types
pub use types::{
    CaptureAttempt, Frame, PowerState, QualityMetrics, TemperatureReading, SENSOR_SLOTS,
};

// Re-export the control components
pub use capture::CaptureOrchestrator;
pub use exposure::{AutoExposureController, ExposureHistory, ExposureSchedule};
pub use power::PowerFailureMonitor;
pub use telemetry::TemperatureSampler;
