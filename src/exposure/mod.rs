//! Exposure control
//!
//! The dual-tier exposure pipeline:
//! - `schedule` — time-of-day baseline lookup
//! - `history` — bounded record of recently accepted exposures, blended with
//!   the schedule to produce each cycle's starting exposure
//! - `quality` — brightness / contrast / tonal-spread measurement
//! - `controller` — closed-loop convergence toward the target brightness

mod controller;
mod history;
mod quality;
mod schedule;

pub use controller::AutoExposureController;
pub use history::ExposureHistory;
pub use quality::analyze;
pub use schedule::ExposureSchedule;

use crate::hardware::CameraError;
use thiserror::Error;

/// Errors inside one capture attempt. Both kinds skip the cycle and are
/// retried at the next cadence tick; neither terminates the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    CameraUnavailable(#[from] CameraError),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
