//! Capture loop
//!
//! - `led` — pure activation policy plus the scoped on/off guard
//! - `orchestrator` — the 60-second cycle driving exposure, camera, and sinks

pub mod led;
mod orchestrator;

pub use led::{should_use_led, LedGuard};
pub use orchestrator::{CaptureOrchestrator, CycleError, CycleSummary};
