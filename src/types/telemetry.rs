//! Temperature and power telemetry types

use chrono::{DateTime, Local};

/// Number of temperature sensor slots logged per record.
///
/// The record is fixed-width: absent sensors are logged as empty cells,
/// never skipped, so every row has the same shape.
pub const SENSOR_SLOTS: usize = 4;

/// One 1 Hz temperature record covering all sensor slots.
#[derive(Debug, Clone)]
pub struct TemperatureReading {
    pub timestamp: DateTime<Local>,
    /// Celsius per slot; `None` when the slot has no physical sensor or the
    /// read failed this tick.
    pub celsius: [Option<f64>; SENSOR_SLOTS],
}

impl TemperatureReading {
    /// Number of slots that produced a value this tick.
    pub fn present_count(&self) -> usize {
        self.celsius.iter().filter(|c| c.is_some()).count()
    }
}

/// Power rail monitor state.
///
/// Owned exclusively by `PowerFailureMonitor`; no other component reads or
/// writes it. `Suspect` means a debounce timer is armed for the current
/// episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Input reads normal, no episode in progress
    Normal,
    /// Input reads failure, debounce timer armed, alert not yet sent
    Suspect,
    /// Debounce window elapsed without restoration; alert fired
    Alerting,
    /// Input recovered after an alert fired
    Restored,
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::Normal => write!(f, "NORMAL"),
            PowerState::Suspect => write!(f, "SUSPECT"),
            PowerState::Alerting => write!(f, "ALERTING"),
            PowerState::Restored => write!(f, "RESTORED"),
        }
    }
}
