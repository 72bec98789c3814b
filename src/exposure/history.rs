//! Bounded history of accepted exposures

use crate::config::AutoExposureConfig;
use std::collections::VecDeque;

/// FIFO record of the last N accepted exposures.
///
/// Owned by the orchestrator's long-lived context and passed by reference
/// into the controller each cycle — no ambient state. Recorded only at the
/// end of a successful convergence; never cleared except by process restart
/// (the first cycle after a cold start relies entirely on the schedule).
#[derive(Debug)]
pub struct ExposureHistory {
    recent: VecDeque<u32>,
    depth: usize,
    blend: f64,
    min_exposure_us: u32,
    max_exposure_us: u32,
}

impl ExposureHistory {
    pub fn new(config: &AutoExposureConfig) -> Self {
        Self {
            recent: VecDeque::with_capacity(config.history_depth),
            depth: config.history_depth,
            blend: config.history_blend,
            min_exposure_us: config.min_exposure_us,
            max_exposure_us: config.max_exposure_us,
        }
    }

    /// Append an accepted exposure, evicting the oldest past the depth.
    pub fn record(&mut self, exposure_us: u32) {
        if self.recent.len() == self.depth {
            self.recent.pop_front();
        }
        self.recent.push_back(exposure_us);
    }

    /// Starting exposure for the next convergence: the schedule value alone
    /// when the history is empty, otherwise the history mean blended against
    /// the schedule value and clamped to the configured bounds.
    pub fn weighted_start(&self, schedule_value: u32) -> u32 {
        if self.recent.is_empty() {
            return schedule_value;
        }
        let mean =
            self.recent.iter().map(|&e| f64::from(e)).sum::<f64>() / self.recent.len() as f64;
        let blended = self.blend * mean + (1.0 - self.blend) * f64::from(schedule_value);
        blended
            .round()
            .clamp(f64::from(self.min_exposure_us), f64::from(self.max_exposure_us))
            as u32
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
