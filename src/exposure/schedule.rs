//! Time-of-day baseline exposure lookup

use crate::config::ScheduleEntry;
use chrono::{NaiveTime, Timelike};

/// Ordered table of time-of-day exposure breakpoints.
///
/// Built from a validated config, so the table is non-empty and sorted by
/// (hour, minute). Lookup is pure and infallible.
#[derive(Debug, Clone)]
pub struct ExposureSchedule {
    entries: Vec<ScheduleEntry>,
}

impl ExposureSchedule {
    /// `entries` must be non-empty and sorted — guaranteed by config
    /// validation, which is the only producer.
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        debug_assert!(!entries.is_empty());
        Self { entries }
    }

    /// Baseline exposure for the given time of day: the latest entry at or
    /// before `now`. Before the first entry, wraps to the table's last entry
    /// — the region after the final breakpoint covers midnight.
    pub fn lookup(&self, now: NaiveTime) -> u32 {
        let now_minutes = now.hour() * 60 + now.minute();
        self.entries
            .iter()
            .rev()
            .find(|e| e.minutes() <= now_minutes)
            .unwrap_or_else(|| &self.entries[self.entries.len() - 1])
            .exposure_us
    }
}
