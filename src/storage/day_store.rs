//! Day-rolling CSV and image store
//!
//! Output layout matches the original deployment:
//!
//! ```text
//! data/
//!   day1/
//!     temp_data_2025-04-07.csv
//!     exposure_data_2025-04-07.csv
//!     image_quality_2025-04-07.csv
//!     image_20250407_120001_4608x2592.raw
//!   day2/
//!     ...
//! ```
//!
//! Day numbering counts from a configured day-one date; the paths are
//! re-evaluated on every write so the rollover needs no timer of its own.

use super::{CaptureSink, StorageError, TemperatureSink};
use crate::config::StorageConfig;
use crate::types::{Frame, QualityMetrics, TemperatureReading};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const TEMP_HEADER: &str = "timestamp,sensor1,sensor2,sensor3,sensor4";
const EXPOSURE_HEADER: &str =
    "timestamp,initial_exposure,final_exposure,avg_brightness,contrast,led_used";
const QUALITY_HEADER: &str =
    "timestamp,filename,avg_brightness,contrast,histogram_std,exposure_time";

#[derive(Debug)]
struct DayPaths {
    date: NaiveDate,
    day_dir: PathBuf,
    temp_csv: PathBuf,
    exposure_csv: PathBuf,
    quality_csv: PathBuf,
}

/// CSV/image writer with per-day directories.
#[derive(Debug)]
pub struct DayRollingStore {
    data_dir: PathBuf,
    day_one: NaiveDate,
    current: Option<DayPaths>,
}

impl DayRollingStore {
    /// `day_one` falls back to today, making the startup directory `day1`.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            day_one: config.day_one.unwrap_or_else(|| Local::now().date_naive()),
            current: None,
        }
    }

    /// Directory name for a date: days elapsed since day one, one-based.
    fn day_label(&self, date: NaiveDate) -> String {
        let day_num = (date - self.day_one).num_days() + 1;
        format!("day{day_num}")
    }

    /// Ensure the day directory and CSV headers exist for `date`, rolling
    /// over when the date has changed since the last write.
    fn paths_for(&mut self, date: NaiveDate) -> Result<&DayPaths, StorageError> {
        let stale = self.current.as_ref().map(|p| p.date) != Some(date);
        if stale {
            let day_dir = self.data_dir.join(self.day_label(date));
            fs::create_dir_all(&day_dir)?;

            let paths = DayPaths {
                date,
                temp_csv: day_dir.join(format!("temp_data_{date}.csv")),
                exposure_csv: day_dir.join(format!("exposure_data_{date}.csv")),
                quality_csv: day_dir.join(format!("image_quality_{date}.csv")),
                day_dir,
            };
            ensure_header(&paths.temp_csv, TEMP_HEADER)?;
            ensure_header(&paths.exposure_csv, EXPOSURE_HEADER)?;
            ensure_header(&paths.quality_csv, QUALITY_HEADER)?;
            info!(dir = %paths.day_dir.display(), "Rolled over to new day directory");
            self.current = Some(paths);
        }
        // Just populated above when stale; the expect can only trip on a bug.
        #[allow(clippy::expect_used)]
        Ok(self.current.as_ref().expect("day paths populated"))
    }
}

fn ensure_header(path: &Path, header: &str) -> Result<(), StorageError> {
    if !path.exists() {
        let mut f = fs::File::create(path)?;
        writeln!(f, "{header}")?;
    }
    Ok(())
}

fn append_row(path: &Path, row: &str) -> Result<(), StorageError> {
    let mut f = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(f, "{row}")?;
    Ok(())
}

impl TemperatureSink for DayRollingStore {
    fn log_reading(&mut self, reading: &TemperatureReading) -> Result<(), StorageError> {
        let path = self.paths_for(reading.timestamp.date_naive())?.temp_csv.clone();
        let cells: Vec<String> = reading
            .celsius
            .iter()
            .map(|c| c.map_or_else(String::new, |v| format!("{v:.2}")))
            .collect();
        append_row(
            &path,
            &format!(
                "{},{}",
                reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
                cells.join(",")
            ),
        )
    }
}

impl CaptureSink for DayRollingStore {
    fn log_exposure(
        &mut self,
        timestamp: DateTime<Local>,
        initial_exposure_us: u32,
        final_exposure_us: u32,
        brightness: f64,
        contrast: f64,
        led_used: bool,
    ) -> Result<(), StorageError> {
        let path = self.paths_for(timestamp.date_naive())?.exposure_csv.clone();
        append_row(
            &path,
            &format!(
                "{},{},{},{:.1},{:.1},{}",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                initial_exposure_us,
                final_exposure_us,
                brightness,
                contrast,
                led_used
            ),
        )
    }

    fn log_quality(
        &mut self,
        timestamp: DateTime<Local>,
        filename: &str,
        metrics: &QualityMetrics,
        exposure_us: u32,
    ) -> Result<(), StorageError> {
        let path = self.paths_for(timestamp.date_naive())?.quality_csv.clone();
        append_row(
            &path,
            &format!(
                "{},{},{:.1},{:.1},{:.1},{}",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                filename,
                metrics.mean_brightness,
                metrics.contrast_ratio,
                metrics.histogram_stddev,
                exposure_us
            ),
        )
    }

    fn store_image(
        &mut self,
        timestamp: DateTime<Local>,
        frame: &Frame,
        _exposure_us: u32,
    ) -> Result<String, StorageError> {
        let day_dir = self.paths_for(timestamp.date_naive())?.day_dir.clone();
        // Encoding is the viewer's problem; the station stores the raw
        // grayscale buffer with dimensions in the name.
        let filename = format!(
            "image_{}_{}x{}.raw",
            timestamp.format("%Y%m%d_%H%M%S"),
            frame.width,
            frame.height
        );
        fs::write(day_dir.join(&filename), &frame.pixels)?;
        Ok(filename)
    }
}
