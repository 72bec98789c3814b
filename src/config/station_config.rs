//! Station configuration — every tunable the deployment previously hardcoded
//! is a TOML field here.
//!
//! Each struct implements `Default` with values matching the original
//! deployment constants, so behavior is unchanged when no config file is
//! present. A malformed or out-of-range config is fatal at load time; nothing
//! at runtime ever re-validates these values.

use super::defaults;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration load / validation errors. The only fatal error class in the
/// system: the daemon refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Leaf sections
// ============================================================================

/// One time-of-day breakpoint in the baseline exposure table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Hour of day, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Baseline exposure from this breakpoint onward (microseconds)
    pub exposure_us: u32,
}

impl ScheduleEntry {
    /// Minutes past midnight, for ordering and lookup.
    pub fn minutes(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

/// Half-open `[start_hour, end_hour)` interval defining "day".
/// Everything outside it is "night". May span midnight (start > end).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayNightBoundary {
    #[serde(default = "default_day_start")]
    pub start_hour: u8,
    #[serde(default = "default_day_end")]
    pub end_hour: u8,
}

fn default_day_start() -> u8 {
    defaults::DAY_START_HOUR
}

fn default_day_end() -> u8 {
    defaults::DAY_END_HOUR
}

impl Default for DayNightBoundary {
    fn default() -> Self {
        Self {
            start_hour: defaults::DAY_START_HOUR,
            end_hour: defaults::DAY_END_HOUR,
        }
    }
}

impl DayNightBoundary {
    /// Whether the given hour falls inside the day interval.
    pub fn is_day(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            // Day interval spans midnight
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Closed-loop brightness correction parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoExposureConfig {
    /// Target mean brightness, 0-255
    pub target_brightness: f64,
    /// Acceptable deviation from the target
    pub tolerance: f64,
    /// Exposure floor (microseconds); every computed exposure is clamped here
    pub min_exposure_us: u32,
    /// Exposure ceiling (microseconds)
    pub max_exposure_us: u32,
    /// Fraction of the proportional step applied per attempt, (0, 1]
    pub damping: f64,
    /// Correction attempts per cycle before accepting a best-effort result
    pub max_attempts: u32,
    /// Applied-vs-requested exposure agreement threshold (microseconds)
    pub settle_tolerance_us: u32,
    /// Same-exposure re-requests while the camera settles
    pub settle_retries: u32,
    /// Accepted exposures retained for history-weighted starting points
    pub history_depth: usize,
    /// Weight of the history mean when blending the starting exposure
    pub history_blend: f64,
}

impl Default for AutoExposureConfig {
    fn default() -> Self {
        Self {
            target_brightness: defaults::TARGET_BRIGHTNESS,
            tolerance: defaults::BRIGHTNESS_TOLERANCE,
            min_exposure_us: defaults::MIN_EXPOSURE_US,
            max_exposure_us: defaults::MAX_EXPOSURE_US,
            damping: defaults::EXPOSURE_DAMPING,
            max_attempts: defaults::MAX_EXPOSURE_ATTEMPTS,
            settle_tolerance_us: defaults::EXPOSURE_SETTLE_TOLERANCE_US,
            settle_retries: defaults::EXPOSURE_SETTLE_RETRIES,
            history_depth: defaults::EXPOSURE_HISTORY_DEPTH,
            history_blend: defaults::HISTORY_BLEND_WEIGHT,
        }
    }
}

/// Illumination LED policy flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Master enable; when false the LED is never driven
    pub use_led: bool,
    /// Restrict illumination to night captures
    pub night_only: bool,
    /// GPIO output pin
    pub pin: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            use_led: true,
            night_only: true,
            pin: defaults::LED_PIN,
        }
    }
}

/// Capture loop timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds between cycles
    pub cadence_secs: u64,
    /// LED warm-up delay before the frame is taken (milliseconds)
    pub led_warmup_ms: u64,
    /// Enable the closed-loop controller; when false the schedule value is
    /// used directly
    pub auto_exposure: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cadence_secs: defaults::CAPTURE_CADENCE_SECS,
            led_warmup_ms: defaults::LED_WARMUP_MS,
            auto_exposure: true,
        }
    }
}

/// Temperature sampling cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    pub sample_interval_secs: u64,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: defaults::TEMPERATURE_INTERVAL_SECS,
        }
    }
}

/// Power rail monitoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// GPIO input pin; reads false on power failure
    pub input_pin: u8,
    /// Poll interval (milliseconds), short relative to the debounce window
    pub poll_interval_ms: u64,
    /// Seconds a failure must persist before the alert fires
    pub debounce_secs: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            input_pin: defaults::POWER_INPUT_PIN,
            poll_interval_ms: defaults::POWER_POLL_INTERVAL_MS,
            debounce_secs: defaults::POWER_DEBOUNCE_SECS,
        }
    }
}

/// Output layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for day folders
    pub data_dir: PathBuf,
    /// Date counted as "day1" for folder numbering. When unset, the date the
    /// process starts becomes day one.
    pub day_one: Option<NaiveDate>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            day_one: None,
        }
    }
}

// ============================================================================
// Root config
// ============================================================================

/// Root station configuration.
///
/// Load with `StationConfig::load()` which searches:
/// 1. `$STATION_CONFIG` env var
/// 2. `./station.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Time-of-day baseline exposure table, kept sorted by (hour, minute)
    pub schedule: Vec<ScheduleEntry>,

    /// Day/night boundary for LED policy
    pub day: DayNightBoundary,

    /// Closed-loop exposure controller tuning
    pub auto_exposure: AutoExposureConfig,

    /// LED policy flags
    pub led: LedConfig,

    /// Capture loop timing
    pub capture: CaptureConfig,

    /// Temperature sampling
    pub temperature: TemperatureConfig,

    /// Power failure monitoring
    pub power: PowerConfig,

    /// Output layout
    pub storage: StorageConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            day: DayNightBoundary::default(),
            auto_exposure: AutoExposureConfig::default(),
            led: LedConfig::default(),
            capture: CaptureConfig::default(),
            temperature: TemperatureConfig::default(),
            power: PowerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Baseline exposure table matching the original deployment: long exposures
/// overnight, short through midday.
fn default_schedule() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry { hour: 0, minute: 0, exposure_us: 500_000 },
        ScheduleEntry { hour: 6, minute: 0, exposure_us: 100_000 },
        ScheduleEntry { hour: 8, minute: 0, exposure_us: 20_000 },
        ScheduleEntry { hour: 17, minute: 0, exposure_us: 50_000 },
        ScheduleEntry { hour: 19, minute: 0, exposure_us: 300_000 },
        ScheduleEntry { hour: 22, minute: 0, exposure_us: 500_000 },
    ]
}

impl StationConfig {
    /// Load configuration using the standard search order, falling back to
    /// defaults when no file is found. Parse and validation failures on an
    /// explicitly-provided file are fatal.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("STATION_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                let config = Self::load_from_file(&p)?;
                info!(path = %p.display(), "Loaded station config from STATION_CONFIG");
                return Ok(config);
            }
            warn!(path = %path, "STATION_CONFIG points to non-existent file, falling back");
        }

        let local = PathBuf::from("station.toml");
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded station config from ./station.toml");
            return Ok(config);
        }

        info!("No station.toml found — using built-in defaults");
        Ok(Self::default())
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.schedule.sort_by_key(ScheduleEntry::minutes);
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the runtime relies on. Called once at load; the
    /// rest of the system treats these as preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.is_empty() {
            return Err(ConfigError::Invalid(
                "schedule table must contain at least one entry".into(),
            ));
        }
        for entry in &self.schedule {
            if entry.hour > 23 || entry.minute > 59 {
                return Err(ConfigError::Invalid(format!(
                    "schedule entry {:02}:{:02} is not a valid time of day",
                    entry.hour, entry.minute
                )));
            }
            if entry.exposure_us == 0 {
                return Err(ConfigError::Invalid(format!(
                    "schedule entry {:02}:{:02} has zero exposure",
                    entry.hour, entry.minute
                )));
            }
        }

        let ae = &self.auto_exposure;
        if ae.min_exposure_us > ae.max_exposure_us {
            return Err(ConfigError::Invalid(format!(
                "min_exposure_us ({}) exceeds max_exposure_us ({})",
                ae.min_exposure_us, ae.max_exposure_us
            )));
        }
        if !(0.0..=255.0).contains(&ae.target_brightness) {
            return Err(ConfigError::Invalid(format!(
                "target_brightness {} outside 0-255",
                ae.target_brightness
            )));
        }
        if ae.tolerance < 0.0 {
            return Err(ConfigError::Invalid("tolerance must be >= 0".into()));
        }
        if !(ae.damping > 0.0 && ae.damping <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "damping {} outside (0, 1]",
                ae.damping
            )));
        }
        if ae.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be >= 1".into()));
        }
        if ae.history_depth == 0 {
            return Err(ConfigError::Invalid("history_depth must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&ae.history_blend) {
            return Err(ConfigError::Invalid(format!(
                "history_blend {} outside 0-1",
                ae.history_blend
            )));
        }

        if self.day.start_hour > 23 || self.day.end_hour > 23 {
            return Err(ConfigError::Invalid(
                "day boundary hours must be 0-23".into(),
            ));
        }
        if self.capture.cadence_secs == 0 {
            return Err(ConfigError::Invalid("cadence_secs must be >= 1".into()));
        }
        if self.temperature.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sample_interval_secs must be >= 1".into(),
            ));
        }
        if self.power.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be >= 1".into()));
        }
        if self.power.debounce_secs == 0 {
            return Err(ConfigError::Invalid("debounce_secs must be >= 1".into()));
        }
        if self.power.poll_interval_ms >= self.power.debounce_secs * 1_000 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be short relative to the debounce window".into(),
            ));
        }

        Ok(())
    }
}
