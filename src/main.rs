//! Fieldstation daemon
//!
//! Unattended environmental recording: timed image capture with adaptive
//! exposure, 1 Hz temperature logging, and debounced power failure alerting.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults and simulated hardware
//! cargo run --release
//!
//! # Run against a specific configuration
//! cargo run --release -- --config /etc/fieldstation/station.toml
//! ```
//!
//! # Environment Variables
//!
//! - `STATION_CONFIG`: Path to the station TOML config
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use fieldstation::alert::LogAlert;
use fieldstation::capture::CaptureOrchestrator;
use fieldstation::config::StationConfig;
use fieldstation::exposure::ExposureSchedule;
use fieldstation::hardware::simulated::{SimCamera, SimGpio, SimSensorBus};
use fieldstation::power::PowerFailureMonitor;
use fieldstation::storage::DayRollingStore;
use fieldstation::telemetry::TemperatureSampler;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fieldstation")]
#[command(about = "Unattended environmental recording station")]
#[command(version)]
struct CliArgs {
    /// Path to the station TOML config (overrides the search order)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the output data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of simulated temperature sensors to attach (0-4)
    #[arg(long, default_value = "4")]
    sensors: usize,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    Capture,
    Temperature,
    PowerMonitor,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::Capture => write!(f, "Capture"),
            TaskName::Temperature => write!(f, "Temperature"),
            TaskName::PowerMonitor => write!(f, "PowerMonitor"),
        }
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Run the supervisor loop: monitor tasks, cancel everything on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the remaining loops observe the token and wind down.
    while task_set.join_next().await.is_some() {}

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Load and validate configuration — the only fatal error class.
    let mut config = match &args.config {
        Some(path) => StationConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StationConfig::load().context("Failed to load station configuration")?,
    };
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    info!("Fieldstation — environmental recording station");
    info!(
        "Capture every {}s | temperature every {}s | power debounce {}s",
        config.capture.cadence_secs,
        config.temperature.sample_interval_secs,
        config.power.debounce_secs
    );
    info!("Exposure schedule ({} entries):", config.schedule.len());
    for entry in &config.schedule {
        info!(
            "  {:02}:{:02} -> {} us",
            entry.hour, entry.minute, entry.exposure_us
        );
    }
    if config.led.use_led && config.led.night_only {
        info!(
            "LED restricted to night (day interval {:02}:00-{:02}:00)",
            config.day.start_hour, config.day.end_hour
        );
    }

    // Hardware backends. Camera/GPIO/1-Wire drivers are deployment
    // collaborators; the in-tree backends simulate them.
    let startup_exposure =
        ExposureSchedule::new(config.schedule.clone()).lookup(chrono::Local::now().time());
    let camera = SimCamera::new(150_000.0, startup_exposure).with_settle_frames(1);
    let gpio = Arc::new(SimGpio::new());
    let sensor_bus = SimSensorBus::new(args.sensors.min(fieldstation::SENSOR_SLOTS));
    let alerts = Arc::new(LogAlert);

    // Independent append-only sinks, one per data stream.
    let capture_sink = DayRollingStore::new(&config.storage);
    let temperature_sink = DayRollingStore::new(&config.storage);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: Capture orchestrator (sole owner of camera and LED)
    let orchestrator = CaptureOrchestrator::new(camera, Arc::clone(&gpio), capture_sink, &config);
    let capture_cancel = cancel_token.clone();
    task_set.spawn(async move {
        orchestrator.run(capture_cancel).await;
        Ok(TaskName::Capture)
    });

    // Task 2: Temperature sampler
    let sampler =
        TemperatureSampler::discover(sensor_bus, temperature_sink, config.temperature).await;
    let sampler_cancel = cancel_token.clone();
    task_set.spawn(async move {
        sampler.run(sampler_cancel).await;
        Ok(TaskName::Temperature)
    });

    // Task 3: Power failure monitor
    let monitor = PowerFailureMonitor::new(Arc::clone(&gpio), alerts, config.power);
    let monitor_cancel = cancel_token.clone();
    task_set.spawn(async move {
        monitor.run(monitor_cancel).await;
        Ok(TaskName::PowerMonitor)
    });

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("Fieldstation shutdown complete");
    Ok(())
}
