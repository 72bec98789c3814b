//! 1 Hz temperature sampling loop

use crate::config::TemperatureConfig;
use crate::hardware::SensorBus;
use crate::storage::TemperatureSink;
use crate::types::{TemperatureReading, SENSOR_SLOTS};
use chrono::Local;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct TemperatureSampler<B: SensorBus, S: TemperatureSink> {
    bus: B,
    sink: S,
    interval: Duration,
    slots: [Option<B::Handle>; SENSOR_SLOTS],
}

impl<B: SensorBus, S: TemperatureSink> TemperatureSampler<B, S> {
    /// Discover sensors once and pin them to slots for the process lifetime.
    /// Extra sensors beyond the slot count are ignored; missing ones leave
    /// their slot permanently absent.
    pub async fn discover(bus: B, sink: S, config: TemperatureConfig) -> Self {
        let mut found = bus.discover().await;
        found.truncate(SENSOR_SLOTS);
        info!(sensors = found.len(), slots = SENSOR_SLOTS, "Temperature sensors discovered");

        let mut slots: [Option<B::Handle>; SENSOR_SLOTS] = Default::default();
        for (slot, handle) in found.into_iter().enumerate() {
            slots[slot] = Some(handle);
        }

        Self {
            bus,
            sink,
            interval: Duration::from_secs(config.sample_interval_secs),
            slots,
        }
    }

    /// Sampling loop; one fixed-width record per tick until shutdown.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Temperature sampler started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.sample_once().await,
            }
        }
        info!("Temperature sampler stopped");
    }

    /// Read every populated slot and emit one record. A failed read logs the
    /// slot absent this tick and never halts the remaining slots.
    pub async fn sample_once(&mut self) {
        let mut celsius = [None; SENSOR_SLOTS];
        for (slot, handle) in self.slots.iter().enumerate() {
            let Some(handle) = handle else { continue };
            match self.bus.read(handle).await {
                Ok(temp) => celsius[slot] = Some(temp),
                Err(e) => {
                    warn!(slot, error = %e, "Sensor read failed — logging slot as absent");
                }
            }
        }

        let reading = TemperatureReading {
            timestamp: Local::now(),
            celsius,
        };
        debug!(present = reading.present_count(), "Temperature record");
        if let Err(e) = self.sink.log_reading(&reading) {
            warn!(error = %e, "Failed to write temperature record");
        }
    }
}
