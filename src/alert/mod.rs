//! Outage alert collaborator
//!
//! The power failure monitor decides *when* to alert; delivery (SMS, voice,
//! whatever the deployment wires up) lives behind this trait. `notify` is
//! fire-and-forget and is invoked at most once per confirmed outage episode;
//! a delivery failure is the implementation's to log and never reopens the
//! episode.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, episode_id: u64);
}

/// Log-only backend: the confirmed outage lands in the journal, where the
/// deployment's log shipper picks it up.
#[derive(Debug, Default)]
pub struct LogAlert;

#[async_trait]
impl AlertSink for LogAlert {
    async fn notify(&self, episode_id: u64) {
        warn!(episode = episode_id, "POWER FAILURE CONFIRMED — alert raised");
    }
}

/// Counting backend for tests: records how many alerts fired.
#[derive(Debug, Default)]
pub struct CountingAlert {
    fired: AtomicUsize,
}

#[async_trait]
impl AlertSink for CountingAlert {
    async fn notify(&self, _episode_id: u64) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingAlert {
    pub fn count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}
