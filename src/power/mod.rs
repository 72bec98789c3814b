//! Power failure monitor
//!
//! Watches the power-sense digital input (0 = failure, 1 = normal), debounces
//! transitions, and raises an alert exactly once per confirmed outage
//! episode. A transient glitch shorter than the debounce window must never
//! alert — restoration cancels the pending timer.
//!
//! Each Suspect episode owns a `CancellationToken` held by the polling loop
//! and observed by a spawned debounce timer. The timer's `select!` makes
//! firing and cancellation mutually exclusive outcomes: the alert fires at
//! most once per episode, never zero-or-two.

use crate::alert::AlertSink;
use crate::config::PowerConfig;
use crate::hardware::Gpio;
use crate::types::PowerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// One armed debounce timer. The task resolves `true` when the alert fired,
/// `false` when cancellation won.
struct Episode {
    id: u64,
    token: CancellationToken,
    timer: JoinHandle<bool>,
}

pub struct PowerFailureMonitor<G: Gpio, A: AlertSink + 'static> {
    gpio: Arc<G>,
    alerts: Arc<A>,
    config: PowerConfig,
    state: PowerState,
    episodes_started: u64,
    episode: Option<Episode>,
}

impl<G: Gpio, A: AlertSink> PowerFailureMonitor<G, A> {
    pub fn new(gpio: Arc<G>, alerts: Arc<A>, config: PowerConfig) -> Self {
        Self {
            gpio,
            alerts,
            config,
            state: PowerState::Normal,
            episodes_started: 0,
            episode: None,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Poll loop; runs until the shutdown token cancels. Shutdown also
    /// cancels any pending episode timer so no alert fires after exit.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            pin = self.config.input_pin,
            poll_ms = self.config.poll_interval_ms,
            debounce_secs = self.config.debounce_secs,
            "Power failure monitor started"
        );

        let mut poll = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll.tick() => self.poll_once().await,
            }
        }

        if let Some(ep) = self.episode.take() {
            ep.token.cancel();
            ep.timer.abort();
        }
        info!("Power failure monitor stopped");
    }

    /// One input sample through the state machine.
    pub async fn poll_once(&mut self) {
        let normal = match self.gpio.read_input(self.config.input_pin) {
            Ok(level) => level,
            Err(e) => {
                warn!(error = %e, "Power input read failed — keeping previous state");
                return;
            }
        };

        match (self.state, normal) {
            // Fresh failure: arm a new episode. Restored behaves like Normal
            // here — a new failure after restoration gets its own full
            // debounce window.
            (PowerState::Normal | PowerState::Restored, false) => self.begin_episode(),

            // Restoration while the timer is pending (or just after it fired
            // and we have not observed it yet — the timer result decides).
            (PowerState::Suspect, true) => self.settle_episode(true).await,

            // Still down: has the debounce window elapsed?
            (PowerState::Suspect, false) => {
                if self.episode.as_ref().is_some_and(|e| e.timer.is_finished()) {
                    self.settle_episode(false).await;
                }
            }

            (PowerState::Alerting, true) => {
                info!("Power restored after alert");
                self.state = PowerState::Restored;
            }

            _ => {}
        }
    }

    fn begin_episode(&mut self) {
        self.episodes_started += 1;
        let id = self.episodes_started;
        warn!(
            episode = id,
            delay_secs = self.config.debounce_secs,
            "Power failure detected — waiting before alert"
        );

        let token = CancellationToken::new();
        let observed = token.clone();
        let alerts = Arc::clone(&self.alerts);
        let debounce = Duration::from_secs(self.config.debounce_secs);
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = observed.cancelled() => false,
                _ = tokio::time::sleep(debounce) => {
                    alerts.notify(id).await;
                    true
                }
            }
        });

        self.episode = Some(Episode { id, token, timer });
        self.state = PowerState::Suspect;
    }

    /// Close out the current episode. `restored` is what the input just
    /// read; whether the alert actually fired is decided solely by which
    /// branch won inside the timer task.
    async fn settle_episode(&mut self, restored: bool) {
        let Some(ep) = self.episode.take() else {
            return;
        };
        ep.token.cancel();
        let fired = match ep.timer.await {
            Ok(fired) => fired,
            Err(e) => {
                error!(episode = ep.id, error = %e, "Debounce timer task failed");
                false
            }
        };

        if fired {
            warn!(episode = ep.id, "Debounce window elapsed — outage confirmed");
            self.state = if restored {
                info!(episode = ep.id, "Power restored after alert");
                PowerState::Restored
            } else {
                PowerState::Alerting
            };
        } else {
            info!(
                episode = ep.id,
                "Power restored within debounce window — alert cancelled"
            );
            self.state = PowerState::Normal;
        }
    }
}
