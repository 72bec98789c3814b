//! Power failure monitor tests
//!
//! All tests run under paused time: `tokio::time::sleep` in the test body
//! advances the clock to the next pending timer, so the 60-second debounce
//! window elapses instantly and deterministically.

use fieldstation::alert::CountingAlert;
use fieldstation::config::PowerConfig;
use fieldstation::hardware::simulated::SimGpio;
use fieldstation::power::PowerFailureMonitor;
use fieldstation::types::PowerState;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PIN: u8 = 12;

fn config() -> PowerConfig {
    PowerConfig {
        input_pin: PIN,
        poll_interval_ms: 250,
        debounce_secs: 60,
    }
}

fn monitor() -> (
    Arc<SimGpio>,
    Arc<CountingAlert>,
    PowerFailureMonitor<SimGpio, CountingAlert>,
) {
    let gpio = Arc::new(SimGpio::new());
    let alerts = Arc::new(CountingAlert::default());
    let m = PowerFailureMonitor::new(Arc::clone(&gpio), Arc::clone(&alerts), config());
    (gpio, alerts, m)
}

#[tokio::test(start_paused = true)]
async fn short_glitch_never_alerts() {
    let (gpio, alerts, mut monitor) = monitor();

    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Suspect);

    // Power comes back half-way through the window
    tokio::time::sleep(Duration::from_secs(30)).await;
    gpio.set_input_level(PIN, true);
    monitor.poll_once().await;

    assert_eq!(monitor.state(), PowerState::Normal);
    assert_eq!(alerts.count(), 0);

    // The cancelled timer must never fire later either
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(alerts.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn sustained_outage_alerts_exactly_once_after_window() {
    let (gpio, alerts, mut monitor) = monitor();

    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;

    // One second before the window elapses: no alert yet
    tokio::time::sleep(Duration::from_secs(59)).await;
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Suspect);
    assert_eq!(alerts.count(), 0);

    // Cross the window
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(alerts.count(), 1);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Alerting);

    // Outage continues: never a second alert for the same episode
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(60)).await;
        monitor.poll_once().await;
    }
    assert_eq!(alerts.count(), 1);

    gpio.set_input_level(PIN, true);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Restored);
    assert_eq!(alerts.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn restoration_near_deadline_then_new_outage_gets_full_window() {
    let (gpio, alerts, mut monitor) = monitor();

    // First episode: restored one second before the deadline
    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;
    tokio::time::sleep(Duration::from_secs(59)).await;
    gpio.set_input_level(PIN, true);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Normal);
    assert_eq!(alerts.count(), 0);

    // Second episode starts its own 60-second window from scratch
    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Suspect);

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(alerts.count(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Alerting);
    assert_eq!(alerts.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn outage_after_restoration_is_an_independent_episode() {
    let (gpio, alerts, mut monitor) = monitor();

    // Confirmed outage, then restoration
    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Alerting);
    gpio.set_input_level(PIN, true);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Restored);
    assert_eq!(alerts.count(), 1);

    // Second failure: full debounce again, second alert only after it
    gpio.set_input_level(PIN, false);
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Suspect);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(alerts.count(), 1);
    tokio::time::sleep(Duration::from_secs(31)).await;
    monitor.poll_once().await;
    assert_eq!(monitor.state(), PowerState::Alerting);
    assert_eq!(alerts.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_with_pending_episode_never_alerts() {
    let gpio = Arc::new(SimGpio::new());
    let alerts = Arc::new(CountingAlert::default());
    let monitor = PowerFailureMonitor::new(Arc::clone(&gpio), Arc::clone(&alerts), config());

    gpio.set_input_level(PIN, false);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(monitor.run(cancel.clone()));

    // Let the loop observe the failure and arm the timer, then shut down
    tokio::time::sleep(Duration::from_secs(10)).await;
    cancel.cancel();
    handle.await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(alerts.count(), 0);
}
