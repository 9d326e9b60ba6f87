//! Integration tests for the pulse scheduler.
//!
//! All tests run with `start_paused = true` — tokio's test clock
//! auto-advances whenever every task is idle, so `sleep_until` resolves
//! instantly and deterministically.

use std::time::Duration;

use duet_pulse::{Pulse, PulseConfig};
use tokio::time::{Instant, timeout};

#[tokio::test(start_paused = true)]
async fn test_pulse_fires_and_counts() {
    let mut pulse = Pulse::new(PulseConfig::every(Duration::from_secs(10)));

    assert_eq!(pulse.wait().await, 1);
    assert_eq!(pulse.wait().await, 2);
    assert_eq!(pulse.wait().await, 3);
    assert_eq!(pulse.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pulse_respects_interval() {
    let mut pulse = Pulse::new(PulseConfig::every(Duration::from_secs(10)));
    let start = Instant::now();

    pulse.wait().await;
    assert_eq!(start.elapsed(), Duration::from_secs(10));

    pulse.wait().await;
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_pulse_timeline_does_not_drift_with_slow_work() {
    let mut pulse = Pulse::new(PulseConfig::every(Duration::from_secs(10)));
    let start = Instant::now();

    pulse.wait().await; // t = 10s

    // Simulate 4 seconds of sweep work. The next pulse still fires at
    // t = 20s, not t = 24s.
    tokio::time::sleep(Duration::from_secs(4)).await;
    pulse.wait().await;
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_pulse_resyncs_after_long_overrun() {
    let mut pulse = Pulse::new(PulseConfig::every(Duration::from_secs(10)));

    pulse.wait().await; // t = 10s

    // Fall three intervals behind. The overdue pulse fires immediately,
    // then the timeline resyncs — the intermediate missed pulses are
    // skipped, never replayed back-to-back.
    tokio::time::sleep(Duration::from_secs(35)).await; // t = 45s
    let start = Instant::now();
    pulse.wait().await;
    assert_eq!(start.elapsed(), Duration::ZERO, "overdue pulse fires now");

    pulse.wait().await;
    assert_eq!(start.elapsed(), Duration::from_secs(10), "resynced from now");
    assert_eq!(pulse.count(), 3, "missed pulses are not replayed");
}

#[tokio::test(start_paused = true)]
async fn test_disabled_pulse_never_fires() {
    let mut pulse = Pulse::new(PulseConfig::disabled());

    let result = timeout(Duration::from_secs(3600), pulse.wait()).await;

    assert!(result.is_err(), "disabled pulse must pend forever");
    assert_eq!(pulse.count(), 0);
}
