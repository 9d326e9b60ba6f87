//! Fixed-interval pulse scheduler for Duet.
//!
//! The server runs one background task that periodically sweeps the
//! matchmaking queue (to tell long-waiting connections they are still in
//! line). This crate provides the timing half of that task: a pulse that
//! fires on a fixed timeline, skipping ahead instead of bunching up when
//! a sweep overruns its slot.
//!
//! # Disabled mode
//!
//! With a zero interval the pulse is disabled and [`Pulse::wait`] pends
//! forever. This is the correct behavior for deployments that don't want
//! queue feedback — the sweep task simply never wakes.
//!
//! # Integration
//!
//! The pulse is designed to sit inside the sweep task's loop:
//!
//! ```ignore
//! loop {
//!     pulse.wait().await;
//!     supervisor.lock().await.sweep_waiting();
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the pulse scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseConfig {
    /// Time between pulses. `Duration::ZERO` disables the pulse.
    pub interval: Duration,
}

impl PulseConfig {
    /// A pulse firing every `interval`.
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// A pulse that never fires.
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
        }
    }

    /// Returns `true` if the pulse will never fire.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }
}

impl Default for PulseConfig {
    /// Default: one pulse every 10 seconds.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Pulse
// ---------------------------------------------------------------------------

/// A fixed-timeline pulse.
///
/// Each pulse is scheduled `interval` after the previous *scheduled*
/// time, not after the previous wake-up — so the timeline doesn't drift
/// when the work between pulses takes a while. If the caller falls more
/// than one full interval behind, missed pulses are skipped and the
/// timeline resyncs from now.
#[derive(Debug)]
pub struct Pulse {
    config: PulseConfig,
    next: Option<TokioInstant>,
    count: u64,
}

impl Pulse {
    /// Creates a pulse from the given config.
    pub fn new(config: PulseConfig) -> Self {
        Self {
            config,
            next: None,
            count: 0,
        }
    }

    /// Waits until the next pulse and returns its number (1-based).
    ///
    /// Pends forever when the pulse is disabled.
    pub async fn wait(&mut self) -> u64 {
        let Some(interval) = (!self.config.is_disabled()).then_some(self.config.interval)
        else {
            return std::future::pending().await;
        };

        let target = match self.next {
            Some(next) => next,
            None => TokioInstant::now() + interval,
        };
        time::sleep_until(target).await;

        // Schedule the next pulse on the fixed timeline; resync if the
        // caller fell a whole interval behind.
        let now = TokioInstant::now();
        let mut next = target + interval;
        if now >= next {
            let skipped = ((now - target).as_nanos() / interval.as_nanos().max(1)) as u64;
            trace!(skipped, "pulse overran, resyncing timeline");
            next = now + interval;
        }
        self.next = Some(next);

        self.count += 1;
        self.count
    }

    /// The number of pulses fired so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Returns `true` if this pulse will never fire.
    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }
}
