//! Keep-alive monitor.
//!
//! Once a connection is Ready it pings the peer at a fixed interval. Any
//! inbound traffic counts as liveness (ping, pong, or data); after the
//! configured number of silent intervals the peer is declared dead and the
//! connection emits a keep-alive timeout followed by close. An interval of
//! zero or less disables the monitor entirely.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::IpcConfig;

/// Liveness bookkeeping for one connection.
///
/// The connection task calls [`record_inbound`](Self::record_inbound) on
/// every read and [`timed_out`](Self::timed_out) on every ping tick; the
/// struct itself never does I/O.
#[derive(Debug, Clone)]
pub struct KeepAlive {
    interval: Duration,
    silence_budget: Duration,
    last_inbound: Instant,
}

impl KeepAlive {
    /// Creates a monitor with the given ping interval and missed-interval
    /// budget. A limit of zero is treated as one.
    pub fn new(interval: Duration, missed_limit: u32, now: Instant) -> Self {
        let missed_limit = missed_limit.max(1);
        Self {
            interval,
            silence_budget: interval * missed_limit,
            last_inbound: now,
        }
    }

    /// Builds the monitor from a connection config; `None` when disabled.
    pub fn from_config(config: &IpcConfig, now: Instant) -> Option<Self> {
        config
            .keep_alive_interval()
            .map(|interval| Self::new(interval, config.keep_alive_missed_limit, now))
    }

    /// The ping interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Records inbound traffic of any kind.
    pub fn record_inbound(&mut self, now: Instant) {
        self.last_inbound = now;
    }

    /// True when the peer has been silent past the missed-interval budget.
    pub fn timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.last_inbound) >= self.silence_budget
    }
}
