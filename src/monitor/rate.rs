//! Throughput derivation from cumulative counters.

use serde::Serialize;
use std::time::Duration;

/// Cumulative byte counters for one interface or device at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Interface or device the counters belong to.
    pub identity: String,
    /// Bytes received (network) or read (disk).
    pub inbound: u64,
    /// Bytes transmitted (network) or written (disk).
    pub outbound: u64,
}

impl CounterSnapshot {
    pub fn new(identity: impl Into<String>, inbound: u64, outbound: u64) -> Self {
        Self {
            identity: identity.into(),
            inbound,
            outbound,
        }
    }
}

/// Bytes per second in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Throughput {
    pub inbound: f64,
    pub outbound: f64,
}

/// Keeps the previous snapshot and turns consecutive ones into rates.
#[derive(Debug, Clone)]
pub struct RateDeriver {
    interval: Duration,
    previous: Option<CounterSnapshot>,
}

impl RateDeriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            previous: None,
        }
    }

    /// Derive this tick's rate and replace the stored snapshot.
    ///
    /// The rate is zero when there is no previous snapshot or when the
    /// identity changed. Counter resets clamp to zero.
    pub fn derive(&mut self, current: Option<CounterSnapshot>) -> Throughput {
        let rate = match (&self.previous, &current) {
            (Some(prev), Some(curr)) if prev.identity == curr.identity => Throughput {
                inbound: per_second(prev.inbound, curr.inbound, self.interval),
                outbound: per_second(prev.outbound, curr.outbound, self.interval),
            },
            (Some(prev), Some(curr)) => {
                tracing::debug!(
                    from = %prev.identity,
                    to = %curr.identity,
                    "counter identity changed, resetting rate"
                );
                Throughput::default()
            }
            _ => Throughput::default(),
        };
        self.previous = current;
        rate
    }
}

fn per_second(previous: u64, current: u64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / secs
}
