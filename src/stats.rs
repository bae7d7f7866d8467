use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A consistent copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub transmitted: u64,
    pub received: u64,
    pub dropped: u64,
    /// `None` until the first reply arrives.
    pub min_rtt: Option<Duration>,
    pub max_rtt: Option<Duration>,
    pub sum_rtt: Duration,
}

impl StatsSnapshot {
    pub fn avg_rtt(&self) -> Option<Duration> {
        if self.received == 0 {
            return None;
        }
        let avg = self.sum_rtt.as_nanos() / u128::from(self.received);
        Some(Duration::from_nanos(avg as u64))
    }

    /// Dropped probes as a whole percentage of those transmitted, truncated.
    pub fn loss_percent(&self) -> u64 {
        if self.transmitted == 0 {
            return 0;
        }
        self.dropped * 100 / self.transmitted
    }

    /// Probes sent whose outcome is not yet known.
    pub fn in_flight(&self) -> u64 {
        self.transmitted
            .saturating_sub(self.received)
            .saturating_sub(self.dropped)
    }
}

/// Counters shared between the echo session (writer) and the interrupt path (reader).
#[derive(Debug, Default)]
pub struct StatsAggregate {
    inner: Mutex<StatsSnapshot>,
}

impl StatsAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        self.update(|stats| stats.transmitted += 1);
    }

    pub fn record_answered(&self, rtt: Duration) {
        self.update(|stats| {
            stats.received += 1;
            stats.sum_rtt += rtt;
            stats.min_rtt = Some(stats.min_rtt.map_or(rtt, |min| min.min(rtt)));
            stats.max_rtt = Some(stats.max_rtt.map_or(rtt, |max| max.max(rtt)));
        });
    }

    pub fn record_dropped(&self) {
        self.update(|stats| stats.dropped += 1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut StatsSnapshot)) {
        // The counters stay valid even if a holder panicked.
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }
}
