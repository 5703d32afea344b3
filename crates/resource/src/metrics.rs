use std::collections::BTreeMap;
use std::time::Duration;

use crate::outcome::OutcomeKind;

pub const REQUESTS_ISSUED: &str = "requests.issued";

/// Deterministic request accounting for one coordinator.
///
/// Counters live in a sorted map so snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestMetrics {
    counters: BTreeMap<String, u64>,
    latency_ms: Histogram,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub latency_ms: Histogram,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn outcomes(&self, kind: OutcomeKind) -> u64 {
        self.counter(&outcome_counter(kind))
    }
}

/// Counter name for settled requests of `kind`, e.g. `outcome.superseded`.
pub fn outcome_counter(kind: OutcomeKind) -> String {
    format!("outcome.{}", kind.as_str())
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn record_issued(&mut self) {
        self.inc_counter(REQUESTS_ISSUED, 1);
    }

    pub fn record_settled(&mut self, kind: OutcomeKind, elapsed: Duration) {
        self.inc_counter(outcome_counter(kind), 1);
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.record(ms);
    }

    /// Issued requests that have not settled yet.
    pub fn in_flight(&self) -> u64 {
        self.counter(REQUESTS_ISSUED).saturating_sub(self.latency_ms.count)
    }

    fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    /// Returns a stable, sorted snapshot suitable for logs.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            latency_ms: self.latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Histogram, RequestMetrics};
    use crate::outcome::OutcomeKind;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn histogram_tracks_min_max_sum_count() {
        let mut h = Histogram::default();
        h.record(5);
        h.record(2);
        h.record(7);
        assert_eq!(h.count, 3);
        assert_eq!(h.sum, 14);
        assert_eq!(h.min, 2);
        assert_eq!(h.max, 7);
    }

    #[test]
    fn settled_requests_leave_flight() {
        let mut m = RequestMetrics::new();
        m.record_issued();
        m.record_issued();
        assert_eq!(m.in_flight(), 2);

        m.record_settled(OutcomeKind::Superseded, Duration::from_millis(12));
        assert_eq!(m.in_flight(), 1);
        assert_eq!(m.counter("outcome.superseded"), 1);
        assert_eq!(m.counter("outcome.success"), 0);
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut m = RequestMetrics::new();
        m.record_issued();
        m.record_settled(OutcomeKind::TransportError, Duration::from_millis(3));
        m.record_settled(OutcomeKind::Success, Duration::from_millis(9));

        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![
                ("outcome.success".to_string(), 1),
                ("outcome.transport_error".to_string(), 1),
                ("requests.issued".to_string(), 1),
            ]
        );
        assert_eq!(snap.outcomes(OutcomeKind::Success), 1);
        assert_eq!(snap.latency_ms.min, 3);
        assert_eq!(snap.latency_ms.max, 9);
    }
}
