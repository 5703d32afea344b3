use std::collections::VecDeque;
use std::time::Duration;

use crate::outcome::OutcomeKind;
use crate::registry::IssuanceStamp;
use crate::request::Method;

/// Default number of breadcrumbs retained per coordinator.
pub const DEFAULT_BREADCRUMB_CAPACITY: usize = 100;

/// One request/response pair, recorded when the request settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub id: String,
    pub stamp: IssuanceStamp,
    pub method: Method,
    pub url: String,
    /// Serialized payload, when the method carried one.
    pub request_body: Option<String>,
    /// HTTP status, when a response arrived at all.
    pub status: Option<u16>,
    pub outcome: OutcomeKind,
    pub elapsed: Duration,
}

/// Bounded trail of recent requests; the oldest entry is dropped first.
#[derive(Debug)]
pub struct Breadcrumbs {
    capacity: usize,
    entries: VecDeque<Breadcrumb>,
}

impl Default for Breadcrumbs {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BREADCRUMB_CAPACITY)
    }
}

impl Breadcrumbs {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, crumb: Breadcrumb) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(crumb);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<Breadcrumb> {
        self.entries.iter().cloned().collect()
    }

    pub fn drain(&mut self) -> Vec<Breadcrumb> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Breadcrumb, Breadcrumbs};
    use crate::outcome::OutcomeKind;
    use crate::registry::IssuanceStamp;
    use crate::request::Method;
    use std::time::Duration;

    fn crumb(n: u64) -> Breadcrumb {
        Breadcrumb {
            id: "a".to_string(),
            stamp: IssuanceStamp(n),
            method: Method::Get,
            url: "/x".to_string(),
            request_body: None,
            status: Some(200),
            outcome: OutcomeKind::Success,
            elapsed: Duration::from_millis(n),
        }
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut trail = Breadcrumbs::with_capacity(2);
        trail.record(crumb(1));
        trail.record(crumb(2));
        trail.record(crumb(3));

        let stamps: Vec<_> = trail.entries().iter().map(|c| c.stamp.0).collect();
        assert_eq!(stamps, vec![2, 3]);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut trail = Breadcrumbs::with_capacity(0);
        trail.record(crumb(1));
        assert!(trail.is_empty());
    }

    #[test]
    fn drain_clears_trail() {
        let mut trail = Breadcrumbs::default();
        trail.record(crumb(1));
        assert_eq!(trail.drain().len(), 1);
        assert!(trail.is_empty());
        assert_eq!(trail.capacity(), 100);
    }
}
