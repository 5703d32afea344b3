use std::collections::BTreeMap;
use std::fmt;

/// Marker recorded for every issued request.
///
/// Stamps are strictly increasing within one registry, so two requests issued
/// back to back never compare equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssuanceStamp(pub u64);

impl fmt::Display for IssuanceStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Latest issuance stamp per logical identifier.
///
/// Entries are overwritten on every issue and never removed; the key set is
/// bounded by the identifiers the application uses.
#[derive(Debug)]
pub struct IssuanceRegistry {
    next_stamp: u64,
    latest: BTreeMap<String, IssuanceStamp>,
}

impl Default for IssuanceRegistry {
    fn default() -> Self {
        Self {
            next_stamp: 1,
            latest: BTreeMap::new(),
        }
    }
}

impl IssuanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new request for `id`, making every earlier one stale.
    pub fn issue(&mut self, id: &str) -> IssuanceStamp {
        let stamp = IssuanceStamp(self.next_stamp);
        self.next_stamp += 1;
        match self.latest.get_mut(id) {
            Some(slot) => *slot = stamp,
            None => {
                self.latest.insert(id.to_string(), stamp);
            }
        }
        stamp
    }

    pub fn latest(&self, id: &str) -> Option<IssuanceStamp> {
        self.latest.get(id).copied()
    }

    /// Whether `stamp` is still the most recent issuance for `id`.
    pub fn is_current(&self, id: &str, stamp: IssuanceStamp) -> bool {
        self.latest(id) == Some(stamp)
    }

    /// Number of distinct identifiers seen so far.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
