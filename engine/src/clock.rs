//! Id allocation from the wall clock.
//!
//! Record ids are creation instants in milliseconds since the Unix epoch. Two
//! records created within the same millisecond would collide, so the clock
//! remembers the last id it handed out and never goes backwards.

use crate::{RecordId, Timestamp};

/// A monotonic id source.
///
/// Ordering rules:
/// 1. An id is at least the current timestamp
/// 2. An id is strictly greater than every id issued before it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdClock {
    /// Last id handed out, 0 before the first allocation
    last: u64,
}

impl IdClock {
    /// Create a clock that has not issued any id yet.
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Allocate the next id for a record created at `now` (epoch millis).
    pub fn next_id(&mut self, now: Timestamp) -> RecordId {
        self.last = now.max(self.last.saturating_add(1));
        RecordId::new(self.last)
    }

    /// Make sure future ids are issued after `seen`.
    ///
    /// Used when ids already exist on disk and the device clock may have
    /// been set back since they were written.
    pub fn observe(&mut self, seen: RecordId) {
        self.last = self.last.max(seen.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_follows_the_timestamp() {
        let mut clock = IdClock::new();
        assert_eq!(clock.next_id(1_700_000_000_000).get(), 1_700_000_000_000);
        assert_eq!(clock.next_id(1_700_000_000_500).get(), 1_700_000_000_500);
    }

    #[test]
    fn same_millisecond_is_bumped() {
        let mut clock = IdClock::new();
        let a = clock.next_id(5000);
        let b = clock.next_id(5000);
        let c = clock.next_id(5000);
        assert!(a < b && b < c);
        assert_eq!(c.get(), 5002);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut clock = IdClock::new();
        clock.observe(RecordId::new(9000));
        let id = clock.next_id(1000);
        assert_eq!(id.get(), 9001);
    }

    #[test]
    fn observe_keeps_the_maximum() {
        let mut clock = IdClock::new();
        clock.observe(RecordId::new(300));
        clock.observe(RecordId::new(100));
        assert_eq!(clock.next_id(0).get(), 301);
    }
}
