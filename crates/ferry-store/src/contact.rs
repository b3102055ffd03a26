//! Recent-contact tracking
//!
//! After two nodes reconcile their stores, running the whole exchange
//! again a beacon later would move nothing. The tracker remembers when
//! each neighbor was last seen and suppresses re-initiation inside a
//! configurable window.

use std::collections::HashMap;
use std::time::Duration;

use ferry_core::{NodeAddress, Timestamp};

/// Per-node memory of recently seen neighbors.
#[derive(Debug)]
pub struct ContactTracker {
    recent_period: Duration,
    last_seen: HashMap<NodeAddress, Timestamp>,
}

impl ContactTracker {
    /// Create a tracker with the given suppression window.
    pub fn new(recent_period: Duration) -> Self {
        Self {
            recent_period,
            last_seen: HashMap::new(),
        }
    }

    /// Query-and-record: was this neighbor seen inside the window?
    ///
    /// A neighbor never seen before is recorded at `now` and reported
    /// not-recent, so the first beacon from a new neighbor always opens
    /// a session. A neighbor seen outside the window has its record
    /// refreshed to `now` and is likewise reported not-recent. The
    /// window is half-open: at exactly `last + recent_period` the
    /// neighbor is stale again.
    pub fn was_recently_contacted(&mut self, neighbor: NodeAddress, now: Timestamp) -> bool {
        match self.last_seen.get_mut(&neighbor) {
            Some(seen) if now.saturating_since(*seen) < self.recent_period => true,
            Some(seen) => {
                *seen = now;
                false
            }
            None => {
                self.last_seen.insert(neighbor, now);
                false
            }
        }
    }

    /// Number of neighbors ever recorded.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether no neighbor has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Forget neighbors whose record fell outside the window.
    ///
    /// Optional housekeeping; correctness does not depend on it because
    /// stale records are refreshed on query.
    pub fn evict_stale(&mut self, now: Timestamp) {
        self.last_seen
            .retain(|_, seen| now.saturating_since(*seen) < self.recent_period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contact_is_not_recent() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        assert!(!tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::ZERO));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_contact_within_window_is_recent() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::ZERO);

        assert!(tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(9)));
        assert!(tracker.was_recently_contacted(
            NodeAddress::new(5),
            Timestamp::from_nanos(9_999_999_999)
        ));
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::ZERO);

        // At exactly last + recent_period the neighbor is stale and the
        // record refreshes.
        assert!(!tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(10)));
        assert!(tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(19)));
    }

    #[test]
    fn test_recent_query_does_not_refresh() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::ZERO);

        // Seen again at t=9 inside the window; the record stays anchored
        // at t=0, so by t=11 the neighbor is stale again.
        assert!(tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(9)));
        assert!(!tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(11)));
    }

    #[test]
    fn test_stale_contact_refreshes() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::ZERO);

        assert!(!tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(20)));
        // Refreshed at t=20, so t=25 is inside the window again.
        assert!(tracker.was_recently_contacted(NodeAddress::new(5), Timestamp::from_secs(25)));
    }

    #[test]
    fn test_neighbors_tracked_independently() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(1), Timestamp::ZERO);

        assert!(!tracker.was_recently_contacted(NodeAddress::new(2), Timestamp::from_secs(1)));
        assert!(tracker.was_recently_contacted(NodeAddress::new(1), Timestamp::from_secs(1)));
    }

    #[test]
    fn test_evict_stale() {
        let mut tracker = ContactTracker::new(Duration::from_secs(10));
        tracker.was_recently_contacted(NodeAddress::new(1), Timestamp::ZERO);
        tracker.was_recently_contacted(NodeAddress::new(2), Timestamp::from_secs(15));

        tracker.evict_stale(Timestamp::from_secs(20));

        assert_eq!(tracker.len(), 1);
    }
}
