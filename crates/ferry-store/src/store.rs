//! Bounded, expiring packet store
//!
//! One store per node. It holds every data packet the node has accepted
//! but not yet shed, keyed by global packet ID, and is the sole source
//! of the summary vectors the node advertises. Two pressures shrink it:
//! a capacity bound enforced after every enqueue (evicting whichever
//! entry would expire first) and an age sweep run before every
//! summary-vector build, so a node never advertises a packet it would
//! refuse to hand over.

use std::collections::BTreeMap;

use tracing::debug;

use ferry_core::Timestamp;
use ferry_wire::{GlobalPacketId, SummaryVector};

use crate::entry::QueueEntry;

/// Why an entry left the store without being forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The entry outlived its network-wide expiry.
    Expired,
    /// The store was over capacity and this entry had the earliest
    /// expiry.
    CapacityEvicted,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Expired => write!(f, "expired"),
            DropReason::CapacityEvicted => write!(f, "capacity evicted"),
        }
    }
}

/// The per-node buffer of packets awaiting opportunistic transfer.
#[derive(Debug)]
pub struct PacketStore {
    entries: BTreeMap<GlobalPacketId, QueueEntry>,
    max_len: usize,
    dropped_expired: u64,
    dropped_capacity: u64,
}

impl PacketStore {
    /// Create a store bounded at `max_len` entries.
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_len,
            dropped_expired: 0,
            dropped_capacity: 0,
        }
    }

    /// Number of buffered packets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a packet with this ID is buffered.
    pub fn contains(&self, id: GlobalPacketId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Look up a buffered packet by ID.
    pub fn find(&self, id: GlobalPacketId) -> Option<&QueueEntry> {
        self.entries.get(&id)
    }

    /// Buffer a packet, then enforce the capacity bound.
    ///
    /// Re-enqueueing an ID already present replaces the old entry in
    /// place; the store never holds two copies of one packet. When the
    /// bound is exceeded, expired entries go first, then whichever live
    /// entry would expire earliest.
    pub fn enqueue(&mut self, entry: QueueEntry, now: Timestamp) {
        self.entries.insert(entry.id(), entry);

        if self.entries.len() > self.max_len {
            self.purge_expired(now);
        }
        while self.entries.len() > self.max_len {
            // min_by_key breaks ties toward the first (lowest) ID, which
            // keeps eviction deterministic.
            let Some(victim) = self
                .entries
                .values()
                .min_by_key(|e| e.expire_at())
                .map(QueueEntry::id)
            else {
                break;
            };
            self.drop_entry(victim, DropReason::CapacityEvicted);
        }
    }

    /// Remove and return the packet with the lowest ID.
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        self.entries.pop_first().map(|(_, entry)| entry)
    }

    /// Remove a packet by ID.
    pub fn remove(&mut self, id: GlobalPacketId) -> Option<QueueEntry> {
        self.entries.remove(&id)
    }

    /// Sweep out every entry whose expiry has passed.
    pub fn purge_expired(&mut self, now: Timestamp) {
        let stale: Vec<GlobalPacketId> = self
            .entries
            .values()
            .filter(|e| e.is_expired(now))
            .map(QueueEntry::id)
            .collect();
        for id in stale {
            self.drop_entry(id, DropReason::Expired);
        }
    }

    /// Build the summary vector of currently held packets.
    ///
    /// Runs the age sweep first so the vector never advertises a packet
    /// that would be refused at transfer time.
    pub fn summary_vector(&mut self, now: Timestamp) -> SummaryVector {
        self.purge_expired(now);
        self.entries.keys().copied().collect()
    }

    /// The buffered entries a remote peer does not hold, in ID order.
    pub fn find_disjoint(&self, remote: &SummaryVector) -> Vec<&QueueEntry> {
        // Capacity hint only; the true size is anywhere from zero up.
        let mut missing = Vec::with_capacity(self.entries.len().min(remote.len()));
        missing.extend(
            self.entries
                .values()
                .filter(|e| !remote.contains(e.id())),
        );
        missing
    }

    /// Entries dropped by the age sweep since creation.
    pub fn dropped_expired(&self) -> u64 {
        self.dropped_expired
    }

    /// Entries evicted by the capacity bound since creation.
    pub fn dropped_capacity(&self) -> u64 {
        self.dropped_capacity
    }

    fn drop_entry(&mut self, id: GlobalPacketId, reason: DropReason) {
        if let Some(entry) = self.entries.remove(&id) {
            match reason {
                DropReason::Expired => self.dropped_expired += 1,
                DropReason::CapacityEvicted => self.dropped_capacity += 1,
            }
            debug!(
                packet = %id,
                expire_at = %entry.expire_at(),
                reason = %reason,
                "dropping buffered packet"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ferry_core::{ErrorHandle, ForwardHandle, NodeAddress, PacketHeader};
    use ferry_wire::DataHeader;

    fn entry(counter: u16, expire_secs: u64) -> QueueEntry {
        QueueEntry::new(
            Bytes::from_static(b"payload"),
            PacketHeader::new(NodeAddress::new(1), NodeAddress::new(2), 64),
            DataHeader::new(
                GlobalPacketId::from_parts(1, counter),
                64,
                Timestamp::ZERO,
            ),
            ForwardHandle::noop(),
            ErrorHandle::noop(),
            Timestamp::from_secs(expire_secs),
        )
    }

    fn ids(store: &PacketStore) -> Vec<u16> {
        store
            .entries
            .keys()
            .map(|id| id.counter_part())
            .collect()
    }

    #[test]
    fn test_enqueue_and_find() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 10), Timestamp::ZERO);

        assert_eq!(store.len(), 1);
        assert!(store.contains(GlobalPacketId::from_parts(1, 1)));
        let found = store.find(GlobalPacketId::from_parts(1, 1)).unwrap();
        assert_eq!(found.expire_at(), Timestamp::from_secs(10));
    }

    #[test]
    fn test_reenqueue_replaces_in_place() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 10), Timestamp::ZERO);
        store.enqueue(entry(1, 30), Timestamp::ZERO);

        assert_eq!(store.len(), 1);
        let found = store.find(GlobalPacketId::from_parts(1, 1)).unwrap();
        assert_eq!(found.expire_at(), Timestamp::from_secs(30));
    }

    #[test]
    fn test_capacity_evicts_earliest_expiry() {
        let mut store = PacketStore::new(3);
        let now = Timestamp::ZERO;
        store.enqueue(entry(1, 5), now);
        store.enqueue(entry(2, 7), now);
        store.enqueue(entry(3, 9), now);
        store.enqueue(entry(4, 20), now);

        // The entry expiring at t=5 is shed; the newcomer stays.
        assert_eq!(ids(&store), vec![2, 3, 4]);
        assert_eq!(store.dropped_capacity(), 1);
    }

    #[test]
    fn test_capacity_purge_prefers_expired_entries() {
        let mut store = PacketStore::new(3);
        let now = Timestamp::from_secs(8);
        store.enqueue(entry(1, 5), now);
        store.enqueue(entry(2, 7), now);
        store.enqueue(entry(3, 9), now);
        store.enqueue(entry(4, 20), now);

        // Both already-expired entries go in one sweep before any live
        // entry is considered for eviction.
        assert_eq!(ids(&store), vec![3, 4]);
        assert_eq!(store.dropped_expired(), 2);
        assert_eq!(store.dropped_capacity(), 0);
    }

    #[test]
    fn test_age_purge() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 5), Timestamp::ZERO);
        store.enqueue(entry(2, 50), Timestamp::ZERO);

        store.purge_expired(Timestamp::from_secs(10));

        assert_eq!(ids(&store), vec![2]);
        assert_eq!(store.dropped_expired(), 1);
    }

    #[test]
    fn test_entry_alive_exactly_at_expiry() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 5), Timestamp::ZERO);

        store.purge_expired(Timestamp::from_secs(5));
        assert_eq!(store.len(), 1);

        store.purge_expired(Timestamp::from_nanos(5_000_000_001));
        assert!(store.is_empty());
    }

    #[test]
    fn test_summary_vector_purges_first() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 5), Timestamp::ZERO);
        store.enqueue(entry(2, 50), Timestamp::ZERO);

        let vector = store.summary_vector(Timestamp::from_secs(10));

        assert_eq!(vector.len(), 1);
        assert!(vector.contains(GlobalPacketId::from_parts(1, 2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_disjoint() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 10), Timestamp::ZERO);
        store.enqueue(entry(2, 10), Timestamp::ZERO);
        store.enqueue(entry(3, 10), Timestamp::ZERO);

        let remote: SummaryVector = [GlobalPacketId::from_parts(1, 2)].into_iter().collect();
        let missing = store.find_disjoint(&remote);

        let missing_ids: Vec<u16> = missing.iter().map(|e| e.id().counter_part()).collect();
        assert_eq!(missing_ids, vec![1, 3]);
    }

    #[test]
    fn test_own_summary_is_never_disjoint() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(1, 10), Timestamp::ZERO);
        store.enqueue(entry(2, 10), Timestamp::ZERO);

        let own = store.summary_vector(Timestamp::ZERO);
        assert!(store.find_disjoint(&own).is_empty());
    }

    #[test]
    fn test_dequeue_pops_lowest_id() {
        let mut store = PacketStore::new(8);
        store.enqueue(entry(3, 10), Timestamp::ZERO);
        store.enqueue(entry(1, 10), Timestamp::ZERO);

        let first = store.dequeue().unwrap();
        assert_eq!(first.id(), GlobalPacketId::from_parts(1, 1));
        assert_eq!(store.len(), 1);
    }
}
