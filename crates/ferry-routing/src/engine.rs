//! The per-node session engine
//!
//! One engine per node, single-owner. Sessions are not objects: every
//! inbound message maps deterministically to a bounded list of outbound
//! actions, and the only state that outlives a message is the packet
//! store, the contact tracker, and the data packet counter. A session
//! "exists" only as the causal chain
//!
//! ```text
//!   BEACON  ->  REPLY(summary)  ->  data*, REPLY_BACK(summary)  ->  data*
//! ```
//!
//! where the side with the lower numeric address initiates. Losing any
//! message simply ends the exchange early; the next beacon cycle is the
//! retry path.

use bytes::Bytes;
use tracing::{debug, info, warn};

use ferry_core::{
    Clock, DeliveryHandle, ErrorHandle, FerryConfig, ForwardHandle, NodeAddress, PacketHeader,
};
use ferry_store::{ContactTracker, PacketStore, QueueEntry};
use ferry_wire::{ControlBody, DataFrame, DataHeader, Datagram, GlobalPacketId, SummaryVector};

/// TTL stamped on locally originated packets.
///
/// Flood control runs on the data header's own hop budget; the TTL only
/// has to be large enough that the host IP layer never drops the packet
/// first, and it is re-bumped on every re-emission.
const INITIAL_TTL: u8 = 64;

/// An action the engine wants executed on the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send a frame to one peer.
    Unicast { to: NodeAddress, frame: Bytes },
    /// Send a frame to every reachable peer.
    Broadcast { frame: Bytes },
}

/// Routing core of a single node.
///
/// The driver owns the engine exclusively and calls into it from one
/// task; nothing here is shared or locked. Forward and delivery
/// capabilities are lent by the host network layer at construction.
pub struct SessionEngine<C: Clock> {
    local: NodeAddress,
    config: FerryConfig,
    clock: C,
    store: PacketStore,
    contacts: ContactTracker,
    forward: ForwardHandle,
    delivery: DeliveryHandle,
    errors: ErrorHandle,
    /// Low half of the next locally issued packet ID. Wraps; a source
    /// reissuing a counter after 65536 sends is acceptable because the
    /// earlier packet has long expired network-wide.
    counter: u16,
}

impl<C: Clock> SessionEngine<C> {
    /// Create an engine for the node at `local`.
    pub fn new(
        local: NodeAddress,
        config: FerryConfig,
        clock: C,
        forward: ForwardHandle,
        delivery: DeliveryHandle,
        errors: ErrorHandle,
    ) -> Self {
        let store = PacketStore::new(config.queue_length);
        let contacts = ContactTracker::new(config.host_recent_period);
        Self {
            local,
            config,
            clock,
            store,
            contacts,
            forward,
            delivery,
            errors,
            counter: 0,
        }
    }

    /// The address this engine answers for.
    pub fn local_address(&self) -> NodeAddress {
        self.local
    }

    /// The engine's packet store, for inspection.
    pub fn store(&self) -> &PacketStore {
        &self.store
    }

    /// Build the beacon frame for one timer tick.
    ///
    /// The beacon reuses the data-header layout so every message family
    /// on the wire shares one codec; only the hop-count field matters to
    /// receivers, and it is stamped above the drop threshold so the
    /// frame survives the receive path.
    pub fn on_beacon_tick(&mut self) -> Outbound {
        let now = self.clock.now();
        let header = DataHeader::new(
            GlobalPacketId::from_parts(self.local.truncated(), 0),
            self.config.hop_count.max(2),
            now,
        );
        debug!(node = %self.local, "beacon tick");
        Outbound::Broadcast {
            frame: Datagram::Control(ControlBody::Beacon(header)).to_bytes(),
        }
    }

    /// Process one received datagram.
    ///
    /// Undecodable input is logged and dropped; it never produces
    /// actions and never propagates as an error.
    pub fn on_datagram(&mut self, from: NodeAddress, frame: Bytes) -> Vec<Outbound> {
        if from == self.local {
            // Our own broadcast echoed back by the segment.
            return Vec::new();
        }
        let datagram = match Datagram::decode(frame) {
            Ok(datagram) => datagram,
            Err(err) => {
                warn!(peer = %from, error = %err, "dropping undecodable datagram");
                return Vec::new();
            }
        };
        match datagram {
            Datagram::Control(body) => self.on_control(from, body),
            Datagram::Data(frame) => {
                self.on_data(from, frame);
                Vec::new()
            }
        }
    }

    /// Originate a packet at this node.
    ///
    /// The packet is stamped with a fresh global ID and the full hop
    /// budget, buffered for opportunistic replication, and delivered
    /// locally right away when this node is itself in the destination
    /// set. Returns the assigned ID.
    pub fn send(&mut self, payload: Bytes, destination: NodeAddress) -> GlobalPacketId {
        let now = self.clock.now();
        let id = GlobalPacketId::from_parts(self.local.truncated(), self.counter);
        self.counter = self.counter.wrapping_add(1);

        let header = PacketHeader::new(self.local, destination, INITIAL_TTL);
        let data = DataHeader::new(id, self.config.hop_count, now);
        let expire_at = now + self.config.queue_entry_expire_time;

        if destination == self.local || destination.is_broadcast() {
            self.delivery.deliver(payload.clone(), header);
        }

        info!(packet = %id, destination = %destination, "originating packet");
        let entry = QueueEntry::new(
            payload,
            header,
            data,
            self.forward.clone(),
            self.errors.clone(),
            expire_at,
        );
        self.store.enqueue(entry, now);
        id
    }

    fn on_control(&mut self, from: NodeAddress, body: ControlBody) -> Vec<Outbound> {
        let now = self.clock.now();
        self.store.purge_expired(now);

        match body {
            ControlBody::Beacon(_) => {
                // Lower address initiates; the `&&` ordering matters
                // because the contact query records the peer as seen.
                if self.local < from && !self.contacts.was_recently_contacted(from, now) {
                    let vector = self.store.summary_vector(now);
                    info!(peer = %from, held = vector.len(), "opening exchange");
                    vec![Outbound::Unicast {
                        to: from,
                        frame: Datagram::Control(ControlBody::Reply(vector)).to_bytes(),
                    }]
                } else {
                    debug!(peer = %from, "beacon ignored");
                    Vec::new()
                }
            }
            ControlBody::Reply(vector) => {
                let sent = self.forward_missing(from, &vector);
                let own = self.store.summary_vector(now);
                info!(peer = %from, forwarded = sent, "answering exchange");
                vec![Outbound::Unicast {
                    to: from,
                    frame: Datagram::Control(ControlBody::ReplyBack(own)).to_bytes(),
                }]
            }
            ControlBody::ReplyBack(vector) => {
                let sent = self.forward_missing(from, &vector);
                info!(peer = %from, forwarded = sent, "exchange complete");
                Vec::new()
            }
        }
    }

    /// Hand every buffered packet the peer lacks to its forward handle.
    ///
    /// Two packets are held back: anything the peer itself originated,
    /// and anything destined for this node (it has already been
    /// delivered locally and replicating it further buys nothing).
    fn forward_missing(&self, peer: NodeAddress, remote: &SummaryVector) -> usize {
        let mut sent = 0;
        for entry in self.store.find_disjoint(remote) {
            if entry.header().source == peer {
                continue;
            }
            if entry.header().destination == self.local {
                continue;
            }
            let frame = Datagram::Data(DataFrame {
                header: entry.header().with_bumped_ttl(),
                data: *entry.data_header(),
                payload: entry.payload().clone(),
            })
            .to_bytes();
            debug!(packet = %entry.id(), peer = %peer, "forwarding buffered packet");
            entry.forward_handle().forward(peer, frame);
            sent += 1;
        }
        sent
    }

    fn on_data(&mut self, from: NodeAddress, frame: DataFrame) {
        let now = self.clock.now();

        if self.store.contains(frame.data.id) {
            debug!(packet = %frame.data.id, peer = %from, "duplicate, dropping");
            return;
        }
        if frame.data.hop_count <= 1 {
            debug!(packet = %frame.data.id, "hop budget exhausted, dropping");
            return;
        }
        let expire_at = frame.data.timestamp + self.config.queue_entry_expire_time;
        if expire_at < now {
            debug!(packet = %frame.data.id, "expired in transit, dropping");
            return;
        }

        let destination = frame.header.destination;
        if destination == self.local || destination.is_broadcast() {
            info!(packet = %frame.data.id, source = %frame.header.source, "delivering locally");
            self.delivery.deliver(frame.payload.clone(), frame.header);
        }

        // Buffered even when we are the destination: store membership is
        // what suppresses duplicates, and forward_missing holds the
        // entry back from further replication.
        let entry = QueueEntry::new(
            frame.payload,
            frame.header,
            frame.data.decremented(),
            self.forward.clone(),
            self.errors.clone(),
            expire_at,
        );
        self.store.enqueue(entry, now);
    }
}

impl<C: Clock> std::fmt::Debug for SessionEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("local", &self.local)
            .field("buffered", &self.store.len())
            .field("counter", &self.counter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use ferry_core::{ManualClock, Timestamp};

    type Captured<T> = Arc<Mutex<Vec<T>>>;

    struct Harness {
        engine: SessionEngine<ManualClock>,
        clock: ManualClock,
        forwarded: Captured<(NodeAddress, Bytes)>,
        delivered: Captured<(Bytes, PacketHeader)>,
    }

    fn harness(local: u32) -> Harness {
        let clock = ManualClock::new();
        let forwarded: Captured<(NodeAddress, Bytes)> = Arc::new(Mutex::new(Vec::new()));
        let delivered: Captured<(Bytes, PacketHeader)> = Arc::new(Mutex::new(Vec::new()));

        let fwd_sink = forwarded.clone();
        let del_sink = delivered.clone();
        let engine = SessionEngine::new(
            NodeAddress::new(local),
            FerryConfig::default(),
            clock.clone(),
            ForwardHandle::new(move |peer, frame| fwd_sink.lock().unwrap().push((peer, frame))),
            DeliveryHandle::new(move |payload, header| {
                del_sink.lock().unwrap().push((payload, header))
            }),
            ErrorHandle::noop(),
        );
        Harness {
            engine,
            clock,
            forwarded,
            delivered,
        }
    }

    fn beacon_from(addr: u32) -> (NodeAddress, Bytes) {
        let header = DataHeader::new(
            GlobalPacketId::from_parts(addr as u16, 0),
            64,
            Timestamp::ZERO,
        );
        (
            NodeAddress::new(addr),
            Datagram::Control(ControlBody::Beacon(header)).to_bytes(),
        )
    }

    fn data_from(source: u32, destination: u32, counter: u16, hops: u32) -> (NodeAddress, Bytes) {
        let frame = Datagram::Data(DataFrame {
            header: PacketHeader::new(NodeAddress::new(source), NodeAddress::new(destination), 64),
            data: DataHeader::new(
                GlobalPacketId::from_parts(source as u16, counter),
                hops,
                Timestamp::ZERO,
            ),
            payload: Bytes::from_static(b"hello"),
        })
        .to_bytes();
        (NodeAddress::new(source), frame)
    }

    fn decode(action: &Outbound) -> Datagram {
        let frame = match action {
            Outbound::Unicast { frame, .. } => frame.clone(),
            Outbound::Broadcast { frame } => frame.clone(),
        };
        Datagram::decode(frame).unwrap()
    }

    #[test]
    fn test_beacon_tick_broadcasts_survivable_header() {
        let mut h = harness(1);
        let action = h.engine.on_beacon_tick();

        match decode(&action) {
            Datagram::Control(ControlBody::Beacon(header)) => assert!(header.hop_count > 1),
            other => panic!("expected beacon, got {other:?}"),
        }
        assert!(matches!(action, Outbound::Broadcast { .. }));
    }

    #[test]
    fn test_lower_address_initiates() {
        let mut h = harness(1);
        let (from, frame) = beacon_from(2);
        let actions = h.engine.on_datagram(from, frame);

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Outbound::Unicast { to, .. } => assert_eq!(*to, NodeAddress::new(2)),
            other => panic!("expected unicast, got {other:?}"),
        }
        assert!(matches!(
            decode(&actions[0]),
            Datagram::Control(ControlBody::Reply(_))
        ));
    }

    #[test]
    fn test_higher_address_stays_silent() {
        let mut h = harness(5);
        let (from, frame) = beacon_from(2);
        assert!(h.engine.on_datagram(from, frame).is_empty());
    }

    #[test]
    fn test_recent_contact_suppresses_reinitiation() {
        let mut h = harness(1);
        let (from, frame) = beacon_from(2);

        assert_eq!(h.engine.on_datagram(from, frame.clone()).len(), 1);
        h.clock.advance(Duration::from_secs(1));
        assert!(h.engine.on_datagram(from, frame.clone()).is_empty());

        // Past the recent-contact window the exchange reopens.
        h.clock.advance(Duration::from_secs(15));
        assert_eq!(h.engine.on_datagram(from, frame).len(), 1);
    }

    #[test]
    fn test_own_echoed_beacon_is_ignored() {
        let mut h = harness(1);
        let (_, frame) = beacon_from(1);
        assert!(h.engine.on_datagram(NodeAddress::new(1), frame).is_empty());
    }

    #[test]
    fn test_reply_forwards_disjoint_and_answers_back() {
        let mut h = harness(2);
        h.engine.send(Bytes::from_static(b"one"), NodeAddress::new(9));
        h.engine.send(Bytes::from_static(b"two"), NodeAddress::new(9));

        // Peer already holds the first packet.
        let remote: SummaryVector = [GlobalPacketId::from_parts(2, 0)].into_iter().collect();
        let actions = h.engine.on_datagram(
            NodeAddress::new(7),
            Datagram::Control(ControlBody::Reply(remote)).to_bytes(),
        );

        let forwarded = h.forwarded.lock().unwrap();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].0, NodeAddress::new(7));
        match Datagram::decode(forwarded[0].1.clone()).unwrap() {
            Datagram::Data(frame) => {
                assert_eq!(frame.data.id, GlobalPacketId::from_parts(2, 1));
                assert_eq!(&frame.payload[..], b"two");
                // TTL bumped on re-emission.
                assert_eq!(frame.header.ttl, 65);
            }
            other => panic!("expected data frame, got {other:?}"),
        }

        assert_eq!(actions.len(), 1);
        match decode(&actions[0]) {
            Datagram::Control(ControlBody::ReplyBack(own)) => {
                assert_eq!(own.len(), 2);
            }
            other => panic!("expected reply-back, got {other:?}"),
        }
    }

    #[test]
    fn test_reply_back_forwards_without_answer() {
        let mut h = harness(2);
        h.engine.send(Bytes::from_static(b"one"), NodeAddress::new(9));

        let actions = h.engine.on_datagram(
            NodeAddress::new(7),
            Datagram::Control(ControlBody::ReplyBack(SummaryVector::new())).to_bytes(),
        );

        assert!(actions.is_empty());
        assert_eq!(h.forwarded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_never_forwards_back_to_the_source() {
        let mut h = harness(2);
        let (from, frame) = data_from(7, 9, 0, 8);
        h.engine.on_datagram(from, frame);

        // Node 7 originated the packet; reconciling with it must not
        // hand the packet back.
        h.engine.on_datagram(
            NodeAddress::new(7),
            Datagram::Control(ControlBody::ReplyBack(SummaryVector::new())).to_bytes(),
        );
        assert!(h.forwarded.lock().unwrap().is_empty());

        // A different peer does receive it.
        h.engine.on_datagram(
            NodeAddress::new(8),
            Datagram::Control(ControlBody::ReplyBack(SummaryVector::new())).to_bytes(),
        );
        assert_eq!(h.forwarded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_delivered_packets_are_not_replicated_further() {
        let mut h = harness(2);
        let (from, frame) = data_from(7, 2, 0, 8);
        h.engine.on_datagram(from, frame);
        assert_eq!(h.delivered.lock().unwrap().len(), 1);

        h.engine.on_datagram(
            NodeAddress::new(8),
            Datagram::Control(ControlBody::ReplyBack(SummaryVector::new())).to_bytes(),
        );
        assert!(h.forwarded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_data_delivered_once() {
        let mut h = harness(2);
        let (from, frame) = data_from(7, 2, 0, 8);
        h.engine.on_datagram(from, frame.clone());
        h.engine.on_datagram(from, frame);

        assert_eq!(h.delivered.lock().unwrap().len(), 1);
        assert_eq!(h.engine.store().len(), 1);
    }

    #[test]
    fn test_broadcast_destination_is_delivered() {
        let mut h = harness(2);
        let (from, frame) = data_from(7, u32::MAX, 0, 8);
        h.engine.on_datagram(from, frame);
        assert_eq!(h.delivered.lock().unwrap().len(), 1);
        // Broadcast packets keep replicating after local delivery.
        assert_eq!(h.engine.store().len(), 1);
    }

    #[test]
    fn test_hop_exhausted_data_dropped_silently() {
        let mut h = harness(2);
        for hops in [0, 1] {
            let (from, frame) = data_from(7, 2, hops as u16, hops);
            h.engine.on_datagram(from, frame);
        }
        assert!(h.delivered.lock().unwrap().is_empty());
        assert!(h.engine.store().is_empty());
    }

    #[test]
    fn test_expired_data_dropped_on_arrival() {
        let mut h = harness(2);
        // Originated at t=0, expire window 100s; arrives at t=101.
        h.clock.set(Timestamp::from_secs(101));
        let (from, frame) = data_from(7, 2, 0, 8);
        h.engine.on_datagram(from, frame);

        assert!(h.delivered.lock().unwrap().is_empty());
        assert!(h.engine.store().is_empty());
    }

    #[test]
    fn test_accepted_data_hop_count_decrements() {
        let mut h = harness(2);
        let (from, frame) = data_from(7, 9, 0, 8);
        h.engine.on_datagram(from, frame);

        let entry = h
            .engine
            .store()
            .find(GlobalPacketId::from_parts(7, 0))
            .unwrap();
        assert_eq!(entry.data_header().hop_count, 7);
        // Expiry stays anchored at origination, not receipt.
        assert_eq!(entry.expire_at(), Timestamp::from_secs(100));
    }

    #[test]
    fn test_send_assigns_sequential_ids() {
        let mut h = harness(3);
        let first = h.engine.send(Bytes::from_static(b"a"), NodeAddress::new(9));
        let second = h.engine.send(Bytes::from_static(b"b"), NodeAddress::new(9));

        assert_eq!(first, GlobalPacketId::from_parts(3, 0));
        assert_eq!(second, GlobalPacketId::from_parts(3, 1));
        assert_eq!(h.engine.store().len(), 2);
    }

    #[test]
    fn test_send_to_self_loops_back() {
        let mut h = harness(3);
        h.engine.send(Bytes::from_static(b"note"), NodeAddress::new(3));

        let delivered = h.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(&delivered[0].0[..], b"note");
    }

    #[test]
    fn test_undecodable_datagram_produces_nothing() {
        let mut h = harness(1);
        let actions = h
            .engine
            .on_datagram(NodeAddress::new(2), Bytes::from_static(&[0, 0x7F]));
        assert!(actions.is_empty());
        assert!(h.engine.store().is_empty());
    }

    #[test]
    fn test_control_receipt_purges_expired_entries() {
        let mut h = harness(1);
        h.engine.send(Bytes::from_static(b"old"), NodeAddress::new(9));

        h.clock.set(Timestamp::from_secs(200));
        let (from, frame) = beacon_from(2);
        let actions = h.engine.on_datagram(from, frame);

        match decode(&actions[0]) {
            Datagram::Control(ControlBody::Reply(vector)) => assert!(vector.is_empty()),
            other => panic!("expected reply, got {other:?}"),
        }
        assert!(h.engine.store().is_empty());
    }
}
