//! Queue entries: one buffered data packet awaiting delivery or forward

use bytes::Bytes;

use ferry_core::{ErrorHandle, ForwardHandle, PacketHeader, Timestamp};
use ferry_wire::{DataHeader, GlobalPacketId};

/// A data packet buffered in the store.
///
/// The store owns the entry exclusively once it is enqueued. The
/// forward and error handles are borrowed capabilities from the host
/// network layer, captured at enqueue time; the entry never outlives
/// their validity because a torn-down node drops its store with it.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Opaque application payload.
    payload: Bytes,
    /// Network-header snapshot as last seen.
    header: PacketHeader,
    /// Flood-control header, already decremented for this hop.
    data: DataHeader,
    /// Capability to hand the packet to a next hop.
    forward: ForwardHandle,
    /// Capability to report a failed send.
    error: ErrorHandle,
    /// Absolute expiry, anchored at the packet's origination time.
    expire_at: Timestamp,
}

impl QueueEntry {
    /// Create an entry.
    pub fn new(
        payload: Bytes,
        header: PacketHeader,
        data: DataHeader,
        forward: ForwardHandle,
        error: ErrorHandle,
        expire_at: Timestamp,
    ) -> Self {
        Self {
            payload,
            header,
            data,
            forward,
            error,
            expire_at,
        }
    }

    /// Network-wide key of the buffered packet.
    pub fn id(&self) -> GlobalPacketId {
        self.data.id
    }

    /// The application payload.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Network-header snapshot.
    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    /// Flood-control header.
    pub fn data_header(&self) -> &DataHeader {
        &self.data
    }

    /// The forwarding capability captured at enqueue time.
    pub fn forward_handle(&self) -> &ForwardHandle {
        &self.forward
    }

    /// The error-reporting capability captured at enqueue time.
    pub fn error_handle(&self) -> &ErrorHandle {
        &self.error
    }

    /// When the entry expires, network-wide.
    pub fn expire_at(&self) -> Timestamp {
        self.expire_at
    }

    /// Whether the entry has expired at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_at < now
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for QueueEntry {}
