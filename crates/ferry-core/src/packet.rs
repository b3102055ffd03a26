//! Network-header snapshot carried alongside buffered packets

use serde::{Deserialize, Serialize};

use crate::address::NodeAddress;

/// Snapshot of the network header of a data packet.
///
/// The routing core keeps this alongside every buffered payload so a
/// packet can be re-emitted toward a new next hop without consulting
/// the host network layer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    /// Originating node.
    pub source: NodeAddress,
    /// Final destination, possibly the segment broadcast address.
    pub destination: NodeAddress,
    /// Link-layer TTL as last seen.
    ///
    /// Flood control uses its own hop budget, so the TTL is bumped by
    /// one on every re-emission to keep the host IP layer from dropping
    /// the packet first.
    pub ttl: u8,
}

impl PacketHeader {
    /// Create a header snapshot.
    pub fn new(source: NodeAddress, destination: NodeAddress, ttl: u8) -> Self {
        Self {
            source,
            destination,
            ttl,
        }
    }

    /// Copy of this header with the TTL incremented, saturating.
    pub fn with_bumped_ttl(&self) -> Self {
        Self {
            ttl: self.ttl.saturating_add(1),
            ..*self
        }
    }
}
