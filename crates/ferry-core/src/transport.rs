//! Transport abstraction for datagram exchange
//!
//! A [`Transport`] is one attachment point of a node to the local
//! segment: a unicast send primitive plus a receive stream. The
//! [`BroadcastTransport`] extension adds the segment-wide broadcast the
//! beacon mechanism relies on. The routing core never opens sockets
//! itself; the host attaches and detaches bindings as interfaces come
//! and go.

use async_trait::async_trait;
use bytes::Bytes;

use crate::address::NodeAddress;
use crate::error::TransportError;

/// Well-known port all ferrymesh control and data traffic uses.
pub const FERRY_PORT: u16 = 269;

/// Datagram transport between mesh nodes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a frame to a specific peer, best effort.
    async fn send(&self, peer: NodeAddress, frame: Bytes) -> Result<(), TransportError>;

    /// Receive the next inbound frame along with its sender address.
    ///
    /// Blocks until a frame arrives or the binding closes.
    async fn recv(&self) -> Result<(NodeAddress, Bytes), TransportError>;

    /// The local address of this attachment point.
    fn local_address(&self) -> NodeAddress;
}

/// Transport with local-segment broadcast.
#[async_trait]
pub trait BroadcastTransport: Transport {
    /// Broadcast a frame to every reachable node on the segment,
    /// best effort.
    async fn broadcast(&self, frame: Bytes) -> Result<(), TransportError>;
}
