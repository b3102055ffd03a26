//! Borrowed capabilities handed into the routing core by its host
//!
//! The network layer lends the core three callables: one to hand a
//! packet to a next hop, one to report a failed send, and one to deliver
//! a packet to the local stack. They are capabilities, not owned
//! resources; the core clones the cheap `Arc` handle but never keeps a
//! handle past the lifetime of the entry or node that needs it.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::address::NodeAddress;
use crate::error::TransportError;
use crate::packet::PacketHeader;

/// Capability to hand a buffered packet to a next hop.
#[derive(Clone)]
pub struct ForwardHandle(Arc<dyn Fn(NodeAddress, Bytes) + Send + Sync>);

impl ForwardHandle {
    /// Wrap a forwarding function.
    pub fn new(f: impl Fn(NodeAddress, Bytes) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A handle that drops everything, for entries that cannot be
    /// forwarded anywhere.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    /// Hand a frame to the given next hop.
    pub fn forward(&self, next_hop: NodeAddress, frame: Bytes) {
        (self.0)(next_hop, frame);
    }
}

impl fmt::Debug for ForwardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ForwardHandle(..)")
    }
}

/// Capability to report a send failure back to the host network layer.
#[derive(Clone)]
pub struct ErrorHandle(Arc<dyn Fn(TransportError) + Send + Sync>);

impl ErrorHandle {
    /// Wrap an error-reporting function.
    pub fn new(f: impl Fn(TransportError) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A handle that swallows errors.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Report a transport failure.
    pub fn report(&self, err: TransportError) {
        (self.0)(err);
    }
}

impl fmt::Debug for ErrorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandle(..)")
    }
}

/// Capability to deliver a packet addressed to this node up the stack.
#[derive(Clone)]
pub struct DeliveryHandle(Arc<dyn Fn(Bytes, PacketHeader) + Send + Sync>);

impl DeliveryHandle {
    /// Wrap a local-delivery function.
    pub fn new(f: impl Fn(Bytes, PacketHeader) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A handle that discards deliveries, for nodes acting purely as
    /// relays.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    /// Deliver a payload and its source header to the local stack.
    pub fn deliver(&self, payload: Bytes, header: PacketHeader) {
        (self.0)(payload, header);
    }
}

impl fmt::Debug for DeliveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeliveryHandle(..)")
    }
}
