//! Mock transport for testing
//!
//! Provides an in-memory radio segment for testing session and routing
//! logic without sockets. Every transport attached to the same
//! [`MockSegment`] can unicast to any other and broadcast to all
//! others, mimicking nodes in mutual radio range.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};

use crate::address::NodeAddress;
use crate::error::TransportError;
use crate::transport::{BroadcastTransport, Transport};

/// A shared in-memory segment connecting mock transports.
#[derive(Clone, Default)]
pub struct MockSegment {
    inboxes: Arc<DashMap<NodeAddress, mpsc::UnboundedSender<(NodeAddress, Bytes)>>>,
}

impl MockSegment {
    /// Create an empty segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node to the segment and get its transport.
    pub fn attach(&self, address: NodeAddress) -> MockTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.insert(address, tx);
        MockTransport {
            local: address,
            segment: self.clone(),
            inbox: Mutex::new(rx),
        }
    }

    /// Detach a node; subsequent sends to it fail.
    pub fn detach(&self, address: NodeAddress) {
        self.inboxes.remove(&address);
    }

    /// Number of attached nodes.
    pub fn node_count(&self) -> usize {
        self.inboxes.len()
    }

    fn deliver(
        &self,
        from: NodeAddress,
        to: NodeAddress,
        frame: Bytes,
    ) -> Result<(), TransportError> {
        let inbox = self
            .inboxes
            .get(&to)
            .ok_or_else(|| TransportError::PeerNotConnected(to.to_string()))?;
        inbox
            .send((from, frame))
            .map_err(|_| TransportError::SendFailed(format!("inbox closed for {}", to)))
    }
}

/// In-memory transport attached to a [`MockSegment`].
pub struct MockTransport {
    local: NodeAddress,
    segment: MockSegment,
    inbox: Mutex<mpsc::UnboundedReceiver<(NodeAddress, Bytes)>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, peer: NodeAddress, frame: Bytes) -> Result<(), TransportError> {
        self.segment.deliver(self.local, peer, frame)
    }

    async fn recv(&self) -> Result<(NodeAddress, Bytes), TransportError> {
        self.inbox
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::BindingClosed)
    }

    fn local_address(&self) -> NodeAddress {
        self.local
    }
}

#[async_trait]
impl BroadcastTransport for MockTransport {
    async fn broadcast(&self, frame: Bytes) -> Result<(), TransportError> {
        for entry in self.segment.inboxes.iter() {
            if *entry.key() == self.local {
                continue;
            }
            // Best effort: a detached peer mid-iteration is not an error.
            let _ = entry.value().send((self.local, frame.clone()));
        }
        Ok(())
    }
}
