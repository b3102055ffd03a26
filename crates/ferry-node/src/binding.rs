//! UDP transport binding
//!
//! One socket per attached interface, bound to the well-known ferrymesh
//! port. Node addresses double as IPv4 addresses on the segment, so a
//! unicast send is a plain `send_to` and the beacon broadcast goes to
//! the segment's directed broadcast address.

use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;

use ferry_core::{BroadcastTransport, FERRY_PORT, NodeAddress, Transport, TransportError};

/// Largest datagram a binding will accept.
const MAX_DATAGRAM: usize = 64 * 1024;

/// A node's attachment to one interface, over UDP.
#[derive(Debug)]
pub struct UdpBinding {
    socket: UdpSocket,
    local: NodeAddress,
    broadcast: NodeAddress,
    port: u16,
}

impl UdpBinding {
    /// Bind on the well-known ferrymesh port.
    pub async fn bind(
        local: NodeAddress,
        broadcast: NodeAddress,
    ) -> Result<Self, TransportError> {
        Self::bind_on_port(local, broadcast, FERRY_PORT).await
    }

    /// Bind on an explicit port. Real deployments use [`FERRY_PORT`];
    /// tests bind high ports on loopback aliases.
    pub async fn bind_on_port(
        local: NodeAddress,
        broadcast: NodeAddress,
        port: u16,
    ) -> Result<Self, TransportError> {
        let ip = Ipv4Addr::from(local.as_u32());
        let socket = UdpSocket::bind((ip, port)).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            local,
            broadcast,
            port,
        })
    }
}

#[async_trait]
impl Transport for UdpBinding {
    async fn send(&self, peer: NodeAddress, frame: Bytes) -> Result<(), TransportError> {
        let target = (Ipv4Addr::from(peer.as_u32()), self.port);
        self.socket.send_to(&frame, target).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<(NodeAddress, Bytes), TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, addr) = self.socket.recv_from(&mut buf).await?;
        let from = match addr {
            SocketAddr::V4(v4) => NodeAddress::new(u32::from(*v4.ip())),
            SocketAddr::V6(v6) => {
                return Err(TransportError::ReceiveFailed(format!(
                    "non-IPv4 sender {v6}"
                )));
            }
        };
        buf.truncate(len);
        Ok((from, Bytes::from(buf)))
    }

    fn local_address(&self) -> NodeAddress {
        self.local
    }
}

#[async_trait]
impl BroadcastTransport for UdpBinding {
    async fn broadcast(&self, frame: Bytes) -> Result<(), TransportError> {
        let target = (Ipv4Addr::from(self.broadcast.as_u32()), self.port);
        self.socket.send_to(&frame, target).await?;
        Ok(())
    }
}
