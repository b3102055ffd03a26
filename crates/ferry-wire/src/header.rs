//! Codec for the network-header snapshot
//!
//! Data packets travel between stores with their original network
//! header attached, so a relay can keep forwarding toward the real
//! destination. Wire layout: 4-byte source, 4-byte destination, 1-byte
//! TTL, big-endian.

use bytes::{Buf, BufMut};

use ferry_core::{NodeAddress, PacketHeader};

use crate::error::{WireError, WireResult};

/// Number of bytes a [`PacketHeader`] occupies on the wire.
pub const PACKET_HEADER_WIRE_SIZE: usize = 4 + 4 + 1;

/// Write a header snapshot in network byte order.
pub fn encode_packet_header(header: &PacketHeader, buf: &mut impl BufMut) {
    buf.put_u32(header.source.as_u32());
    buf.put_u32(header.destination.as_u32());
    buf.put_u8(header.ttl);
}

/// Read a header snapshot, consuming exactly
/// [`PACKET_HEADER_WIRE_SIZE`] bytes.
pub fn decode_packet_header(buf: &mut impl Buf) -> WireResult<PacketHeader> {
    let available = buf.remaining();
    if available < PACKET_HEADER_WIRE_SIZE {
        return Err(WireError::Truncated {
            needed: PACKET_HEADER_WIRE_SIZE,
            available,
        });
    }
    let source = NodeAddress::new(buf.get_u32());
    let destination = NodeAddress::new(buf.get_u32());
    let ttl = buf.get_u8();
    debug_assert_eq!(available - buf.remaining(), PACKET_HEADER_WIRE_SIZE);
    Ok(PacketHeader::new(source, destination, ttl))
}
