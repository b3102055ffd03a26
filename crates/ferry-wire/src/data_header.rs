//! Data header attached to every buffered data packet
//!
//! The source node prepends this header when a packet first enters the
//! protocol; the destination strips it before handing the payload up.
//! Wire layout, all big-endian: 4-byte global packet ID, 4-byte
//! remaining hop budget, 8-byte origination timestamp in nanoseconds.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use ferry_core::Timestamp;

use crate::error::{WireError, WireResult};
use crate::id::GlobalPacketId;

/// Flood-control header carried by data packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHeader {
    /// Network-wide packet key.
    pub id: GlobalPacketId,
    /// Remaining flood budget. Similar to a TTL but with a wider range;
    /// receivers discard anything arriving with a value of 1 or less.
    pub hop_count: u32,
    /// When the packet was originated at its source. Used together with
    /// the expire time to discard old packets network-wide.
    pub timestamp: Timestamp,
}

impl DataHeader {
    /// Number of bytes this header occupies on the wire.
    pub const WIRE_SIZE: usize = 4 + 4 + 8;

    /// Create a header.
    pub fn new(id: GlobalPacketId, hop_count: u32, timestamp: Timestamp) -> Self {
        Self {
            id,
            hop_count,
            timestamp,
        }
    }

    /// Copy of this header with the hop budget decremented, saturating.
    pub fn decremented(&self) -> Self {
        Self {
            hop_count: self.hop_count.saturating_sub(1),
            ..*self
        }
    }

    /// Exact number of bytes `encode` produces.
    pub const fn serialized_size(&self) -> usize {
        Self::WIRE_SIZE
    }

    /// Write the header in network byte order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        self.id.encode(buf);
        buf.put_u32(self.hop_count);
        buf.put_u64(self.timestamp.as_nanos());
    }

    /// Read a header, consuming exactly [`Self::WIRE_SIZE`] bytes.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        let available = buf.remaining();
        if available < Self::WIRE_SIZE {
            return Err(WireError::Truncated {
                needed: Self::WIRE_SIZE,
                available,
            });
        }
        let id = GlobalPacketId::decode(buf)?;
        let hop_count = buf.get_u32();
        let timestamp = Timestamp::from_nanos(buf.get_u64());
        debug_assert_eq!(available - buf.remaining(), Self::WIRE_SIZE);
        Ok(Self {
            id,
            hop_count,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let header = DataHeader::new(
            GlobalPacketId::from_parts(0x0A01, 17),
            64,
            Timestamp::from_nanos(1_234_567_890_123),
        );
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), header.serialized_size());

        let decoded = DataHeader::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_big_endian_layout() {
        let header = DataHeader::new(GlobalPacketId::from_raw(0x01020304), 0x0A0B0C0D, Timestamp::ZERO);
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(&buf[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&buf[4..8], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(&buf[8..16], &[0; 8]);
    }

    #[test]
    fn test_decremented_saturates() {
        let header = DataHeader::new(GlobalPacketId::from_parts(1, 1), 1, Timestamp::ZERO);
        assert_eq!(header.decremented().hop_count, 0);
        assert_eq!(header.decremented().decremented().hop_count, 0);
    }

    #[test]
    fn test_decode_truncated() {
        let err = DataHeader::decode(&mut &[0u8; 15][..]).unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                needed: 16,
                available: 15
            }
        );
    }
}
