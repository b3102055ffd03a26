//! Network-wide packet identification

use std::fmt::{self, Display};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};

/// Globally unique packet identifier.
///
/// The high 16 bits are the truncated source node address and the low
/// 16 bits a per-source monotonically incrementing counter. A source
/// issues each (address, counter) pair at most once, so receivers treat
/// the concatenation as a network-wide key. `(0, 0)` is a legitimate
/// value; absence is always expressed with `Option`, never a sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GlobalPacketId(u32);

impl GlobalPacketId {
    /// Number of bytes this ID occupies on the wire.
    pub const WIRE_SIZE: usize = 4;

    /// Build an ID from its truncated source address and counter halves.
    pub fn from_parts(source: u16, counter: u16) -> Self {
        Self(((source as u32) << 16) | counter as u32)
    }

    /// Create from the raw 32-bit wire value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit wire value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Truncated address of the issuing source.
    pub fn source_part(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Per-source sequence counter.
    pub fn counter_part(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Write the ID in network byte order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.0);
    }

    /// Read an ID in network byte order.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(WireError::Truncated {
                needed: Self::WIRE_SIZE,
                available: buf.remaining(),
            });
        }
        Ok(Self(buf.get_u32()))
    }
}

impl Display for GlobalPacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}:{}", self.source_part(), self.counter_part())
    }
}
