//! Summary vector: the held-packet set a node advertises to a peer
//!
//! Wire layout: a 4-byte big-endian count N followed by N 4-byte
//! big-endian global packet IDs. Insertion order is preserved on the
//! wire but membership is what matters; two vectors holding the same
//! IDs in different orders advertise the same set.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};
use crate::id::GlobalPacketId;

/// The set of packet identifiers a node currently holds.
///
/// Built fresh from the packet store at send time and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryVector {
    ids: Vec<GlobalPacketId>,
}

impl SummaryVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty vector with room for `capacity` IDs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Add a packet ID.
    pub fn add(&mut self, id: GlobalPacketId) {
        self.ids.push(id);
    }

    /// Membership test.
    pub fn contains(&self, id: GlobalPacketId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over the advertised IDs.
    pub fn iter(&self) -> impl Iterator<Item = GlobalPacketId> + '_ {
        self.ids.iter().copied()
    }

    /// Exact number of bytes `encode` will produce.
    pub fn serialized_size(&self) -> usize {
        4 + self.ids.len() * GlobalPacketId::WIRE_SIZE
    }

    /// Write the vector in network byte order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.ids.len() as u32);
        for id in &self.ids {
            id.encode(buf);
        }
    }

    /// Read a vector, consuming exactly `serialized_size` bytes.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        let available = buf.remaining();
        if available < 4 {
            return Err(WireError::Truncated {
                needed: 4,
                available,
            });
        }
        let count = buf.get_u32() as usize;
        let body = count
            .checked_mul(GlobalPacketId::WIRE_SIZE)
            .ok_or(WireError::Truncated {
                needed: usize::MAX,
                available: buf.remaining(),
            })?;
        if buf.remaining() < body {
            return Err(WireError::Truncated {
                needed: body,
                available: buf.remaining(),
            });
        }

        let mut vector = Self::with_capacity(count);
        for _ in 0..count {
            vector.add(GlobalPacketId::decode(buf)?);
        }
        debug_assert_eq!(available - buf.remaining(), vector.serialized_size());
        Ok(vector)
    }
}

impl FromIterator<GlobalPacketId> for SummaryVector {
    fn from_iter<T: IntoIterator<Item = GlobalPacketId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
