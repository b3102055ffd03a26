//! Path vector header for the location-based protocol variant
//!
//! The variant advertises the waypoints a vehicle intends to traverse
//! instead of the packets it holds. Wire layout: 4-byte previous
//! waypoint, 4-byte next waypoint, then a length-prefixed sequence of
//! 4-byte waypoint identifiers with the same set semantics as the
//! summary vector.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};

/// Identifier of a road-network waypoint.
pub type WaypointId = u32;

/// A vehicle's advertised path through the road network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathVector {
    /// Waypoint most recently passed.
    pub previous: WaypointId,
    /// Waypoint currently headed toward.
    pub next: WaypointId,
    /// Remaining planned waypoints, in travel order.
    waypoints: Vec<WaypointId>,
}

impl PathVector {
    /// Create a path vector with no planned waypoints.
    pub fn new(previous: WaypointId, next: WaypointId) -> Self {
        Self {
            previous,
            next,
            waypoints: Vec::new(),
        }
    }

    /// Append a planned waypoint.
    pub fn add(&mut self, waypoint: WaypointId) {
        self.waypoints.push(waypoint);
    }

    /// Membership test over the planned waypoints.
    pub fn contains(&self, waypoint: WaypointId) -> bool {
        self.waypoints.contains(&waypoint)
    }

    /// Number of planned waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether no waypoints are planned.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoints planned here that are absent from `other`.
    pub fn disjoint(&self, other: &PathVector) -> Vec<WaypointId> {
        self.waypoints
            .iter()
            .copied()
            .filter(|w| !other.contains(*w))
            .collect()
    }

    /// Exact number of bytes `encode` produces.
    pub fn serialized_size(&self) -> usize {
        4 + 4 + 4 + self.waypoints.len() * 4
    }

    /// Write the path vector in network byte order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.previous);
        buf.put_u32(self.next);
        buf.put_u32(self.waypoints.len() as u32);
        for w in &self.waypoints {
            buf.put_u32(*w);
        }
    }

    /// Read a path vector, consuming exactly `serialized_size` bytes.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        let available = buf.remaining();
        if available < 12 {
            return Err(WireError::Truncated {
                needed: 12,
                available,
            });
        }
        let previous = buf.get_u32();
        let next = buf.get_u32();
        let count = buf.get_u32() as usize;
        let body = count.checked_mul(4).ok_or(WireError::Truncated {
            needed: usize::MAX,
            available: buf.remaining(),
        })?;
        if buf.remaining() < body {
            return Err(WireError::Truncated {
                needed: body,
                available: buf.remaining(),
            });
        }

        let mut vector = Self::new(previous, next);
        vector.waypoints.reserve(count);
        for _ in 0..count {
            vector.add(buf.get_u32());
        }
        debug_assert_eq!(available - buf.remaining(), vector.serialized_size());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PathVector {
        let mut v = PathVector::new(10, 11);
        v.add(11);
        v.add(15);
        v.add(22);
        v
    }

    #[test]
    fn test_roundtrip() {
        let vector = sample();
        let mut buf = Vec::new();
        vector.encode(&mut buf);
        assert_eq!(buf.len(), vector.serialized_size());

        let decoded = PathVector::decode(&mut &buf[..]).unwrap();
        assert_eq!(decoded, vector);
    }

    #[test]
    fn test_disjoint() {
        let mine = sample();
        let mut theirs = PathVector::new(3, 11);
        theirs.add(11);
        theirs.add(40);

        assert_eq!(mine.disjoint(&theirs), vec![15, 22]);
        assert_eq!(mine.disjoint(&mine), Vec::<WaypointId>::new());
    }

    #[test]
    fn test_decode_truncated() {
        let vector = sample();
        let mut buf = Vec::new();
        vector.encode(&mut buf);
        buf.truncate(buf.len() - 1);

        let err = PathVector::decode(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));
    }
}
