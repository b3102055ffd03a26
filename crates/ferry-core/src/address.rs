//! Node addressing
//!
//! Ferrymesh nodes are identified by a 32-bit numeric address, typically
//! derived from the node's IPv4 address on the mesh segment. The numeric
//! ordering of addresses is load-bearing: it decides which side of an
//! encounter initiates the anti-entropy session.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// 32-bit numeric node address.
///
/// Ordering is total and matches the numeric value, which is what the
/// session tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeAddress(pub u32);

impl NodeAddress {
    /// The all-hosts broadcast address for the local segment.
    pub const BROADCAST: NodeAddress = NodeAddress(u32::MAX);

    /// Create an address from a raw 32-bit value.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build an address from four octets, most significant first.
    pub fn from_octets(octets: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(octets))
    }

    /// Get the raw 32-bit value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the address as big-endian octets.
    pub fn octets(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Low 16 bits of the address, used as the source half of a
    /// global packet identifier.
    pub fn truncated(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Whether this is the local-segment broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3])
    }
}

impl From<u32> for NodeAddress {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::str::FromStr for NodeAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let mut parts = s.split('.');
        for slot in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
            *slot = part
                .parse()
                .map_err(|_| AddressError::InvalidFormat(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }
        Ok(Self::from_octets(octets))
    }
}
