//! Message type tags and the control marker
//!
//! Every protocol message starts with a one-byte type tag. An unknown
//! tag byte decodes to an explicit invalid state rather than an error:
//! callers must check [`TypeTag::is_valid`] before interpreting the
//! message, which keeps a hostile byte from ever panicking the engine.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};

/// Message types of the anti-entropy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Advertise the presence of a node on the segment.
    Beacon = 0,
    /// Reply to a beacon, carrying the sender's summary vector.
    /// Sent only by the side with the smaller address.
    Reply = 1,
    /// Response to a Reply, carrying the responder's summary vector
    /// after the disjoint packets have been sent.
    ReplyBack = 2,
}

/// One-byte type tag prefix of every protocol message.
///
/// Deserializing never fails; a tag holding an unrecognized byte is
/// simply invalid and carries the offending value for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    /// A recognized message type.
    Valid(MessageType),
    /// An unrecognized tag byte.
    Invalid(u8),
}

impl TypeTag {
    /// Number of bytes the tag occupies on the wire.
    pub const WIRE_SIZE: usize = 1;

    /// Tag for a message type.
    pub fn new(t: MessageType) -> Self {
        Self::Valid(t)
    }

    /// Whether the decoded byte named a known message type.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The message type, if valid.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::Valid(t) => Some(*t),
            Self::Invalid(_) => None,
        }
    }

    /// Write the tag byte.
    pub fn encode(&self, buf: &mut impl BufMut) {
        let byte = match self {
            Self::Valid(t) => *t as u8,
            Self::Invalid(b) => *b,
        };
        buf.put_u8(byte);
    }

    /// Read a tag byte. Unknown values yield `Invalid`, not an error.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(WireError::Truncated {
                needed: Self::WIRE_SIZE,
                available: buf.remaining(),
            });
        }
        Ok(match buf.get_u8() {
            0 => Self::Valid(MessageType::Beacon),
            1 => Self::Valid(MessageType::Reply),
            2 => Self::Valid(MessageType::ReplyBack),
            other => Self::Invalid(other),
        })
    }
}

/// Message types of the path-vector protocol variant.
///
/// The location-based variant of the protocol exchanges vehicle path
/// vectors instead of packet summary vectors and uses this alternate
/// header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PathMessageType {
    /// Presence advertisement, as in the primary set.
    Beacon = 0,
    /// Path vector of the node with the smaller address.
    VehiclePath = 1,
    /// Path vector sent in response to a VehiclePath.
    VehiclePathBack = 2,
    /// Ordinary data message.
    Message = 3,
}

impl PathMessageType {
    /// Read a path-variant tag byte, if it names a known type.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Beacon),
            1 => Some(Self::VehiclePath),
            2 => Some(Self::VehiclePathBack),
            3 => Some(Self::Message),
            _ => None,
        }
    }
}

/// In-band marker distinguishing protocol control traffic from data.
///
/// Control messages are consumed entirely by the session engine and
/// stripped before any local-delivery path runs; the marker is how the
/// receiving side tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMarker {
    /// Locally injected protocol message (beacon or summary exchange).
    Control = 0,
    /// Ordinary data packet.
    #[default]
    NotSet = 1,
}

impl ControlMarker {
    /// Number of bytes the marker occupies on the wire.
    pub const WIRE_SIZE: usize = 1;

    /// Whether this marks a control message.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control)
    }

    /// Write the marker byte.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(*self as u8);
    }

    /// Read a marker byte.
    pub fn decode(buf: &mut impl Buf) -> WireResult<Self> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(WireError::Empty);
        }
        match buf.get_u8() {
            0 => Ok(Self::Control),
            1 => Ok(Self::NotSet),
            other => Err(WireError::UnknownMarker(other)),
        }
    }
}
