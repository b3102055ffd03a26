//! # Ferry Wire
//!
//! Fixed binary encodings for the ferrymesh anti-entropy protocol.
//!
//! Four message shapes, each self-describing via a one-byte type tag:
//!
//! - **Beacon**: liveness advertisement, broadcast periodically
//! - **Reply**: summary vector from the session initiator
//! - **ReplyBack**: summary vector from the responder
//! - **Data**: a buffered packet in transit, carrying its network
//!   header snapshot and flood-control header
//!
//! plus the path-vector header set used by the location-based variant.
//! All multi-byte integers are big-endian so heterogeneous nodes
//! interoperate.
//!
//! Every codec obeys the same contract: `encode` produces exactly
//! `serialized_size()` bytes, `decode` consumes exactly that many and
//! debug-asserts on mismatch. A mismatch is a codec bug, not a network
//! error, and fails fast in debug builds only.

pub mod data_header;
pub mod datagram;
pub mod error;
pub mod header;
pub mod id;
pub mod path_vector;
pub mod summary;
pub mod tag;

// Re-export main types
pub use data_header::DataHeader;
pub use datagram::{ControlBody, DataFrame, Datagram};
pub use error::{WireError, WireResult};
pub use header::{PACKET_HEADER_WIRE_SIZE, decode_packet_header, encode_packet_header};
pub use id::GlobalPacketId;
pub use path_vector::{PathVector, WaypointId};
pub use summary::SummaryVector;
pub use tag::{ControlMarker, MessageType, PathMessageType, TypeTag};
