//! # Ferry Core
//!
//! Core types, traits, and errors for the ferrymesh routing stack.
//!
//! Ferrymesh is a delay-tolerant, opportunistic routing protocol for
//! intermittently connected wireless networks. This crate provides the
//! foundational abstractions shared by the wire codec, the packet
//! store, and the session engine:
//!
//! - [`NodeAddress`]: 32-bit node addressing with the numeric ordering
//!   the session tie-break relies on
//! - [`Timestamp`] and [`Clock`]: nanosecond time with a manual clock
//!   for deterministic tests
//! - [`Transport`] / [`BroadcastTransport`]: datagram exchange with the
//!   local segment
//! - [`ForwardHandle`], [`DeliveryHandle`], [`ErrorHandle`]: borrowed
//!   capabilities the host network layer lends to the core
//! - [`FerryConfig`]: the recognized tuning options and their defaults

pub mod address;
pub mod config;
pub mod error;
pub mod handles;
pub mod mock_transport;
pub mod packet;
pub mod time;
pub mod transport;

// Re-export main types
pub use address::NodeAddress;
pub use config::{ConfigWarning, FerryConfig};
pub use error::{AddressError, TransportError};
pub use handles::{DeliveryHandle, ErrorHandle, ForwardHandle};
pub use mock_transport::{MockSegment, MockTransport};
pub use packet::PacketHeader;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
pub use transport::{BroadcastTransport, FERRY_PORT, Transport};
