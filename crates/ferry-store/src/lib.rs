//! # Ferry Store
//!
//! Per-node state for the ferrymesh routing core: the bounded, expiring
//! packet store that backs summary-vector reconciliation, and the
//! contact tracker that suppresses redundant exchanges with recently
//! seen neighbors.
//!
//! Neither structure knows about transports or sessions; the routing
//! engine drives both with explicit timestamps so tests can replay any
//! schedule deterministically.

pub mod contact;
pub mod entry;
pub mod store;

// Re-export main types
pub use contact::ContactTracker;
pub use entry::QueueEntry;
pub use store::{DropReason, PacketStore};
