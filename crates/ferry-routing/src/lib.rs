//! # Ferry Routing
//!
//! The anti-entropy routing core of ferrymesh.
//!
//! A node periodically beacons its presence; when two nodes hear each
//! other, the one with the lower numeric address opens a summary-vector
//! exchange and both sides hand over the buffered packets the other is
//! missing. [`SessionEngine`] implements that whole behavior as a
//! deterministic message-in, actions-out function over a bounded store,
//! leaving timers and sockets to the node driver.
//!
//! The engine is infallible on purpose: malformed network input is
//! logged and dropped, and send failures surface through the host's
//! error capability, so no routing call returns a `Result`.

pub mod engine;

// Re-export main types
pub use engine::{Outbound, SessionEngine};
