//! Wire codec error types

use thiserror::Error;

/// Errors produced while decoding wire bytes.
///
/// Decode failures are ordinary values: a malformed frame from the
/// network is dropped and logged by the caller, never propagated as a
/// panic. Size-contract violations on the encode side are programming
/// bugs and are caught by debug assertions instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Frame ended before the advertised content.
    #[error("Truncated frame: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Type tag byte did not name a known message type.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Control marker byte did not name a known marker.
    #[error("Unknown control marker: {0}")]
    UnknownMarker(u8),

    /// Empty frame where at least a marker byte was expected.
    #[error("Empty frame")]
    Empty,
}

/// Result type for codec operations.
pub type WireResult<T> = Result<T, WireError>;
