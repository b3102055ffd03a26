//! Top-level error type for node drivers

use thiserror::Error;

use ferry_core::TransportError;

/// Anything that can go wrong driving a node.
#[derive(Debug, Error)]
pub enum FerryError {
    /// A transport binding failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The node's run loop has already exited.
    #[error("node has stopped")]
    NodeStopped,
}

/// Result alias for node-driver operations.
pub type FerryResult<T> = Result<T, FerryError>;
