//! Error types shared across the ferrymesh stack

use thiserror::Error;

/// Errors related to node addressing
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),
}

/// Errors related to transport bindings
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Peer not connected: {0}")]
    PeerNotConnected(String),

    #[error("Binding closed")]
    BindingClosed,

    #[error("Binding I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
