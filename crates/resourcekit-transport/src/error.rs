//! Transport error types.

use resourcekit_core::error::Error;
use thiserror::Error as ThisError;

/// Errors that can occur during transport operations.
#[derive(ThisError, Debug)]
pub enum TransportError {
    /// I/O error from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Message was too large.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Connection was closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Transport is not connected.
    #[error("Not connected")]
    NotConnected,
}

impl TransportError {
    /// Whether the connection can keep going after this error.
    ///
    /// Malformed or oversized messages only affect the message itself.
    #[must_use]
    pub const fn is_message_error(&self) -> bool {
        matches!(self, Self::Json(_) | Self::MessageTooLarge { .. })
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Json(e) => Self::parse_with_source("malformed message", e),
            TransportError::MessageTooLarge { size, max } => {
                Self::invalid_request(format!("message too large: {size} bytes (max: {max})"))
            }
            other => Self::transport(other.to_string(), other),
        }
    }
}
