//! Errors raised while moving envelopes over the agenda socket.
//!
//! Every frame is a big-endian `u32` length followed by that many bytes of
//! JSON. These errors cover the frame layer and the request/response pairing
//! on top of it; a request the server understood but refused travels as an
//! error response instead.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A frame could not be read, written or matched to its request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The length prefix is above [`crate::MAX_MESSAGE_SIZE`].
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    MessageTooLarge { size: u32, max: u32 },

    /// The frame body is not a valid envelope.
    #[error("invalid envelope JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered a different request.
    #[error("response id {received} does not match request id {expected}")]
    RequestIdMismatch { expected: String, received: String },

    /// Socket read or write failed.
    #[error("socket I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The peer hung up partway through a frame.
    #[error("truncated frame: expected {expected} bytes, got {received}")]
    IncompleteMessage { expected: usize, received: usize },

    /// A frame with a zero length prefix.
    #[error("empty frame")]
    EmptyMessage,

    /// The socket stayed idle past the connection timeout.
    #[error("timed out waiting to {operation}")]
    Timeout { operation: String },
}
