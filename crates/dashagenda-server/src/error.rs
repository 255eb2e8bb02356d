//! Server error types.

use std::io;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, encoding, etc.).
    #[error("Protocol error: {0}")]
    Protocol(#[from] dashagenda_protocol::ProtocolError),

    /// Socket path already in use.
    #[error("Socket path already in use: {path}")]
    SocketInUse { path: String },

    /// Socket path parent directory does not exist.
    #[error("Socket path parent directory does not exist: {path}")]
    SocketPathInvalid { path: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a socket in use error.
    pub fn socket_in_use(path: impl Into<String>) -> Self {
        Self::SocketInUse { path: path.into() }
    }

    /// Creates a socket path invalid error.
    pub fn socket_path_invalid(path: impl Into<String>) -> Self {
        Self::SocketPathInvalid { path: path.into() }
    }

    /// Returns true if this error means the peer went away or stalled.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
            ),
            Self::Protocol(dashagenda_protocol::ProtocolError::Timeout { .. }) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashagenda_protocol::ProtocolError;

    #[test]
    fn error_display() {
        let err = ServerError::socket_in_use("/run/user/1000/dashagenda.sock");
        assert_eq!(
            err.to_string(),
            "Socket path already in use: /run/user/1000/dashagenda.sock"
        );
        assert_eq!(
            ServerError::config("max_lines must be positive").to_string(),
            "Configuration error: max_lines must be positive"
        );
    }

    #[test]
    fn disconnect_classification() {
        let reset = ServerError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(reset.is_disconnect());

        let timeout = ServerError::from(ProtocolError::Timeout {
            operation: "read request".to_string(),
        });
        assert!(timeout.is_disconnect());

        assert!(!ServerError::from(ProtocolError::EmptyMessage).is_disconnect());
    }
}
