//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

use dashagenda_protocol::{ErrorCode, ProtocolError};
use dashagenda_server::ServerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An events file could not be read or parsed.
    #[error("cannot read events from {path}: {message}")]
    EventsFile { path: PathBuf, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection to server failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Protocol/framing error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Request timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The server answered with an error response.
    #[error("server refused request ({}): {message}", .code.description())]
    Rejected { code: ErrorCode, message: String },

    /// The server answered with a response of the wrong kind.
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),

    /// The daemon could not be started.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an events file error.
    pub fn events_file(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::EventsFile {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_includes_code_description() {
        let err = ClientError::Rejected {
            code: ErrorCode::InvalidRequest,
            message: "max_lines must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "server refused request (The request was invalid): max_lines must be at least 1"
        );
    }

    #[test]
    fn events_file_display() {
        let err = ClientError::events_file("/tmp/events.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "cannot read events from /tmp/events.json: expected value at line 1"
        );
    }

    #[test]
    fn protocol_errors_convert() {
        let err: ClientError = ProtocolError::RequestIdMismatch {
            expected: "a".into(),
            received: "b".into(),
        }
        .into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
