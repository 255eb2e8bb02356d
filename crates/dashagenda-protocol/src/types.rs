//! Request and response types for the dashagenda protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

/// Wrapper around every request and response on the wire.
///
/// The server copies `request_id` from the request into its response so the
/// client can tell the two belong together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Wire format version, [`PROTOCOL_VERSION`] for everything sent by this crate.
    pub protocol_version: String,
    /// Chosen by the client, echoed by the server.
    pub request_id: String,
    /// The actual payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps `payload` under the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    /// Wraps a client request.
    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    /// Wraps a server response.
    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Returns true if the peer speaks the same protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// What a client can ask the server for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Build and return the agenda.
    GetAgenda {
        /// Line budget for this request. The server's configured budget is
        /// used when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_lines: Option<usize>,
    },

    /// Get server status.
    Status,

    /// Liveness check.
    Ping,
}

impl Request {
    /// Creates a GetAgenda request using the server's line budget.
    pub fn get_agenda() -> Self {
        Self::GetAgenda { max_lines: None }
    }

    /// Creates a GetAgenda request with an explicit line budget.
    pub fn get_agenda_with_max_lines(max_lines: usize) -> Self {
        Self::GetAgenda {
            max_lines: Some(max_lines),
        }
    }

    /// Returns the request name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAgenda { .. } => "get_agenda",
            Self::Status => "status",
            Self::Ping => "ping",
        }
    }
}

/// A rendered agenda and how it was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaPayload {
    /// The agenda text, ready for display.
    pub text: String,
    /// Number of events written to `text`.
    pub event_count: usize,
    /// Number of records that could not be normalized.
    #[serde(default)]
    pub rejected_count: usize,
    /// Number of valid events left out because the line budget ran out.
    #[serde(default)]
    pub dropped_count: usize,
    /// Calendars that could not be fetched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_calendars: Vec<String>,
}

impl AgendaPayload {
    /// Creates a payload holding `text` and no counts.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// What the server answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// The rendered agenda.
    Agenda {
        #[serde(flatten)]
        agenda: AgendaPayload,
    },

    /// Counters and settings of the running server.
    Status {
        /// Status details.
        #[serde(flatten)]
        info: StatusInfo,
    },

    /// Error response.
    Error {
        /// Error details.
        #[serde(flatten)]
        error: ErrorResponse,
    },

    /// Answer to [`Request::Ping`].
    Pong,
}

impl Response {
    /// Creates an Agenda response.
    pub fn agenda(agenda: AgendaPayload) -> Self {
        Self::Agenda { agenda }
    }

    /// Creates a Status response.
    pub fn status(info: StatusInfo) -> Self {
        Self::Status { info }
    }

    /// Creates an Error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    /// Returns true if this is not an error response.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// Returns the error body, if any.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Server status information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Server uptime in seconds.
    pub uptime_seconds: u64,

    /// Name of the event source (e.g. "json-file").
    pub provider: String,

    /// Calendars queried for each agenda, in order.
    pub calendars: Vec<String>,

    /// Line budget used when a request does not set one.
    pub max_lines: usize,

    /// Number of agendas served since startup.
    pub agendas_served: u64,

    /// When the last agenda was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_agenda_at: Option<DateTime<Utc>>,
}

impl StatusInfo {
    /// Creates a new StatusInfo.
    pub fn new(uptime_seconds: u64, provider: impl Into<String>, max_lines: usize) -> Self {
        Self {
            uptime_seconds,
            provider: provider.into(),
            calendars: Vec::new(),
            max_lines,
            agendas_served: 0,
            last_agenda_at: None,
        }
    }

    /// Builder: set the calendar list.
    pub fn with_calendars(mut self, calendars: Vec<String>) -> Self {
        self.calendars = calendars;
        self
    }

    /// Builder: set agenda counters.
    pub fn with_agendas_served(mut self, served: u64, last: Option<DateTime<Utc>>) -> Self {
        self.agendas_served = served;
        self.last_agenda_at = last;
        self
    }
}

/// Why the server refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Something went wrong inside the server.
    InternalError,

    /// The request was well-formed but its values were not acceptable.
    InvalidRequest,

    /// The request used a protocol version the server does not speak.
    UnsupportedVersion,

    /// Request timed out.
    Timeout,

    /// The server stopped accepting work.
    ShuttingDown,
}

impl ErrorCode {
    /// Returns a human-readable description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InternalError => "An internal error occurred",
            Self::InvalidRequest => "The request was invalid",
            Self::UnsupportedVersion => "Unsupported protocol version",
            Self::Timeout => "The request timed out",
            Self::ShuttingDown => "Server is shutting down",
        }
    }
}

/// Body of [`Response::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Details for the person reading the error.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_versions() {
        let current = Envelope::request("a1", Request::Status);
        assert_eq!(current.protocol_version, PROTOCOL_VERSION);
        assert!(current.is_compatible());

        let future: Envelope<Request> = serde_json::from_str(
            r#"{"protocol_version":"2","request_id":"a1","payload":{"type":"status"}}"#,
        )
        .unwrap();
        assert!(!future.is_compatible());
        assert_eq!(future.request_id, "a1");
    }

    #[test]
    fn request_serde_get_agenda() {
        let json = serde_json::to_string(&Request::get_agenda()).unwrap();
        assert_eq!(json, r#"{"type":"get_agenda"}"#);

        let json = serde_json::to_string(&Request::get_agenda_with_max_lines(10)).unwrap();
        assert_eq!(json, r#"{"type":"get_agenda","max_lines":10}"#);

        let parsed: Request = serde_json::from_str(r#"{"type":"get_agenda"}"#).unwrap();
        assert_eq!(parsed, Request::GetAgenda { max_lines: None });
    }

    #[test]
    fn request_unknown_type_is_rejected() {
        let result: Result<Request, _> = serde_json::from_str(r#"{"type":"shutdown"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn request_names() {
        assert_eq!(Request::get_agenda().name(), "get_agenda");
        assert_eq!(Request::Status.name(), "status");
        assert_eq!(Request::Ping.name(), "ping");
    }

    #[test]
    fn response_serde_agenda() {
        let response = Response::agenda(AgendaPayload {
            text: "\nTuesday Mar 05\n  9:00AM: Standup\n".to_string(),
            event_count: 1,
            rejected_count: 2,
            dropped_count: 0,
            failed_calendars: vec![],
        });

        let value = serde_json::to_value(&response).unwrap();
        insta::assert_json_snapshot!(value, @r#"
        {
          "dropped_count": 0,
          "event_count": 1,
          "rejected_count": 2,
          "text": "\nTuesday Mar 05\n  9:00AM: Standup\n",
          "type": "agenda"
        }
        "#);

        let parsed: Response = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn unit_variants_are_bare_tags() {
        assert_eq!(serde_json::to_string(&Request::Ping).unwrap(), r#"{"type":"ping"}"#);
        assert_eq!(serde_json::to_string(&Response::Pong).unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn response_serde_error() {
        let response = Response::error(ErrorCode::InvalidRequest, "max_lines must be at least 1");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","code":"invalid_request","message":"max_lines must be at least 1"}"#
        );

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.as_error().map(|e| e.code), Some(ErrorCode::InvalidRequest));
    }

    #[test]
    fn response_serde_status() {
        let info = StatusInfo::new(3600, "json-file", 36)
            .with_calendars(vec!["primary".to_string(), "family".to_string()]);
        let response = Response::status(info);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("uptime_seconds"));
        assert!(json.contains("3600"));
        assert!(json.contains("family"));
        assert!(!json.contains("last_agenda_at"));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed, response);
    }

    #[test]
    fn error_response_display() {
        let error = ErrorResponse::new(ErrorCode::UnsupportedVersion, "got 2");
        assert_eq!(error.to_string(), "Unsupported protocol version: got 2");
    }

    #[test]
    fn envelope_wire_shape() {
        let request = Envelope::request("req-abc", Request::get_agenda_with_max_lines(12));
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"protocol_version":"1","request_id":"req-abc","payload":{"type":"get_agenda","max_lines":12}}"#
        );
    }
}
