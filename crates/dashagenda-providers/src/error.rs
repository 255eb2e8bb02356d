//! Error types for event sources and normalization.
//!
//! [`ProviderError`] covers failures to obtain records for a calendar.
//! [`NormalizationError`] covers a single record that cannot be turned into
//! an agenda event; it never aborts a batch.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// The category of a provider error.
///
/// This enum provides a high-level classification of errors for use in
/// protocol responses and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The requested calendar does not exist in this source.
    NotFound,
    /// The source returned data that could not be decoded.
    InvalidResponse,
    /// Reading from the source failed.
    IoError,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Internal provider error - unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError)
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidResponse => "invalid_response",
            Self::IoError => "io_error",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that occurred while fetching events from a provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g., "json-file").
    provider: Option<String>,
    /// The calendar being fetched, if known.
    calendar_id: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            calendar_id: None,
            source: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::IoError, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the calendar this error relates to.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the calendar id, if set.
    pub fn calendar_id(&self) -> Option<&str> {
        self.calendar_id.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref calendar_id) = self.calendar_id {
            write!(f, " (calendar {})", calendar_id)?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Why a raw record could not become an agenda event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// The record has neither a date nor a timestamp.
    #[error("event has no start date or time")]
    MissingStart,

    /// The date field is not a `YYYY-MM-DD` calendar date.
    #[error("invalid start date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The timestamp field is not RFC 3339.
    #[error("invalid start time {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The date has no representable local start in the local timezone.
    #[error("no local start of day exists for {date}")]
    NonexistentLocalDate { date: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ProviderErrorCode::IoError.is_retryable());
        assert!(!ProviderErrorCode::NotFound.is_retryable());
        assert!(!ProviderErrorCode::InvalidResponse.is_retryable());
    }

    #[test]
    fn error_code_display() {
        assert_eq!(ProviderErrorCode::NotFound.as_str(), "not_found");
        assert_eq!(
            ProviderErrorCode::ConfigurationError.to_string(),
            "configuration_error"
        );
    }

    #[test]
    fn provider_error_creation() {
        let err = ProviderError::not_found("no such calendar");
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.message(), "no such calendar");
        assert!(err.provider().is_none());
        assert!(err.calendar_id().is_none());
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::invalid_response("expected an items array")
            .with_provider("json-file")
            .with_calendar_id("family");
        let display = err.to_string();
        assert_eq!(
            display,
            "[json-file] invalid_response: expected an items array (calendar family)"
        );
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::io("failed to read events").with_source(io_err);
        assert!(err.source().is_some());
        assert!(err.is_retryable());
    }

    #[test]
    fn normalization_error_display() {
        assert_eq!(
            NormalizationError::MissingStart.to_string(),
            "event has no start date or time"
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            NormalizationError::NonexistentLocalDate { date }.to_string(),
            "no local start of day exists for 2024-03-10"
        );
    }

    #[test]
    fn normalization_error_keeps_value() {
        let source = NaiveDate::parse_from_str("2024-13-01", "%Y-%m-%d").unwrap_err();
        let err = NormalizationError::InvalidDate {
            value: "2024-13-01".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid start date \"2024-13-01\""));
    }
}
