//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dashagenda_core::DEFAULT_MAX_LINES;
use dashagenda_providers::{DEFAULT_FETCH_CONCURRENCY, DEFAULT_MAX_RESULTS};

use crate::error::{ServerError, ServerResult};

/// Calendar queried when none is configured.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Socket listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the Unix socket.
    pub socket_path: PathBuf,

    /// Timeout for each read or write on a connection.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,

    /// Whether to remove stale socket on startup.
    pub cleanup_stale_socket: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            connection_timeout: Duration::from_secs(30),
            max_connections: 16,
            cleanup_stale_socket: true,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration with the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Builder: set cleanup stale socket.
    pub fn with_cleanup_stale_socket(mut self, cleanup: bool) -> Self {
        self.cleanup_stale_socket = cleanup;
        self
    }
}

/// What goes into each agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaSettings {
    /// Line budget when a request does not set one.
    pub max_lines: usize,
    /// Records fetched per calendar.
    pub max_results: usize,
    /// Calendars to query, in order.
    pub calendar_ids: Vec<String>,
    /// Calendars fetched at once.
    pub fetch_concurrency: usize,
    /// Cap on summary length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_summary_length: Option<usize>,
}

impl Default for AgendaSettings {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_results: DEFAULT_MAX_RESULTS,
            calendar_ids: vec![DEFAULT_CALENDAR_ID.to_string()],
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            max_summary_length: None,
        }
    }
}

impl AgendaSettings {
    /// Builder: set the line budget.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Builder: set the calendars to query.
    pub fn with_calendar_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.calendar_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the settings for values the agenda cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] describing the first problem found.
    pub fn validate(&self) -> ServerResult<()> {
        if self.max_lines == 0 {
            return Err(ServerError::config("agenda.max_lines must be at least 1"));
        }
        if self.max_results == 0 {
            return Err(ServerError::config("agenda.max_results must be at least 1"));
        }
        if self.calendar_ids.is_empty() {
            return Err(ServerError::config("agenda.calendar_ids must not be empty"));
        }
        if let Some(id) = self.calendar_ids.iter().find(|id| id.trim().is_empty()) {
            return Err(ServerError::config(format!(
                "agenda.calendar_ids contains an empty id: {id:?}"
            )));
        }
        Ok(())
    }
}

/// Returns the default socket path.
///
/// Uses `$XDG_RUNTIME_DIR/dashagenda.sock` if available,
/// otherwise falls back to `/tmp/dashagenda-$UID.sock`.
pub fn default_socket_path() -> PathBuf {
    socket_path_for(std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from))
}

fn socket_path_for(runtime_dir: Option<PathBuf>) -> PathBuf {
    match runtime_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join("dashagenda.sock"),
        _ => {
            #[cfg(unix)]
            // SAFETY: getuid has no preconditions and cannot fail.
            let uid = unsafe { libc::getuid() };
            #[cfg(not(unix))]
            let uid = 0;
            PathBuf::from(format!("/tmp/dashagenda-{}.sock", uid))
        }
    }
}
