//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/dashagenda/config.toml` by default:
//!
//! ```toml
//! [agenda]
//! max_lines = 36
//! calendar_ids = ["primary", "family"]
//!
//! [source]
//! events_dir = "/home/me/.local/share/dashagenda/events"
//!
//! [server]
//! timeout = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dashagenda_server::AgendaSettings;

use crate::error::{ClientError, ClientResult};

/// Configuration for the dashagenda client and server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// What goes into each agenda.
    pub agenda: AgendaSettings,

    /// Where raw events come from.
    pub source: SourceSettings,

    /// Server/connection settings.
    pub server: ServerSettings,
}

/// Event source settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory holding `<calendar_id>.json` files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_dir: Option<PathBuf>,
}

/// Server/connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Path to the server socket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds.
    pub timeout: u64,

    /// Clients served at once.
    pub max_connections: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout: 5,
            max_connections: 16,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Checks every section for values that cannot work.
    pub fn validate(&self) -> ClientResult<()> {
        self.agenda
            .validate()
            .map_err(|e| ClientError::config(e.to_string()))?;
        if self.server.timeout == 0 {
            return Err(ClientError::config("server.timeout must be at least 1"));
        }
        if self.server.max_connections == 0 {
            return Err(ClientError::config(
                "server.max_connections must be at least 1",
            ));
        }
        Ok(())
    }

    /// Returns the socket path, preferring `override_path`.
    pub fn socket_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.server.socket_path.clone())
            .unwrap_or_else(dashagenda_server::default_socket_path)
    }

    /// Returns the events directory, preferring `override_dir`.
    pub fn events_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.source.events_dir.clone())
            .unwrap_or_else(|| Self::default_data_dir().join("events"))
    }

    /// Returns the connection timeout, preferring `override_secs`.
    pub fn timeout(&self, override_secs: Option<u64>) -> Duration {
        Duration::from_secs(override_secs.unwrap_or(self.server.timeout))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dashagenda")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dashagenda")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::parse("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.agenda.max_lines, 36);
        assert_eq!(config.agenda.calendar_ids, vec!["primary".to_string()]);
        assert_eq!(config.server.timeout, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ClientConfig::parse(
            r#"
[agenda]
max_lines = 20
calendar_ids = ["work", "family"]
max_summary_length = 30

[source]
events_dir = "/srv/events"
"#,
        )
        .unwrap();

        assert_eq!(config.agenda.max_lines, 20);
        assert_eq!(config.agenda.max_results, 20);
        assert_eq!(config.agenda.fetch_concurrency, 4);
        assert_eq!(config.agenda.max_summary_length, Some(30));
        assert_eq!(
            config.agenda.calendar_ids,
            vec!["work".to_string(), "family".to_string()]
        );
        assert_eq!(config.events_dir(None), PathBuf::from("/srv/events"));
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn unknown_types_are_parse_errors() {
        assert!(ClientConfig::parse("[agenda]\nmax_lines = \"many\"\n").is_err());
    }

    #[test]
    fn validation_reports_bad_values() {
        let mut config = ClientConfig::default();
        config.agenda.max_lines = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let mut config = ClientConfig::default();
        config.server.timeout = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_win() {
        let mut config = ClientConfig::default();
        config.server.socket_path = Some(PathBuf::from("/from/config.sock"));
        config.source.events_dir = Some(PathBuf::from("/from/config"));

        assert_eq!(
            config.socket_path(Some(Path::new("/from/cli.sock"))),
            PathBuf::from("/from/cli.sock")
        );
        assert_eq!(config.socket_path(None), PathBuf::from("/from/config.sock"));
        assert_eq!(
            config.events_dir(Some(Path::new("/from/cli"))),
            PathBuf::from("/from/cli")
        );
        assert_eq!(config.timeout(Some(9)), Duration::from_secs(9));
        assert_eq!(config.timeout(None), Duration::from_secs(5));
    }

    #[test]
    fn default_paths_use_dashagenda_dirs() {
        assert!(ClientConfig::default_path().ends_with("dashagenda/config.toml"));
        assert!(
            ClientConfig::default()
                .events_dir(None)
                .ends_with("dashagenda/events")
        );
    }

    #[test]
    fn load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntimeout = 10\nmax_connections = 2\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.server.timeout, 10);
        assert_eq!(config.server.max_connections, 2);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn dump_parses_back() {
        let mut config = ClientConfig::default();
        config.agenda.max_summary_length = Some(40);
        config.source.events_dir = Some(PathBuf::from("/srv/events"));

        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ClientConfig::parse(&text).unwrap(), config);
    }
}
