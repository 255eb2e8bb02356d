//! Server command: runs the agenda daemon in the foreground.
//!
//! Wires the JSON file source, the agenda service and the socket listener
//! together, then serves until SIGTERM or SIGINT.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use dashagenda_providers::JsonFileProvider;
use dashagenda_server::{
    AgendaService, ServerConfig, SignalHandler, SocketServer, make_connection_handler,
    new_shared_state,
};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Starts the server daemon in the foreground.
///
/// Returns once a shutdown signal has been received and the socket file has
/// been removed.
pub async fn run(cli: &Cli, config: &ClientConfig, events_dir: Option<&Path>) -> ClientResult<()> {
    config.validate()?;

    let events_dir = config.events_dir(events_dir);
    if !events_dir.is_dir() {
        warn!(
            dir = %events_dir.display(),
            "events directory does not exist; every calendar will report as failed"
        );
    }

    let provider = JsonFileProvider::new(&events_dir);
    let service = AgendaService::new(Arc::new(provider), config.agenda.clone());
    info!(
        dir = %events_dir.display(),
        calendars = ?config.agenda.calendar_ids,
        "agenda source ready"
    );

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener();

    let server_config = server_config(cli, config);
    let server = SocketServer::new(server_config).await?;
    info!(path = %server.socket_path().display(), "Server listening");

    let handler = make_connection_handler(new_shared_state(), service);
    server
        .run_until_shutdown(handler, signal_handler.shutdown().wait())
        .await;

    info!("Server stopped");
    Ok(())
}

/// Builds the listener configuration from flags and the config file.
pub fn server_config(cli: &Cli, config: &ClientConfig) -> ServerConfig {
    ServerConfig::new(config.socket_path(cli.socket_path.as_deref()))
        .with_connection_timeout(config.timeout(cli.timeout))
        .with_max_connections(config.server.max_connections)
}
