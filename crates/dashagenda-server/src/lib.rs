//! Agenda daemon.
//!
//! This crate provides the dashagenda server that handles:
//! - Unix socket IPC for client communication
//! - Building agendas from the configured calendars on request
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dashagenda_providers::JsonFileProvider;
//! use dashagenda_server::{
//!     AgendaService, AgendaSettings, ServerConfig, SignalHandler, SocketServer,
//!     make_connection_handler, new_shared_state,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = JsonFileProvider::new("/var/lib/dashagenda/events");
//!     let service = AgendaService::new(Arc::new(provider), AgendaSettings::default());
//!
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!
//!     let server = SocketServer::new(ServerConfig::default()).await?;
//!     let handler = make_connection_handler(new_shared_state(), service);
//!     server
//!         .run_until_shutdown(handler, signals.shutdown().wait())
//!         .await;
//!     Ok(())
//! }
//! ```

mod agenda;
mod config;
mod error;
mod handler;
mod signals;
mod socket;

pub use agenda::AgendaService;
pub use config::{AgendaSettings, DEFAULT_CALENDAR_ID, ServerConfig, default_socket_path};
pub use error::{ServerError, ServerResult};
pub use handler::{
    ConnectionFuture, RequestHandler, ServerState, SharedState, make_connection_handler,
    new_shared_state,
};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
pub use socket::{Connection, SocketServer};
