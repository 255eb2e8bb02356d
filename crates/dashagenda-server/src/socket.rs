//! Unix socket listener for IPC.
//!
//! An async Unix socket server speaking the dashagenda protocol. Each
//! connection holds a semaphore permit, so at most `max_connections`
//! clients are served at once.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use dashagenda_protocol::{
    Envelope, ProtocolError, Request, Response, read_message, write_message,
};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Unix socket server for handling client connections.
pub struct SocketServer {
    config: ServerConfig,
    listener: UnixListener,
    /// Limits concurrent connections.
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds the socket named in `config`.
    ///
    /// A leftover socket file nobody answers on is removed first when
    /// `cleanup_stale_socket` is set. A live socket is never replaced.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        prepare_socket_path(&config).await?;

        let listener = UnixListener::bind(&config.socket_path)?;
        info!(
            path = %config.socket_path.display(),
            max_connections = config.max_connections,
            "Socket server listening"
        );

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections.max(1)));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Accepts a single connection.
    ///
    /// Waits for a free connection slot before accepting.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .connection_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::config("connection limiter closed"))?;

        let (stream, _addr) = self.listener.accept().await?;
        debug!(
            available = self.connection_semaphore.available_permits(),
            "Accepted new connection"
        );

        Ok(Connection {
            stream,
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Runs the accept loop, spawning `handler` for each connection.
    ///
    /// Runs until the task is dropped. Accept errors are logged and the loop
    /// keeps going.
    pub async fn run<F, Fut>(&self, handler: F)
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler(connection));
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S)
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            _ = self.run(handler) => {}
            _ = shutdown => {
                info!("Shutdown signal received");
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        let path = &self.config.socket_path;
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove socket file"),
        }
    }
}

/// Makes sure nothing but a stale socket sits at the configured path.
async fn prepare_socket_path(config: &ServerConfig) -> ServerResult<()> {
    let socket_path = &config.socket_path;

    if let Some(parent) = socket_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(ServerError::socket_path_invalid(
            parent.to_string_lossy().to_string(),
        ));
    }

    if !socket_path.exists() {
        return Ok(());
    }

    let in_use = || ServerError::socket_in_use(socket_path.to_string_lossy().to_string());
    if !config.cleanup_stale_socket {
        return Err(in_use());
    }

    // Something answering means another server owns the path.
    if UnixStream::connect(socket_path).await.is_ok() {
        return Err(in_use());
    }

    info!(path = %socket_path.display(), "Removing stale socket");
    std::fs::remove_file(socket_path)?;
    Ok(())
}

/// A client connection to the server.
pub struct Connection {
    stream: UnixStream,
    timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Reads a request envelope from the connection.
    ///
    /// Returns `Ok(None)` if the connection was closed cleanly.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        match tokio::time::timeout(self.timeout, read_message(&mut self.stream)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServerError::Protocol(ProtocolError::Timeout {
                operation: "read request".to_string(),
            })),
        }
    }

    /// Writes a response envelope to the connection.
    pub async fn write_response(&mut self, envelope: &Envelope<Response>) -> ServerResult<()> {
        match tokio::time::timeout(self.timeout, write_message(&mut self.stream, envelope)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServerError::Protocol(ProtocolError::Timeout {
                operation: "write response".to_string(),
            })),
        }
    }

    /// Sends a response for the given request.
    pub async fn respond(
        &mut self,
        request_id: impl Into<String>,
        response: Response,
    ) -> ServerResult<()> {
        let envelope = Envelope::response(request_id, response);
        self.write_response(&envelope).await
    }
}
