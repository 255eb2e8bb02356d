//! Unix socket client for communicating with the dashagenda server.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;
use tracing::debug;
use uuid::Uuid;

use dashagenda_protocol::{
    AgendaPayload, Envelope, ProtocolError, Request, Response, StatusInfo, read_message,
    write_message,
};

use crate::error::{ClientError, ClientResult};

/// Client for communicating with the dashagenda server over a Unix socket.
#[derive(Debug, Clone)]
pub struct SocketClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    /// Creates a new socket client.
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    /// Creates a socket client with the default socket path.
    pub fn with_defaults() -> Self {
        Self::new(
            dashagenda_server::default_socket_path(),
            Duration::from_secs(5),
        )
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Checks if the server socket exists.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends a request and waits for the matching response.
    ///
    /// Each step (connect, send, receive) gets the full timeout.
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(&request_id, request);

        debug!(
            socket = %self.socket_path.display(),
            request_id = %request_id,
            request = envelope.payload.name(),
            "connecting to server"
        );

        let mut stream = self
            .timed("connecting", UnixStream::connect(&self.socket_path))
            .await?
            .map_err(|e| {
                ClientError::Connection(format!(
                    "failed to connect to {}: {}",
                    self.socket_path.display(),
                    e
                ))
            })?;

        self.timed("sending request", write_message(&mut stream, &envelope))
            .await??;
        debug!("request sent, waiting for response");

        let response: Envelope<Response> = self
            .timed("reading response", read_message(&mut stream))
            .await??
            .ok_or_else(|| {
                ClientError::Connection("server closed the connection without answering".into())
            })?;

        if response.request_id != request_id {
            return Err(ProtocolError::RequestIdMismatch {
                expected: request_id,
                received: response.request_id,
            }
            .into());
        }

        debug!(request_id = %response.request_id, "response received");
        Ok(response.payload)
    }

    /// Asks the server for an agenda.
    pub async fn get_agenda(&self, max_lines: Option<usize>) -> ClientResult<AgendaPayload> {
        match self.send(Request::GetAgenda { max_lines }).await? {
            Response::Agenda { agenda } => Ok(agenda),
            other => Err(unexpected(other)),
        }
    }

    /// Asks the server for its status.
    pub async fn status(&self) -> ClientResult<StatusInfo> {
        match self.send(Request::Status).await? {
            Response::Status { info } => Ok(info),
            other => Err(unexpected(other)),
        }
    }

    /// Pings the server to check if it's alive.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }

    async fn timed<F: Future>(&self, operation: &str, future: F) -> ClientResult<F::Output> {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| {
                ClientError::Timeout(format!(
                    "{} after {}ms",
                    operation,
                    self.timeout.as_millis()
                ))
            })
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { error } => ClientError::Rejected {
            code: error.code,
            message: error.message,
        },
        other => ClientError::UnexpectedResponse(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dashagenda_protocol::ErrorCode;
    use dashagenda_providers::StaticProvider;
    use dashagenda_server::{
        AgendaService, AgendaSettings, ServerConfig, SocketServer, make_connection_handler,
        new_shared_state,
    };
    use tempfile::tempdir;
    use tokio::net::UnixListener;

    async fn spawn_server(socket_path: &Path) -> tokio::task::JoinHandle<()> {
        let provider = StaticProvider::new().with_calendar("primary", vec![]);
        let service = AgendaService::new(Arc::new(provider), AgendaSettings::default());
        let server = SocketServer::new(ServerConfig::new(socket_path)).await.unwrap();
        let handler = make_connection_handler(new_shared_state(), service);
        tokio::spawn(async move { server.run(handler).await })
    }

    #[test]
    fn socket_client_creation() {
        let client = SocketClient::new("/tmp/test.sock", Duration::from_secs(10));
        assert_eq!(client.socket_path(), Path::new("/tmp/test.sock"));
        assert!(!client.socket_exists());
    }

    #[test]
    fn default_client() {
        let client = SocketClient::with_defaults();
        assert!(client.socket_path().to_string_lossy().contains("dashagenda"));
    }

    #[tokio::test]
    async fn missing_socket_is_connection_error() {
        let dir = tempdir().unwrap();
        let client = SocketClient::new(dir.path().join("none.sock"), Duration::from_secs(1));

        let err = client.send(Request::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert!(!client.ping().await);
    }

    #[tokio::test]
    async fn talks_to_running_server() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("agenda.sock");
        let server = spawn_server(&socket_path).await;
        let client = SocketClient::new(&socket_path, Duration::from_secs(5));

        assert!(client.ping().await);

        let agenda = client.get_agenda(Some(10)).await.unwrap();
        assert_eq!(agenda, AgendaPayload::default());

        let status = client.status().await.unwrap();
        assert_eq!(status.provider, "static");
        assert_eq!(status.agendas_served, 1);

        server.abort();
    }

    #[tokio::test]
    async fn server_errors_become_rejections() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("agenda.sock");
        let server = spawn_server(&socket_path).await;
        let client = SocketClient::new(&socket_path, Duration::from_secs(5));

        let err = client.get_agenda(Some(0)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                code: ErrorCode::InvalidRequest,
                ..
            }
        ));

        server.abort();
    }

    #[tokio::test]
    async fn mismatched_request_id_is_rejected() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("liar.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let fake = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _request: Envelope<Request> = read_message(&mut stream).await.unwrap().unwrap();
            write_message(&mut stream, &Envelope::response("someone-else", Response::Pong))
                .await
                .unwrap();
        });

        let client = SocketClient::new(&socket_path, Duration::from_secs(5));
        let err = client.send(Request::Ping).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::RequestIdMismatch { .. })
        ));

        fake.await.unwrap();
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("silent.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let silent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(stream);
        });

        let client = SocketClient::new(&socket_path, Duration::from_millis(50));
        let err = client.send(Request::Ping).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));

        silent.abort();
    }
}
