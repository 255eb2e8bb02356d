//! Request/response dispatch handler.
//!
//! This module provides the request handler that routes incoming requests
//! to the agenda pipeline and produces responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{Span, debug, warn};

use dashagenda_protocol::{
    Envelope, ErrorCode, PROTOCOL_VERSION, Request, Response, StatusInfo,
};

use crate::agenda::AgendaService;
use crate::error::ServerResult;
use crate::socket::Connection;

/// Server state shared across all connections.
#[derive(Debug)]
pub struct ServerState {
    /// Server start time.
    start_time: DateTime<Utc>,
    /// Number of agendas built.
    agendas_served: u64,
    /// When the last agenda was built.
    last_agenda_at: Option<DateTime<Utc>>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    /// Creates a new server state.
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            agendas_served: 0,
            last_agenda_at: None,
        }
    }

    /// Returns the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        let duration = Utc::now() - self.start_time;
        duration.num_seconds().max(0) as u64
    }

    /// Records that an agenda was served.
    pub fn record_agenda(&mut self) {
        self.agendas_served += 1;
        self.last_agenda_at = Some(Utc::now());
    }

    /// Returns the number of agendas served.
    pub fn agendas_served(&self) -> u64 {
        self.agendas_served
    }

    /// Returns the status info for the given service.
    pub fn status_info(&self, service: &AgendaService) -> StatusInfo {
        let settings = service.settings();
        StatusInfo::new(
            self.uptime_seconds(),
            service.provider_name(),
            settings.max_lines,
        )
        .with_calendars(settings.calendar_ids.clone())
        .with_agendas_served(self.agendas_served, self.last_agenda_at)
    }
}

/// Shared server state wrapped in an Arc<RwLock>.
pub type SharedState = Arc<RwLock<ServerState>>;

/// Creates a new shared state.
pub fn new_shared_state() -> SharedState {
    Arc::new(RwLock::new(ServerState::new()))
}

/// Request handler that processes incoming requests and produces responses.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    state: SharedState,
    service: AgendaService,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(state: SharedState, service: AgendaService) -> Self {
        Self { state, service }
    }

    /// Handles a single request and returns the response.
    #[tracing::instrument(skip(self, request), fields(request_type = request.name(), duration_ms))]
    pub async fn handle(&self, request: &Request) -> Response {
        let start = std::time::Instant::now();

        let response = match request {
            Request::Ping => {
                debug!("Handling Ping request");
                Response::Pong
            }
            Request::Status => {
                debug!("Handling Status request");
                let state = self.state.read().await;
                Response::status(state.status_info(&self.service))
            }
            Request::GetAgenda { max_lines } => {
                debug!(?max_lines, "Handling GetAgenda request");
                match max_lines {
                    Some(0) => Response::error(
                        ErrorCode::InvalidRequest,
                        "max_lines must be at least 1",
                    ),
                    _ => {
                        let agenda = self.service.build(*max_lines).await;
                        self.state.write().await.record_agenda();
                        Response::agenda(agenda)
                    }
                }
            }
        };

        let duration = start.elapsed();
        Span::current().record("duration_ms", duration.as_millis());
        debug!(duration_ms = duration.as_millis(), "Request handled");

        response
    }

    /// Checks the envelope version before dispatching.
    pub async fn handle_envelope(&self, envelope: &Envelope<Request>) -> Response {
        if !envelope.is_compatible() {
            warn!(
                version = %envelope.protocol_version,
                expected = %PROTOCOL_VERSION,
                "Incompatible protocol version"
            );
            return Response::error(
                ErrorCode::UnsupportedVersion,
                format!(
                    "server speaks protocol {}, request used {}",
                    PROTOCOL_VERSION, envelope.protocol_version
                ),
            );
        }
        self.handle(&envelope.payload).await
    }

    /// Handles a connection, processing all requests until the connection closes.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        loop {
            match conn.read_request().await {
                Ok(Some(envelope)) => {
                    let response = self.handle_envelope(&envelope).await;
                    conn.respond(&envelope.request_id, response).await?;
                }
                Ok(None) => {
                    debug!("Client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Error reading request");
                    return Err(e);
                }
            }
        }
    }
}

/// Future returned by connection handlers.
pub type ConnectionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Creates a connection handler function for use with `SocketServer::run`.
pub fn make_connection_handler(
    state: SharedState,
    service: AgendaService,
) -> impl Fn(Connection) -> ConnectionFuture + Send + Sync + 'static {
    let handler = RequestHandler::new(state, service);
    move |conn| {
        let handler = handler.clone();
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await
                && !e.is_disconnect()
            {
                warn!(error = %e, "Connection handler error");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgendaSettings;
    use dashagenda_protocol::AgendaPayload;
    use dashagenda_providers::StaticProvider;

    fn handler() -> RequestHandler {
        let provider = StaticProvider::new().with_calendar("primary", vec![]);
        let service = AgendaService::new(Arc::new(provider), AgendaSettings::default());
        RequestHandler::new(new_shared_state(), service)
    }

    #[test]
    fn server_state_uptime() {
        let state = ServerState::new();
        assert!(state.uptime_seconds() < 5);
        assert_eq!(state.agendas_served(), 0);
    }

    #[tokio::test]
    async fn request_handler_ping() {
        let response = handler().handle(&Request::Ping).await;
        assert_eq!(response, Response::Pong);
    }

    #[tokio::test]
    async fn request_handler_status() {
        let handler = handler();
        let response = handler.handle(&Request::Status).await;

        let Response::Status { info } = response else {
            panic!("expected status, got {response:?}");
        };
        assert_eq!(info.provider, "static");
        assert_eq!(info.calendars, vec!["primary".to_string()]);
        assert_eq!(info.max_lines, 36);
        assert_eq!(info.agendas_served, 0);
        assert!(info.last_agenda_at.is_none());
    }

    #[tokio::test]
    async fn request_handler_get_agenda() {
        let handler = handler();

        let response = handler.handle(&Request::get_agenda()).await;
        assert_eq!(response, Response::agenda(AgendaPayload::default()));

        let Response::Status { info } = handler.handle(&Request::Status).await else {
            panic!("expected status");
        };
        assert_eq!(info.agendas_served, 1);
        assert!(info.last_agenda_at.is_some());
    }

    #[tokio::test]
    async fn get_agenda_on_a_spawned_task() {
        let handler = handler();
        let state = handler.state.clone();

        let response = tokio::spawn(async move { handler.handle(&Request::get_agenda()).await })
            .await
            .unwrap();

        assert_eq!(response, Response::agenda(AgendaPayload::default()));
        assert_eq!(state.read().await.agendas_served(), 1);
    }

    #[tokio::test]
    async fn request_handler_rejects_zero_budget() {
        let response = handler()
            .handle(&Request::get_agenda_with_max_lines(0))
            .await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn request_handler_rejects_other_versions() {
        let envelope = Envelope {
            protocol_version: "2".to_string(),
            request_id: "req-1".to_string(),
            payload: Request::Ping,
        };

        let response = handler().handle_envelope(&envelope).await;

        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::UnsupportedVersion
        );
    }
}
