//! Server bootstrap: bind, route, accept.
//!
//! Two routes: `/ws` upgrades to the game protocol, `/health` answers a
//! literal `OK` for liveness probes. Origin is not restricted.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use parlor_room::{janitor, Broadcaster, Registry};

use crate::{session, ServerError};

/// Shared handles every connection task gets: the registry (rooms, queue,
/// leaderboard) and the broadcaster (client map, fan-out).
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring and binding a Parlor server.
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_owned(),
        }
    }

    /// Sets the listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_owned();
        self
    }

    /// Binds the listener. Bind failure is the one fatal startup error.
    pub async fn build(self) -> Result<ParlorServer, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(ServerError::Bind)?;
        tracing::info!(addr = %self.bind_addr, "listening");
        Ok(ParlorServer {
            listener,
            state: AppState::new(),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server. [`run`](Self::run) serves until the process
/// terminates.
pub struct ParlorServer {
    listener: TcpListener,
    state: AppState,
}

impl ParlorServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Starts the janitor and the accept loop.
    pub async fn run(self) -> Result<(), ServerError> {
        janitor::spawn_janitor(
            Arc::clone(&self.state.registry),
            Arc::clone(&self.state.broadcaster),
        );

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health))
            .with_state(self.state);

        axum::serve(self.listener, app)
            .await
            .map_err(ServerError::Serve)
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| session::run(socket, state))
        .into_response()
}
