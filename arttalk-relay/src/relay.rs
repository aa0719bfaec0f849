//! Relay server: shared state, WebSocket handler, and server startup.
//!
//! Every request that asks for a WebSocket upgrade becomes a discussion
//! connection, whatever its path, REST paths included. The request path picks
//! the room (see [`crate::router`]). Each socket gets a writer task draining
//! an unbounded channel, and a reader loop feeding frames into the shared
//! [`RelayCore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};

use crate::api;
use crate::catalog::{ArtCatalog, StaticCatalog};
use crate::lifecycle::{Dispatch, RelayCore};
use crate::registry::ConnectionId;

/// How long shutdown waits for sockets to flush their close frames.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared server state: the relay core and the shutdown signal.
pub struct RelayState {
    core: Mutex<RelayCore>,
    shutdown: watch::Sender<bool>,
    /// Notified whenever a socket task has unregistered its connection.
    departed: Notify,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    /// Creates state with an empty relay and the default frame size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_core(RelayCore::new())
    }

    /// Creates state with a custom frame size limit.
    #[must_use]
    pub fn with_config(max_frame_size: usize) -> Self {
        Self::with_core(RelayCore::with_max_frame_size(max_frame_size))
    }

    fn with_core(core: RelayCore) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            core: Mutex::new(core),
            shutdown,
            departed: Notify::new(),
        }
    }

    /// Runs `f` with exclusive access to the relay core.
    ///
    /// This is the only way relay state is touched, so every relay step is
    /// atomic with respect to every other.
    pub fn with_core_mut<T>(&self, f: impl FnOnce(&mut RelayCore) -> T) -> T {
        f(&mut self.core.lock())
    }

    /// Number of rooms currently in the store.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.core.lock().rooms().len()
    }

    /// Number of members in a room; zero if the room does not exist.
    #[must_use]
    pub fn room_size(&self, room_id: &str) -> usize {
        self.core.lock().rooms().get(room_id).map_or(0, |room| room.len())
    }

    /// Number of registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.core.lock().connections().len()
    }

    /// Sends a going-away close frame to every connected client.
    ///
    /// Each writer task sends the frame and exits, which ends the socket.
    pub fn close_all_connections(&self) -> usize {
        self.with_core_mut(RelayCore::close_all)
    }

    /// Closes every connection, waits up to [`SHUTDOWN_GRACE`] for the
    /// sockets to finish, then tells the server to stop listening.
    ///
    /// When this returns, every close frame has been written or the grace
    /// period has run out.
    pub async fn shutdown(&self) {
        let closed = self.close_all_connections();
        tracing::info!(connections = closed, "relay shutting down");

        if tokio::time::timeout(SHUTDOWN_GRACE, self.connections_drained())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.connection_count(),
                "connections still open after shutdown grace period"
            );
        }
        self.shutdown.send_replace(true);
    }

    async fn connections_drained(&self) {
        loop {
            let departed = self.departed.notified();
            tokio::pin!(departed);
            departed.as_mut().enable();
            if self.connection_count() == 0 {
                return;
            }
            departed.await;
        }
    }

    /// Resolves once [`Self::shutdown`] has been called.
    pub fn shutdown_requested(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            let _ = rx.wait_for(|stop| *stop).await;
        }
    }
}

/// Handles an upgraded WebSocket connection for a single client.
///
/// The connection lifecycle:
/// 1. Register the connection and send the welcome notice.
/// 2. Spawn a writer task forwarding the connection's channel to the socket.
/// 3. Feed every inbound frame to the relay core.
/// 4. On close, leave the bound room and unregister.
pub async fn handle_socket(socket: WebSocket, path: String, state: Arc<RelayState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let conn_id = state.with_core_mut(|core| core.open(path, tx));

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(conn_id = %conn_id, "WebSocket write failed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_frame(conn_id, msg, &reader_state) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket read failed");
                    break;
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.with_core_mut(|core| core.close(conn_id));
    state.departed.notify_waiters();
}

/// Feeds one WebSocket message to the relay core.
///
/// Returns `false` when the client closed the connection.
fn handle_frame(conn_id: ConnectionId, msg: Message, state: &RelayState) -> bool {
    let dispatch = match msg {
        Message::Text(text) => state.with_core_mut(|core| core.inbound_text(conn_id, text.as_str())),
        Message::Binary(bytes) => state.with_core_mut(|core| core.inbound_binary(conn_id, &bytes)),
        Message::Close(_) => {
            tracing::info!(conn_id = %conn_id, "received close frame");
            return false;
        }
        Message::Ping(_) | Message::Pong(_) => return true,
    };

    if let Dispatch::Relayed { room_id, report } = &dispatch {
        tracing::debug!(
            conn_id = %conn_id,
            room_id = %room_id,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "frame relayed"
        );
    }
    !matches!(dispatch, Dispatch::UnknownConnection)
}

/// Builds the application router: WebSocket upgrades on any path, the REST
/// API routes, and a JSON 404 for everything else.
pub fn app(state: Arc<RelayState>, catalog: Arc<dyn ArtCatalog>) -> axum::Router {
    axum::Router::new()
        .merge(api::router(catalog))
        .fallback(api::endpoint_not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            upgrade_any_path,
        ))
        .with_state(state)
        .layer(api::cors_layer())
}

/// Starts the relay server on the given address with the built-in catalog
/// and returns the bound address and a join handle.
///
/// This is the primary entry point used by tests.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(RelayState::new()), Arc::new(StaticCatalog::new())).await
}

/// Starts the relay server with a pre-configured [`RelayState`] and catalog.
///
/// The server stops accepting connections after [`RelayState::shutdown`];
/// the join handle completes once in-flight connections have finished.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<RelayState>,
    catalog: Arc<dyn ArtCatalog>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let shutdown = state.shutdown_requested();
    let app = app(state, catalog);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "relay server error");
        }
        tracing::info!("relay server stopped");
    });

    Ok((bound_addr, handle))
}

/// Starts the relay server in-process for testing.
///
/// Binds to `127.0.0.1:0` (OS-assigned port) and returns the bound address
/// and a [`tokio::task::JoinHandle`] for cleanup.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// Takes over every WebSocket upgrade request before it reaches a route.
async fn upgrade_any_path(
    State(state): State<Arc<RelayState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_websocket_upgrade(request.headers()) {
        return next.run(request).await;
    }

    let (mut parts, _body) = request.into_parts();
    let path = parts.uri.path().to_string();
    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, path, state)),
        Err(rejection) => {
            tracing::debug!(path = %path, error = %rejection, "rejected WebSocket upgrade");
            rejection.into_response()
        }
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}
