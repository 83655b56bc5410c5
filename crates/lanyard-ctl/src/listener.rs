//! Generic JSON request/response listener over a local transport.
//!
//! The listener serves registered path handlers over a Unix-domain or TCP
//! socket. Handlers receive the raw JSON request body and return either a
//! JSON value or a structured error; every handler-level failure reaches the
//! client as the `{"Err": "<message>"}` envelope with a status class.
//!
//! The listener is optional machinery: an empty address disables it, and
//! `start`/`stop` become no-ops.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Suffix appended to the configured address to form the Unix socket path.
const SOCKET_SUFFIX: &str = ".sock";

/// Local transport the listener binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Unix-domain socket.
    #[default]
    Unix,
    /// TCP stream socket.
    Tcp,
}

impl Transport {
    /// Parse from string (case-insensitive). Unknown values fall back to
    /// the Unix transport.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tcp" | "stream" => Self::Tcp,
            _ => Self::Unix,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Listener lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Constructed, no I/O performed yet.
    Created,
    /// Bound and serving requests.
    Listening,
    /// Socket closed.
    Stopped,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Listening => write!(f, "listening"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Errors from listener lifecycle operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Socket bind or accept failure
    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Illegal lifecycle transition, e.g. double start
    #[error("invalid listener state: expected {expected}, got {actual}")]
    InvalidState {
        /// State required for the transition
        expected: ListenerState,
        /// State the listener was actually in
        actual: ListenerState,
    },

    /// The serving loop died
    #[error("server terminated: {0}")]
    Serve(String),
}

/// A handler-level failure, reported to the client as the `{"Err": ...}`
/// envelope with a status class.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Status class for the response.
    pub status: StatusCode,
    /// Message placed in the error envelope.
    pub message: String,
}

impl ApiError {
    /// An error with an explicit status class.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A client error (400 class).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// A server error (500 class).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        send_error(self.status, &self.message)
    }
}

/// Response payload from a handler.
pub type HandlerResult = std::result::Result<Value, ApiError>;

/// An async request handler: raw JSON body bytes in, JSON value or error out.
pub type Handler = Arc<dyn Fn(Bytes) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

type RouteTable = Arc<RwLock<HashMap<String, Handler>>>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |body| Box::pin(f(body)))
}

/// Decode a JSON request body.
///
/// An absent or malformed body is a client error; the raw error is logged
/// for operator visibility.
pub fn decode<T: DeserializeOwned>(body: &Bytes) -> std::result::Result<T, ApiError> {
    if body.is_empty() {
        tracing::warn!("Failed to decode request: empty body");
        return Err(ApiError::bad_request("request body is empty"));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to decode request");
        ApiError::bad_request(format!("failed to decode request: {e}"))
    })
}

/// Encode a response value to JSON.
///
/// Encoding failure is a server error.
pub fn encode<T: Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode response");
        ApiError::internal(format!("failed to encode response: {e}"))
    })
}

/// Build the structured `{"Err": ...}` error envelope.
pub fn send_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "Err": message }))).into_response()
}

/// Route a request to its registered handler.
async fn dispatch(State(routes): State<RouteTable>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    let handler = routes.read().await.get(&path).cloned();

    let Some(handler) = handler else {
        tracing::debug!(path = %path, "No handler registered");
        return send_error(StatusCode::NOT_FOUND, &format!("no handler for {path}"));
    };

    tracing::debug!(path = %path, body_len = body.len(), "Dispatching request");
    match handler(body).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(e) => {
            tracing::debug!(path = %path, status = %e.status, error = %e.message, "Handler failed");
            e.into_response()
        }
    }
}

/// JSON request/response server over a local transport.
///
/// Lifecycle: `Created` → `Listening` → `Stopped`. Construction performs no
/// I/O; `start` binds the socket and serves asynchronously, delivering a
/// fatal serve error to the caller's error channel instead of returning it.
pub struct Listener {
    transport: Transport,
    local_address: String,
    routes: RouteTable,
    state: ListenerState,
    serve_task: Option<JoinHandle<()>>,
}

impl Listener {
    /// Create a listener.
    ///
    /// For the Unix transport a `.sock` suffix is appended to the address to
    /// form the socket path. An empty address disables the listener.
    pub fn new(transport: Transport, local_address: &str) -> Self {
        let local_address = if transport == Transport::Unix && !local_address.is_empty() {
            format!("{local_address}{SOCKET_SUFFIX}")
        } else {
            local_address.to_string()
        };

        Self {
            transport,
            local_address,
            routes: Arc::new(RwLock::new(HashMap::new())),
            state: ListenerState::Created,
            serve_task: None,
        }
    }

    /// The listener's lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// The resolved local address (socket path for Unix).
    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    /// Register a path handler.
    ///
    /// Safe before or after `start`: registration and dispatch share the
    /// same route table, so handlers may be added incrementally while
    /// serving.
    pub async fn add_handler(&self, path: &str, handler: Handler) {
        tracing::debug!(path = %path, "Registering handler");
        self.routes.write().await.insert(path.to_string(), handler);
    }

    /// Bind the transport and serve registered handlers asynchronously.
    ///
    /// Succeeds immediately as a no-op when no address is configured. A
    /// fatal serve error is delivered on `err_tx`, not returned here.
    pub async fn start(
        &mut self,
        err_tx: mpsc::Sender<ListenerError>,
    ) -> std::result::Result<(), ListenerError> {
        // Succeed early if no socket was requested.
        if self.local_address.is_empty() {
            return Ok(());
        }

        if self.state != ListenerState::Created {
            return Err(ListenerError::InvalidState {
                expected: ListenerState::Created,
                actual: self.state,
            });
        }

        let router = Router::new()
            .fallback(dispatch)
            .with_state(self.routes.clone())
            .layer(TraceLayer::new_for_http());

        let task = match self.transport {
            Transport::Unix => {
                let listener = UnixListener::bind(&self.local_address)?;
                tracing::info!(address = %self.local_address, "Listening on unix socket");
                tokio::spawn(async move {
                    if let Err(e) = axum::serve(listener, router).await {
                        let _ = err_tx.send(ListenerError::Serve(e.to_string())).await;
                    }
                })
            }
            Transport::Tcp => {
                let listener = TcpListener::bind(&self.local_address).await?;
                tracing::info!(address = %self.local_address, "Listening on tcp");
                tokio::spawn(async move {
                    if let Err(e) = axum::serve(listener, router).await {
                        let _ = err_tx.send(ListenerError::Serve(e.to_string())).await;
                    }
                })
            }
        };

        self.serve_task = Some(task);
        self.state = ListenerState::Listening;
        Ok(())
    }

    /// Stop serving and release the socket.
    ///
    /// In-flight requests are not drained. No-op when no address was
    /// configured.
    pub fn stop(&mut self) {
        // Succeed early if no socket was requested.
        if self.local_address.is_empty() {
            return;
        }

        if let Some(task) = self.serve_task.take() {
            task.abort();
        }

        if self.transport == Transport::Unix {
            if let Err(e) = std::fs::remove_file(&self.local_address) {
                tracing::debug!(address = %self.local_address, error = %e, "Socket file not removed");
            }
        }

        self.state = ListenerState::Stopped;
        tracing::info!(address = %self.local_address, "Listener stopped");
    }
}
