//! `VeriqServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use veriq_core::{ConnectionId, DocumentType, SessionId};
use veriq_registry::SessionRegistry;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::BroadcastManager;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast manager for event fan-out.
    pub broadcast: Arc<BroadcastManager>,
    /// Session registry backing the REST and RPC surfaces.
    pub sessions: Arc<SessionRegistry>,
    /// RPC method registry.
    pub methods: Arc<MethodRegistry>,
    /// Handler context shared with WebSocket dispatch.
    pub ctx: Arc<RpcContext>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle for `/metrics`.
    pub metrics: PrometheusHandle,
    /// Server configuration.
    pub config: ServerConfig,
}

/// The main veriq server.
pub struct VeriqServer {
    config: ServerConfig,
    methods: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    broadcast: Arc<BroadcastManager>,
    sessions: Arc<SessionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

impl VeriqServer {
    /// Create a new server.
    ///
    /// The broadcast manager and session registry are taken from `ctx` so the
    /// HTTP surface, the RPC handlers, and the event bridge all observe the
    /// same instances.
    pub fn new(
        config: ServerConfig,
        methods: MethodRegistry,
        ctx: RpcContext,
        metrics: PrometheusHandle,
    ) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            config,
            methods: Arc::new(methods),
            broadcast: ctx.broadcast.clone(),
            sessions: ctx.sessions.clone(),
            ctx,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broadcast: self.broadcast.clone(),
            sessions: self.sessions.clone(),
            methods: self.methods.clone(),
            ctx: self.ctx.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            config: self.config.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .route("/api/session", post(create_session_handler))
            .route("/api/session/{session_id}", get(get_session_handler))
            .route(
                "/api/session/{session_id}/redirect",
                post(redirect_session_handler),
            )
            .route("/api/sessions", get(list_sessions_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the join handle
    /// for the serve task. The task exits once the shutdown coordinator
    /// fires and in-flight connections drain.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });

        info!(addr = %local_addr, "server listening");
        Ok((local_addr, handle))
    }

    /// Get the broadcast manager.
    pub fn broadcast(&self) -> &Arc<BroadcastManager> {
        &self.broadcast
    }

    /// Get the session registry.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the method registry.
    pub fn methods(&self) -> &Arc<MethodRegistry> {
        &self.methods
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.broadcast.connection_count().await;
    let sessions = state.sessions.len();
    Json(health::health_check(state.start_time, connections, sessions))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// GET /ws — upgrade to a WebSocket session.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let connections = state.broadcast.connection_count().await;
    if connections >= state.config.max_connections {
        warn!(
            connections,
            max = state.config.max_connections,
            "connection limit reached, rejecting upgrade"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let client_id = ConnectionId::new().into_inner();
    let shutdown = state.shutdown.token();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            run_ws_session(
                socket,
                client_id,
                state.methods,
                state.ctx,
                state.broadcast,
                state.config,
                shutdown,
            )
        })
}

/// Request body for `POST /api/session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody {
    document_type: String,
    document_number: String,
    session_id: Option<String>,
}

/// Request body for `POST /api/session/{session_id}/redirect`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedirectBody {
    redirect_to: String,
    phone_number: Option<String>,
    email_address: Option<String>,
}

fn session_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Session not found" })),
    )
}

/// POST /api/session
async fn create_session_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Json<Value> {
    let session_id = body.session_id.map_or_else(SessionId::new, SessionId::from);
    let record = state.sessions.create(
        session_id,
        DocumentType::from(body.document_type.as_str()),
        body.document_number,
    );
    Json(json!({ "success": true, "session": record }))
}

/// GET /api/session/{session_id}
async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.sessions.get(&SessionId::from(session_id)) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({ "success": true, "session": record })),
        ),
        Err(_) => session_not_found(),
    }
}

/// POST /api/session/{session_id}/redirect
async fn redirect_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<RedirectBody>,
) -> (StatusCode, Json<Value>) {
    match state.sessions.complete(
        &SessionId::from(session_id),
        body.redirect_to,
        body.phone_number,
        body.email_address,
    ) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({ "success": true, "session": record })),
        ),
        Err(_) => session_not_found(),
    }
}

/// GET /api/sessions
async fn list_sessions_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "sessions": state.sessions.list_waiting() }))
}
