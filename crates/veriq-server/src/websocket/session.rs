//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use veriq_rpc::{events, RpcEvent};

use crate::config::ServerConfig;
use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_CONNECTION_DURATION_SECONDS,
    WS_DISCONNECTIONS_TOTAL,
};
use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodRegistry;

use super::broadcast::BroadcastManager;
use super::connection::ClientConnection;
use super::handler::handle_message;

/// Run a WebSocket session for a connected client.
///
/// 1. Sends a `connection.established` event with the client ID
/// 2. Dispatches incoming text frames as RPC requests
/// 3. Forwards outbound events/responses via the send channel
/// 4. Sends periodic Ping frames and disconnects unresponsive clients
/// 5. Closes the socket on server shutdown
/// 6. Cleans up on disconnect
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    client_id: String,
    methods: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    broadcast: Arc<BroadcastManager>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Create the client connection and send channel
    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(1024);
    let connection = Arc::new(ClientConnection::new(client_id.clone(), send_tx));

    let connection_start = std::time::Instant::now();
    info!(client_id, "client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    // Register with broadcast manager
    broadcast.add(connection.clone()).await;

    // Send connection.established so the client learns its ID
    let connected = RpcEvent::new(
        events::CONNECTION_ESTABLISHED,
        None,
        Some(serde_json::json!({ "clientId": client_id })),
    );
    if let Ok(json) = serde_json::to_string(&connected) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }

    // Spawn outbound forwarder with periodic Ping frames.
    let ping_period = config.heartbeat_interval();
    let pong_timeout = config.heartbeat_timeout();
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(ping_period);
        // Skip the immediate first tick
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    // Check if client responded to previous ping
                    if !outbound_conn.check_alive() {
                        // Client missed a ping cycle — check if it's been too long
                        if outbound_conn.last_pong_elapsed() > pong_timeout {
                            warn!("client unresponsive for {pong_timeout:?}, disconnecting");
                            break;
                        }
                    }
                    // Send ping
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Process incoming messages until the client disconnects or the server
    // shuts down
    loop {
        let incoming = tokio::select! {
            incoming = ws_rx.next() => incoming,
            () = shutdown.cancelled() => {
                info!(client_id, "server shutting down, closing connection");
                break;
            }
        };
        let Some(Ok(msg)) = incoming else { break };

        // Extract text from either Text or Binary frames (mobile clients send binary)
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    Some(s.to_string())
                } else {
                    info!(client_id, len = data.len(), "received non-UTF8 binary frame");
                    None
                }
            }
            Message::Close(_) => {
                info!(client_id, "client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };

        let result = handle_message(&text, &methods, &ctx).await;

        // Bind to a session topic on attach. The session ID comes from the
        // request params since the response is a bare acknowledgement.
        if result.method == "session.attach" && result.response.success {
            if let Some(sid) = result
                .params
                .as_ref()
                .and_then(|p| p.get("sessionId"))
                .and_then(|v| v.as_str())
            {
                connection.bind_session(sid.to_string());
                debug!(client_id, session_id = sid, "connection attached to session");
            }
        }

        // Join the admin group on subscribe
        if result.method == "admin.subscribe" && result.response.success {
            connection.bind_admin();
            let admins = broadcast.admin_count().await;
            debug!(client_id, admins, "connection joined admin group");
        }

        if !connection.send(Arc::new(result.response_json)) {
            info!(client_id, "failed to enqueue response (channel full or closed)");
        }
    }

    // Clean up
    info!(client_id, "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection_start.elapsed().as_secs_f64());
    outbound.abort();
    broadcast.remove(&client_id).await;
}
