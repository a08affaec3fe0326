//! Event fan-out to connected WebSocket clients.
//!
//! Two delivery scopes: the admin group (every connection that called
//! `admin.subscribe`) and session topics (connections bound via
//! `session.attach`). Delivery is best-effort `try_send`; a full or closed
//! channel drops the message for that client and bumps a counter. Zero
//! recipients is a silent no-op.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use veriq_rpc::RpcEvent;

use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

use super::connection::ClientConnection;

/// Manages event broadcasting to connected clients.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
}

impl BroadcastManager {
    /// Create a new broadcast manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection by ID. Unknown IDs are a no-op.
    pub async fn remove(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        let _ = conns.remove(connection_id);
    }

    /// Broadcast an event to every admin-group connection.
    ///
    /// The event is serialized once; the recipient set is snapshotted under
    /// the read lock and the lock released before any send.
    pub async fn broadcast_to_admins(&self, event: &RpcEvent) {
        let Some(json) = serialize(event) else { return };
        let recipients: Vec<Arc<ClientConnection>> = {
            let conns = self.connections.read().await;
            conns.values().filter(|c| c.is_admin()).cloned().collect()
        };
        debug!(
            event_type = event.event_type,
            recipients = recipients.len(),
            "broadcast event to admins"
        );
        for conn in &recipients {
            if !conn.send(json.clone()) {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, "failed to send event to admin client");
            }
        }
    }

    /// Broadcast an event to all connections attached to the given session.
    pub async fn broadcast_to_session(&self, session_id: &str, event: &RpcEvent) {
        let Some(json) = serialize(event) else { return };
        let recipients: Vec<Arc<ClientConnection>> = {
            let conns = self.connections.read().await;
            conns
                .values()
                .filter(|c| c.session_id().as_deref() == Some(session_id))
                .cloned()
                .collect()
        };
        debug!(
            event_type = event.event_type,
            session_id,
            recipients = recipients.len(),
            "broadcast event to session"
        );
        for conn in &recipients {
            if !conn.send(json.clone()) {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, session_id, "failed to send event to client");
            }
        }
    }

    /// Number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of admin-group connections.
    pub async fn admin_count(&self) -> usize {
        let conns = self.connections.read().await;
        conns.values().filter(|c| c.is_admin()).count()
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(event: &RpcEvent) -> Option<Arc<String>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            warn!(event_type = event.event_type, error = %e, "failed to serialize event");
            None
        }
    }
}
