//! RPC dependency-injection context.

use std::sync::Arc;
use std::time::Instant;

use veriq_registry::SessionRegistry;

use crate::websocket::broadcast::BroadcastManager;

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// Session registry holding all live records.
    pub sessions: Arc<SessionRegistry>,
    /// Broadcast manager for connected clients (connection counts).
    pub broadcast: Arc<BroadcastManager>,
    /// When the server started (for uptime calculation).
    pub server_start_time: Instant,
}

#[cfg(test)]
mod tests {
    use veriq_core::{DocumentType, SessionId};

    use crate::rpc::handlers::test_helpers::make_test_context;

    #[test]
    fn context_has_server_start_time() {
        let ctx = make_test_context();
        let elapsed = ctx.server_start_time.elapsed();
        assert!(elapsed.as_secs() < 5);
    }

    #[test]
    fn context_registry_starts_empty() {
        let ctx = make_test_context();
        assert!(ctx.sessions.is_empty());
    }

    #[tokio::test]
    async fn context_broadcast_starts_empty() {
        let ctx = make_test_context();
        assert_eq!(ctx.broadcast.connection_count().await, 0);
    }

    #[test]
    fn context_sessions_observe_mutations() {
        let ctx = make_test_context();
        let _ = ctx
            .sessions
            .create(SessionId::from("sess_1"), DocumentType::Ci, "12345");
        assert_eq!(ctx.sessions.len(), 1);
    }
}
