//! System handlers: ping and getInfo.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use veriq_rpc::RpcError;

use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodHandler;

/// Liveness probe. Returns a bare pong acknowledgement.
pub struct PingHandler;

#[async_trait]
impl MethodHandler for PingHandler {
    #[instrument(skip(self, _ctx), fields(method = "system.ping"))]
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(serde_json::json!({ "pong": true }))
    }
}

/// Returns server identity, uptime, and load figures.
pub struct GetInfoHandler;

#[async_trait]
impl MethodHandler for GetInfoHandler {
    #[instrument(skip(self, ctx), fields(method = "system.getInfo"))]
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let uptime = ctx.server_start_time.elapsed().as_secs();
        let connections = ctx.broadcast.connection_count().await;
        let sessions = ctx.sessions.len();

        Ok(serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "uptimeSecs": uptime,
            "connections": connections,
            "sessions": sessions,
        }))
    }
}
