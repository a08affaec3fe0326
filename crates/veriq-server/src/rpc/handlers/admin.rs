//! Admin handlers: subscribe.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use veriq_rpc::RpcError;

use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodHandler;

/// Join the admin group and return the current waiting snapshot.
///
/// Group membership is flipped by the WebSocket loop once this handler
/// acknowledges; the snapshot rides along in the response so dashboards
/// render without an extra round trip.
pub struct SubscribeHandler;

#[async_trait]
impl MethodHandler for SubscribeHandler {
    #[instrument(skip(self, ctx), fields(method = "admin.subscribe"))]
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(serde_json::json!({
            "subscribed": true,
            "sessions": ctx.sessions.list_waiting(),
        }))
    }
}
