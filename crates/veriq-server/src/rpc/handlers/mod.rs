//! RPC handler modules and registration.

pub mod admin;
pub mod session;
pub mod system;

use crate::rpc::registry::MethodRegistry;

/// Register all RPC handlers with the registry.
pub fn register_all(registry: &mut MethodRegistry) {
    // System
    registry.register("system.ping", system::PingHandler);
    registry.register("system.getInfo", system::GetInfoHandler);

    // Session
    registry.register("session.create", session::CreateSessionHandler);
    registry.register("session.get", session::GetSessionHandler);
    registry.register("session.complete", session::CompleteSessionHandler);
    registry.register("session.list", session::ListSessionsHandler);
    registry.register("session.attach", session::AttachSessionHandler);

    // Admin
    registry.register("admin.subscribe", admin::SubscribeHandler);
}

/// Extract a required parameter from the params object.
pub(crate) fn require_param<'a>(
    params: Option<&'a serde_json::Value>,
    key: &str,
) -> Result<&'a serde_json::Value, veriq_rpc::RpcError> {
    params
        .and_then(|p| p.get(key))
        .ok_or_else(|| veriq_rpc::RpcError::InvalidParams {
            message: format!("Missing required parameter: {key}"),
        })
}

/// Extract a required string parameter.
pub(crate) fn require_string_param(
    params: Option<&serde_json::Value>,
    key: &str,
) -> Result<String, veriq_rpc::RpcError> {
    require_param(params, key)?
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| veriq_rpc::RpcError::InvalidParams {
            message: format!("Parameter '{key}' must be a string"),
        })
}
