//! Session handlers: create, get, complete, list, attach.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use veriq_core::{DocumentType, SessionId};
use veriq_rpc::RpcError;

use crate::rpc::context::RpcContext;
use crate::rpc::handlers::require_string_param;
use crate::rpc::registry::MethodHandler;
use crate::rpc::validation::{validate_string_param, MAX_PARAM_LENGTH};

/// Register a new waiting session.
pub struct CreateSessionHandler;

#[async_trait]
impl MethodHandler for CreateSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.create"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let document_type = require_string_param(params.as_ref(), "documentType")?;
        let document_number = require_string_param(params.as_ref(), "documentNumber")?;
        validate_string_param(&document_type, "documentType", MAX_PARAM_LENGTH)?;
        validate_string_param(&document_number, "documentNumber", MAX_PARAM_LENGTH)?;

        // Kiosks mint their own ids (printed on the QR code); the server only
        // generates one when the caller omits it.
        let session_id = params
            .as_ref()
            .and_then(|p| p.get("sessionId"))
            .and_then(|v| v.as_str())
            .map_or_else(SessionId::new, SessionId::from);

        let record = ctx.sessions.create(
            session_id,
            DocumentType::from(document_type.as_str()),
            document_number,
        );

        serde_json::to_value(&record).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

/// Look up a session by id.
pub struct GetSessionHandler;

#[async_trait]
impl MethodHandler for GetSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.get", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;

        let record = ctx.sessions.get(&SessionId::from(session_id))?;

        serde_json::to_value(&record).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

/// Record the verification outcome and mark the session completed.
pub struct CompleteSessionHandler;

#[async_trait]
impl MethodHandler for CompleteSessionHandler {
    #[instrument(skip(self, ctx), fields(method = "session.complete", session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        let redirect_to = require_string_param(params.as_ref(), "redirectTo")?;
        validate_string_param(&redirect_to, "redirectTo", MAX_PARAM_LENGTH)?;

        let phone_number = params
            .as_ref()
            .and_then(|p| p.get("phoneNumber"))
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        let email_address = params
            .as_ref()
            .and_then(|p| p.get("emailAddress"))
            .and_then(|v| v.as_str())
            .map(str::to_owned);

        let record = ctx.sessions.complete(
            &SessionId::from(session_id),
            redirect_to,
            phone_number,
            email_address,
        )?;

        serde_json::to_value(&record).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

/// List sessions still waiting for completion.
pub struct ListSessionsHandler;

#[async_trait]
impl MethodHandler for ListSessionsHandler {
    #[instrument(skip(self, ctx), fields(method = "session.list"))]
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(serde_json::json!({ "sessions": ctx.sessions.list_waiting() }))
    }
}

/// Bind the calling connection to a session's redirect topic.
///
/// The actual binding happens in the WebSocket loop once this handler
/// acknowledges; the record does not have to exist yet, since a client can
/// scan its QR code before the kiosk finishes registering the session.
pub struct AttachSessionHandler;

#[async_trait]
impl MethodHandler for AttachSessionHandler {
    #[instrument(skip(self, _ctx), fields(method = "session.attach", session_id))]
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let session_id = require_string_param(params.as_ref(), "sessionId")?;
        validate_string_param(&session_id, "sessionId", MAX_PARAM_LENGTH)?;

        Ok(serde_json::json!({ "attached": true }))
    }
}
