//! Event bridge — converts `RegistryEvent`s from the session registry into
//! `RpcEvent`s and routes them through the `BroadcastManager`.
//!
//! One bridge task per server. Admins get the record event plus a
//! full-replacement `sessions.list` after every mutation; connections attached
//! to a completed session get the targeted `session.redirect`.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use veriq_core::{RegistryEvent, SessionRecord};
use veriq_registry::SessionRegistry;
use veriq_rpc::{events, RpcEvent};

use super::broadcast::BroadcastManager;

/// Bridges registry events to WebSocket clients.
pub struct EventBridge {
    rx: broadcast::Receiver<RegistryEvent>,
    registry: Arc<SessionRegistry>,
    broadcast: Arc<BroadcastManager>,
}

impl EventBridge {
    /// Create a new event bridge subscribed to the registry's event stream.
    pub fn new(registry: Arc<SessionRegistry>, broadcast: Arc<BroadcastManager>) -> Self {
        let rx = registry.subscribe();
        Self {
            rx,
            registry,
            broadcast,
        }
    }

    /// Run the bridge loop until `cancel` fires.
    #[tracing::instrument(skip_all, name = "event_bridge")]
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                result = self.rx.recv() => match result {
                    Ok(event) => self.dispatch(event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Skipped events carried stale snapshots anyway; a
                        // fresh list brings admins back in sync.
                        tracing::warn!(lagged = n, "event bridge lagged, resyncing admins");
                        let list = sessions_list_event(&self.registry.list_waiting());
                        self.broadcast.broadcast_to_admins(&list).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bridge: sender closed, exiting");
                        break;
                    }
                },
                () = cancel.cancelled() => {
                    tracing::info!("Event bridge: shutdown signalled, exiting");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::SessionCreated { record, waiting } => {
                tracing::debug!(
                    session_id = record.session_id.as_str(),
                    "bridging session.created"
                );
                self.broadcast
                    .broadcast_to_admins(&session_created_event(&record))
                    .await;
                self.broadcast
                    .broadcast_to_admins(&sessions_list_event(&waiting))
                    .await;
            }
            RegistryEvent::SessionCompleted { record, waiting } => {
                tracing::debug!(
                    session_id = record.session_id.as_str(),
                    "bridging session.updated"
                );
                self.broadcast
                    .broadcast_to_admins(&session_updated_event(&record))
                    .await;
                self.broadcast
                    .broadcast_to_admins(&sessions_list_event(&waiting))
                    .await;
                if let Some(redirect) = session_redirect_event(&record) {
                    self.broadcast
                        .broadcast_to_session(record.session_id.as_str(), &redirect)
                        .await;
                }
            }
        }
    }
}

/// `session.created` push for admins; `data` is the full record.
pub fn session_created_event(record: &SessionRecord) -> RpcEvent {
    RpcEvent::new(
        events::SESSION_CREATED,
        Some(record.session_id.as_str().to_owned()),
        Some(serde_json::to_value(record).unwrap_or_default()),
    )
}

/// `session.updated` push for admins; `data` is the completed record.
pub fn session_updated_event(record: &SessionRecord) -> RpcEvent {
    RpcEvent::new(
        events::SESSION_UPDATED,
        Some(record.session_id.as_str().to_owned()),
        Some(serde_json::to_value(record).unwrap_or_default()),
    )
}

/// `sessions.list` push for admins; full replacement of the waiting list.
pub fn sessions_list_event(waiting: &[SessionRecord]) -> RpcEvent {
    RpcEvent::new(
        events::SESSIONS_LIST,
        None,
        Some(json!({ "sessions": waiting })),
    )
}

/// `session.redirect` push for attached connections. `None` when the record
/// has no outcome yet.
pub fn session_redirect_event(record: &SessionRecord) -> Option<RpcEvent> {
    let outcome = record.outcome.as_ref()?;
    let mut data = json!({ "redirectTo": outcome.redirect_to });
    if let Some(phone) = &outcome.phone_number {
        data["phoneNumber"] = json!(phone);
    }
    if let Some(email) = &outcome.email_address {
        data["emailAddress"] = json!(email);
    }
    Some(RpcEvent::new(
        events::SESSION_REDIRECT,
        Some(record.session_id.as_str().to_owned()),
        Some(data),
    ))
}
