//! Names of server-pushed events.
//!
//! Kept as constants so the event bridge, the handshake, and the tests all
//! spell them identically.

/// Sent to a connection immediately after the WebSocket upgrade. Carries
/// `data.clientId`.
pub const CONNECTION_ESTABLISHED: &str = "connection.established";

/// Sent to admins when a session is created. `data` is the new record.
pub const SESSION_CREATED: &str = "session.created";

/// Sent to admins when a session is completed. `data` is the full updated
/// record.
pub const SESSION_UPDATED: &str = "session.updated";

/// Sent to admins after any mutation. `data.sessions` is the full waiting
/// list in ascending creation order; receivers replace their local copy.
pub const SESSIONS_LIST: &str = "sessions.list";

/// Sent to connections attached to a session when its outcome is recorded.
/// `data` carries `redirectTo` plus the optional contact fields.
pub const SESSION_REDIRECT: &str = "session.redirect";
