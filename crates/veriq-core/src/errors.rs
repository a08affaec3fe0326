//! Domain errors.
//!
//! The registry has exactly one failure mode a caller can act on: the
//! referenced session is gone. Everything else (broadcasting to zero admins,
//! delivering to zero attached connections, evicting an absent id) is a
//! silent no-op, not an error.

use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The referenced session id is not in the registry.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The id that failed to resolve.
        session_id: String,
    },
}

impl RegistryError {
    /// Build a not-found error for the given id.
    #[must_use]
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}

/// Convenience alias for registry results.
pub type Result<T> = std::result::Result<T, RegistryError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn not_found_display_includes_id() {
        let err = RegistryError::not_found("abc-123");
        assert_eq!(err.to_string(), "session not found: abc-123");
    }

    #[test]
    fn not_found_constructor() {
        let err = RegistryError::not_found("s-9");
        assert_matches!(err, RegistryError::SessionNotFound { session_id } if session_id == "s-9");
    }
}
