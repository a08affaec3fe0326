//! Registry lifecycle events.
//!
//! Every registry mutation that admins must learn about publishes one of
//! these over a broadcast channel. The waiting-list snapshot is captured in
//! the same critical section as the mutation, so a consumer never observes a
//! list that disagrees with the record it arrived with. Evictions by the
//! sweeper deliberately emit nothing; admins reconcile on the next snapshot.

use crate::ids::SessionId;
use crate::session::SessionRecord;

/// A registry mutation plus the waiting-list snapshot taken with it.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    /// A new waiting session was inserted.
    SessionCreated {
        /// The record as inserted.
        record: SessionRecord,
        /// Waiting list immediately after the insert, oldest first.
        waiting: Vec<SessionRecord>,
    },
    /// A session was completed with an outcome.
    SessionCompleted {
        /// The record after completion.
        record: SessionRecord,
        /// Waiting list immediately after the completion, oldest first.
        waiting: Vec<SessionRecord>,
    },
}

impl RegistryEvent {
    /// The record this event is about.
    #[must_use]
    pub fn record(&self) -> &SessionRecord {
        match self {
            Self::SessionCreated { record, .. } | Self::SessionCompleted { record, .. } => record,
        }
    }

    /// The waiting-list snapshot captured with the mutation.
    #[must_use]
    pub fn waiting(&self) -> &[SessionRecord] {
        match self {
            Self::SessionCreated { waiting, .. } | Self::SessionCompleted { waiting, .. } => {
                waiting
            }
        }
    }

    /// Session id of the affected record.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.record().session_id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
