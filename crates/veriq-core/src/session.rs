//! Session records — the unit of state tracked by the registry.
//!
//! A [`SessionRecord`] is created `Waiting` and mutated exactly once by
//! [`SessionRecord::complete`], which attaches a [`SessionOutcome`]. The
//! outcome is `Some` iff the status is `Completed`; the registry is the sole
//! owner of records and `complete` is the only mutation path, so the pairing
//! cannot drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentType;
use crate::ids::SessionId;

/// RFC 3339 timestamps with millisecond precision, matching the wire format
/// the rest of the protocol uses.
pub(crate) mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as e.g. `"2026-08-25T10:15:30.123Z"`.
    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Accept any RFC 3339 precision on the way in.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a session.
///
/// The only legal transition is `Waiting → Completed`; records never return
/// to `Waiting`, and completed records are dropped by the sweeper, not reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Awaiting an operator decision.
    Waiting,
    /// An outcome has been recorded.
    Completed,
}

/// How session creation treats an existing waiting record that holds the
/// same document number.
///
/// A kiosk that restarts its flow mints a fresh session id for the same
/// document; under [`DedupPolicy::ByDocument`] the stale waiting entry is
/// evicted so operators see one row per person, not one per attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DedupPolicy {
    /// Insert unconditionally; several waiting records may share a document
    /// number.
    None,
    /// Evict any waiting record with the same document number before
    /// inserting (last writer wins). Completed records are never touched.
    #[default]
    ByDocument,
}

/// The operator's decision for a session, stamped at completion time.
///
/// Re-completing a session replaces the whole outcome; fields are never
/// merged across completions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    /// Where the originating client should be redirected.
    pub redirect_to: String,
    /// Contact phone captured by the operator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Contact email captured by the operator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// When the outcome was recorded.
    #[serde(with = "rfc3339_millis")]
    pub completed_at: DateTime<Utc>,
}

/// One identity-verification session from creation to outcome delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unique key within the registry.
    pub session_id: SessionId,
    /// Kind of identity document presented.
    pub document_type: DocumentType,
    /// Operator-facing label for `document_type`, fixed at construction.
    #[serde(default)]
    pub document_type_text: String,
    /// Document number as entered; not unique across sessions.
    pub document_number: String,
    /// Creation instant; orders the waiting queue.
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Outcome, present iff `status` is `Completed`. Flattened so the wire
    /// record stays flat (`redirectTo`, `completedAt`, ...).
    #[serde(flatten)]
    pub outcome: Option<SessionOutcome>,
    /// Registry-assigned insertion sequence; tie-break for equal
    /// `created_at` millis. Never serialized.
    #[serde(skip)]
    pub seq: u64,
}

impl SessionRecord {
    /// Create a fresh `Waiting` record stamped with the current time.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        document_type: DocumentType,
        document_number: impl Into<String>,
    ) -> Self {
        let document_type_text = document_type.label().to_owned();
        Self {
            session_id,
            document_type,
            document_type_text,
            document_number: document_number.into(),
            created_at: Utc::now(),
            status: SessionStatus::Waiting,
            outcome: None,
            seq: 0,
        }
    }

    /// Record the outcome and flip the status to `Completed`.
    ///
    /// Calling this on an already-completed record replaces the previous
    /// outcome (last write wins) and refreshes `completed_at`.
    pub fn complete(
        &mut self,
        redirect_to: impl Into<String>,
        phone_number: Option<String>,
        email_address: Option<String>,
    ) {
        self.status = SessionStatus::Completed;
        self.outcome = Some(SessionOutcome {
            redirect_to: redirect_to.into(),
            phone_number,
            email_address,
            completed_at: Utc::now(),
        });
    }

    /// Whether the session is still awaiting an operator.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.status == SessionStatus::Waiting
    }

    /// Whether an outcome has been recorded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// The redirect target, if completed.
    #[must_use]
    pub fn redirect_to(&self) -> Option<&str> {
        self.outcome.as_ref().map(|o| o.redirect_to.as_str())
    }

    /// Completion instant, if completed.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.outcome.as_ref().map(|o| o.completed_at)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
