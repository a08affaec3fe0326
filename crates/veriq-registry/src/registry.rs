//! In-memory session registry with a single-lock mutation discipline.
//!
//! All session state lives behind one `parking_lot::Mutex`. Key rules:
//!
//! - **Snapshot under the lock**: every mutation that subscribers need to see
//!   computes the waiting-list snapshot inside its critical section, so the
//!   snapshot always reflects exactly the state the mutation produced.
//! - **Events enqueued under the lock**: the broadcast send is a wait-free
//!   ring-buffer write, not I/O. Enqueueing before the lock drops gives
//!   subscribers events in mutation order. Socket writes happen later, in
//!   subscriber tasks, never while the lock is held.
//! - **Overwrite by id**: creating with an id that is already present
//!   replaces the old record silently (a kiosk retrying its flow).
//! - **Dedup by document**: under [`DedupPolicy::ByDocument`] a create first
//!   evicts waiting records holding the same document number. Completed
//!   records are never touched by dedup.
//! - **Expiry is silent**: [`SessionRegistry::sweep_expired`] removes records
//!   without emitting events; admins converge on the next list broadcast.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};
use veriq_core::{
    DedupPolicy, DocumentType, RegistryError, RegistryEvent, Result, SessionId, SessionRecord,
};

const SESSIONS_CREATED: &str = "sessions_created_total";
const SESSIONS_COMPLETED: &str = "sessions_completed_total";
const SESSIONS_EVICTED: &str = "sessions_evicted_total";
const SESSIONS_ACTIVE: &str = "sessions_active";

/// Buffered registry events per subscriber before the channel reports lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Counts from one expiry sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Completed records that outlived their retention window.
    pub completed_evicted: u64,
    /// Waiting records that outlived the abandonment ceiling.
    pub stale_evicted: u64,
}

impl SweepOutcome {
    /// Total records removed by the sweep.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.completed_evicted + self.stale_evicted
    }

    /// Whether the sweep removed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

struct RegistryInner {
    records: HashMap<SessionId, SessionRecord>,
    /// Monotonic insertion counter; breaks ordering ties between records
    /// created within the same timestamp tick.
    next_seq: u64,
}

impl RegistryInner {
    /// Waiting records in ascending creation order. Callers must hold the
    /// lock; the returned clones are safe to hand out after it drops.
    fn waiting_snapshot(&self) -> Vec<SessionRecord> {
        let mut waiting: Vec<SessionRecord> = self
            .records
            .values()
            .filter(|record| record.is_waiting())
            .cloned()
            .collect();
        waiting.sort_unstable_by_key(|record| (record.created_at, record.seq));
        waiting
    }
}

/// Shared session store. Cheap to share behind an `Arc`; all methods take
/// `&self`.
pub struct SessionRegistry {
    policy: DedupPolicy,
    inner: Mutex<RegistryInner>,
    events: broadcast::Sender<RegistryEvent>,
}

impl SessionRegistry {
    // ─────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────

    /// Create an empty registry with the given creation policy.
    #[must_use]
    pub fn new(policy: DedupPolicy) -> Self {
        Self::with_event_capacity(policy, DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty registry with an explicit event-channel capacity.
    #[must_use]
    pub fn with_event_capacity(policy: DedupPolicy, event_capacity: usize) -> Self {
        // tokio's broadcast channel panics on zero capacity.
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            policy,
            inner: Mutex::new(RegistryInner {
                records: HashMap::new(),
                next_seq: 0,
            }),
            events,
        }
    }

    /// The creation policy this registry was built with.
    #[must_use]
    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Subscribe to registry events.
    ///
    /// Each mutation is observed exactly once per subscriber, in mutation
    /// order. A subscriber that falls more than [`DEFAULT_EVENT_CAPACITY`]
    /// events behind sees `RecvError::Lagged` and should resynchronize from
    /// [`SessionRegistry::list_waiting`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a new waiting session and return the stored record.
    ///
    /// An existing record with the same id is replaced silently. Under
    /// [`DedupPolicy::ByDocument`], waiting records holding the same document
    /// number are evicted first. Emits `SessionCreated` with the post-insert
    /// waiting snapshot.
    pub fn create(
        &self,
        session_id: SessionId,
        document_type: DocumentType,
        document_number: impl Into<String>,
    ) -> SessionRecord {
        let document_number = document_number.into();
        let mut inner = self.inner.lock();
        if self.policy == DedupPolicy::ByDocument {
            let before = inner.records.len();
            inner
                .records
                .retain(|_, record| !(record.is_waiting() && record.document_number == document_number));
            let evicted = before - inner.records.len();
            if evicted > 0 {
                debug!(
                    document_number = %document_number,
                    evicted,
                    "dedup evicted waiting duplicates"
                );
                counter!(SESSIONS_EVICTED, "reason" => "dedup").increment(evicted as u64);
            }
        }
        let mut record = SessionRecord::new(session_id.clone(), document_type, document_number);
        record.seq = inner.next_seq;
        inner.next_seq += 1;
        let replaced = inner.records.insert(session_id, record.clone()).is_some();
        let waiting = inner.waiting_snapshot();
        record_active(inner.records.len());
        let _ = self.events.send(RegistryEvent::SessionCreated {
            record: record.clone(),
            waiting,
        });
        drop(inner);

        counter!(SESSIONS_CREATED).increment(1);
        info!(
            session_id = %record.session_id,
            document_type = %record.document_type,
            replaced,
            "session created"
        );
        record
    }

    /// Look up a session by id.
    pub fn get(&self, session_id: &SessionId) -> Result<SessionRecord> {
        self.inner
            .lock()
            .records
            .get(session_id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(session_id.as_str()))
    }

    /// Record the outcome for a session and flip it to `Completed`.
    ///
    /// Completing an already-completed session overwrites the previous
    /// outcome (last write wins) and re-emits, so late corrections still
    /// reach subscribers. Emits `SessionCompleted` with the post-mutation
    /// waiting snapshot.
    pub fn complete(
        &self,
        session_id: &SessionId,
        redirect_to: impl Into<String>,
        phone_number: Option<String>,
        email_address: Option<String>,
    ) -> Result<SessionRecord> {
        let mut inner = self.inner.lock();
        let Some(record) = inner.records.get_mut(session_id) else {
            return Err(RegistryError::not_found(session_id.as_str()));
        };
        record.complete(redirect_to, phone_number, email_address);
        let record = record.clone();
        let waiting = inner.waiting_snapshot();
        let _ = self.events.send(RegistryEvent::SessionCompleted {
            record: record.clone(),
            waiting,
        });
        drop(inner);

        counter!(SESSIONS_COMPLETED).increment(1);
        info!(
            session_id = %record.session_id,
            redirect_to = record.redirect_to().unwrap_or_default(),
            "session completed"
        );
        Ok(record)
    }

    /// Waiting sessions in ascending creation order.
    #[must_use]
    pub fn list_waiting(&self) -> Vec<SessionRecord> {
        self.inner.lock().waiting_snapshot()
    }

    /// Remove a session unconditionally. Absent ids are a no-op.
    ///
    /// Returns whether a record was removed. Emits nothing; eviction is an
    /// operational cleanup, not a session lifecycle step.
    pub fn evict(&self, session_id: &SessionId) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.records.remove(session_id).is_some();
        record_active(inner.records.len());
        drop(inner);
        if removed {
            counter!(SESSIONS_EVICTED, "reason" => "manual").increment(1);
            debug!(session_id = %session_id, "session evicted");
        }
        removed
    }

    /// Number of records currently held, waiting and completed alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the registry holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expiry
    // ─────────────────────────────────────────────────────────────────────

    /// Remove expired records in one critical section.
    ///
    /// A completed record expires once `now - completed_at` exceeds
    /// `completed_retention`; a waiting record expires once
    /// `now - created_at` exceeds `waiting_ttl`. Records stamped after `now`
    /// (clock skew) never expire. Emits no events.
    pub fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        completed_retention: Duration,
        waiting_ttl: Duration,
    ) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let mut inner = self.inner.lock();
        inner.records.retain(|_, record| {
            if record.is_completed() {
                let stamp = record.completed_at().unwrap_or(record.created_at);
                if expired(stamp, now, completed_retention) {
                    outcome.completed_evicted += 1;
                    return false;
                }
            } else if expired(record.created_at, now, waiting_ttl) {
                outcome.stale_evicted += 1;
                return false;
            }
            true
        });
        record_active(inner.records.len());
        drop(inner);

        if !outcome.is_empty() {
            counter!(SESSIONS_EVICTED, "reason" => "completed")
                .increment(outcome.completed_evicted);
            counter!(SESSIONS_EVICTED, "reason" => "stale").increment(outcome.stale_evicted);
            info!(
                completed_evicted = outcome.completed_evicted,
                stale_evicted = outcome.stale_evicted,
                "swept expired sessions"
            );
        }
        outcome
    }
}

/// Whether `stamp` is older than `window` as of `now`. Negative ages (stamp
/// in the future) count as not expired.
fn expired(stamp: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    (now - stamp).to_std().is_ok_and(|age| age > window)
}

#[allow(clippy::cast_precision_loss)]
fn record_active(len: usize) {
    gauge!(SESSIONS_ACTIVE).set(len as f64);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
