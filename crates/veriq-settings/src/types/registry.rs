//! Registry behavior settings.

use serde::{Deserialize, Serialize};
use veriq_core::DedupPolicy;

/// Session registry and expiry-sweep settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrySettings {
    /// How creation treats an existing waiting record with the same
    /// document number.
    pub dedup_policy: DedupPolicy,
    /// How often the expiry sweep runs, in seconds.
    pub sweep_interval_secs: u64,
    /// How long completed records stay retrievable after completion,
    /// in seconds.
    pub completed_retention_secs: u64,
    /// Ceiling after which an unclaimed waiting record counts as abandoned,
    /// in seconds.
    pub waiting_ttl_secs: u64,
    /// Buffered registry events per subscriber before the event channel
    /// reports lag.
    pub event_buffer_size: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            dedup_policy: DedupPolicy::ByDocument,
            sweep_interval_secs: 30,
            completed_retention_secs: 10,
            waiting_ttl_secs: 1800,
            event_buffer_size: 256,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
