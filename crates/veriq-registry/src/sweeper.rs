//! Background expiry sweeper.
//!
//! One task per process. Every tick it asks the registry to drop completed
//! records past their retention window and waiting records past the
//! abandonment ceiling. Sweeps are silent; connected admins converge on the
//! next list broadcast instead of receiving per-eviction events.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::registry::SessionRegistry;

/// Timing knobs for the expiry sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweeperConfig {
    /// How often the sweep runs. Zero is clamped to one millisecond.
    pub interval: Duration,
    /// How long completed records linger before eviction.
    pub completed_retention: Duration,
    /// Ceiling after which a waiting record counts as abandoned.
    pub waiting_ttl: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            completed_retention: Duration::from_secs(10),
            waiting_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Run the sweep loop until `cancel` fires.
///
/// Spawned once at startup; the returned future completes only after
/// cancellation, so shutdown can await it.
pub async fn run_sweeper(
    registry: Arc<SessionRegistry>,
    config: SweeperConfig,
    cancel: CancellationToken,
) {
    // tokio::time::interval panics on a zero period, which a settings file
    // can hand us. Clamp like the registry clamps its event capacity.
    let period = config.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = registry.sweep_expired(
                    Utc::now(),
                    config.completed_retention,
                    config.waiting_ttl,
                );
                if !outcome.is_empty() {
                    debug!(
                        completed_evicted = outcome.completed_evicted,
                        stale_evicted = outcome.stale_evicted,
                        "sweep tick"
                    );
                }
            }
            () = cancel.cancelled() => {
                debug!("sweeper cancelled");
                return;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
