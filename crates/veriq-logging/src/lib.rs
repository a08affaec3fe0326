//! # veriq-logging
//!
//! Tracing subscriber setup.
//!
//! One structured-logging pipeline for the whole process: an `EnvFilter`
//! (honoring `RUST_LOG`, falling back to the configured level) feeding a
//! single `fmt` layer on stderr, human-readable by default or
//! newline-delimited JSON when configured.

#![deny(unsafe_code)]

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use veriq_settings::LoggingSettings;

/// Initialize the global tracing subscriber.
///
/// Call once at application startup. Subsequent calls are no-ops. `RUST_LOG`
/// overrides the configured level when set.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_filter_str()));

    let fmt_layer = if settings.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    // try_init is a no-op if a subscriber is already set
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
