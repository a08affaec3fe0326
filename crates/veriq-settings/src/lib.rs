//! # veriq-settings
//!
//! Configuration management with layered sources for the veriq service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`VeriqSettings::default()`]
//! 2. **User file** — `~/.veriq/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `VERIQ_*` overrides (highest priority)
//!
//! Command-line flags beat all three; the binary applies them after loading.
//!
//! # Usage
//!
//! ```no_run
//! use veriq_settings::{get_settings, VeriqSettings};
//!
//! let settings = get_settings();
//! println!("listen port: {}", settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. The settings are loaded
/// from `~/.veriq/settings.json` with env var overrides, or fall back to
/// compiled defaults if loading fails.
static SETTINGS: OnceLock<VeriqSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.veriq/settings.json` with env var
/// overrides. On subsequent calls, returns the cached value. If loading
/// fails, returns compiled defaults.
pub fn get_settings() -> &'static VeriqSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// Returns `Ok(())` if the settings were set, or `Err(settings)` if they
/// were already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: VeriqSettings) -> std::result::Result<(), VeriqSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
