//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format. Each type implements [`Default`] with production default values.
//! Types marked with `#[serde(default)]` allow partial JSON — missing fields
//! get their default value during deserialization.

mod registry;
mod server;

pub use registry::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the veriq service.
///
/// Loaded from `~/.veriq/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "name": "veriq",
///   "server": { "port": 8080 },
///   "registry": { "dedupPolicy": "none" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VeriqSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Server network settings.
    pub server: ServerSettings,
    /// Session registry behavior.
    pub registry: RegistrySettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for VeriqSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "veriq".to_string(),
            server: ServerSettings::default(),
            registry: RegistrySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_defaults() {
        let s = VeriqSettings::default();
        assert_eq!(s.version, "0.1.0");
        assert_eq!(s.name, "veriq");
        assert_eq!(s.server.port, 3000);
        assert_eq!(s.registry.sweep_interval_secs, 30);
    }

    #[test]
    fn root_partial_json() {
        let json = serde_json::json!({
            "server": { "port": 9090 }
        });
        let s: VeriqSettings = serde_json::from_value(json).unwrap();
        assert_eq!(s.server.port, 9090);
        assert_eq!(s.name, "veriq");
        assert_eq!(s.registry.waiting_ttl_secs, 1800);
    }

    #[test]
    fn root_roundtrip() {
        let s = VeriqSettings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: VeriqSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, s.server.port);
        assert_eq!(back.registry.dedup_policy, s.registry.dedup_policy);
        assert_eq!(back.logging.level, s.logging.level);
    }
}
