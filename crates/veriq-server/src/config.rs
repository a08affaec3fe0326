//! Server configuration.

use serde::{Deserialize, Serialize};
use veriq_settings::ServerSettings;

/// Configuration for the veriq server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat ping interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Heartbeat timeout in milliseconds (disconnect after this long without a pong).
    pub heartbeat_timeout_ms: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 256,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 60_000,
            max_message_size: 64 * 1024, // 64 KB
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_connections: settings.max_connections,
            heartbeat_interval_ms: settings.heartbeat_interval_ms,
            heartbeat_timeout_ms: settings.heartbeat_timeout_ms,
            max_message_size: settings.max_message_size,
        }
    }
}

impl ServerConfig {
    /// Heartbeat ping interval as a [`std::time::Duration`].
    #[must_use]
    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Heartbeat timeout as a [`std::time::Duration`].
    #[must_use]
    pub fn heartbeat_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn default_port_is_zero() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_max_connections() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_connections, 256);
    }

    #[test]
    fn default_heartbeat_interval() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval_ms, 30_000);
        assert_eq!(cfg.heartbeat_interval(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn default_heartbeat_timeout() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_timeout_ms, 60_000);
        assert_eq!(cfg.heartbeat_timeout(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn default_max_message_size() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_message_size, 64 * 1024);
    }

    #[test]
    fn from_settings() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 3000,
            max_connections: 64,
            heartbeat_interval_ms: 15_000,
            heartbeat_timeout_ms: 45_000,
            max_message_size: 1024,
        };
        let cfg = ServerConfig::from(&settings);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_connections, 64);
        assert_eq!(cfg.heartbeat_interval_ms, 15_000);
        assert_eq!(cfg.heartbeat_timeout_ms, 45_000);
        assert_eq!(cfg.max_message_size, 1024);
    }

    #[test]
    fn from_default_settings_matches_production_defaults() {
        let cfg = ServerConfig::from(&ServerSettings::default());
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_connections, 256);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_connections, cfg.max_connections);
        assert_eq!(back.heartbeat_interval_ms, cfg.heartbeat_interval_ms);
        assert_eq!(back.heartbeat_timeout_ms, cfg.heartbeat_timeout_ms);
        assert_eq!(back.max_message_size, cfg.max_message_size);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"10.0.0.1","port":3000,"max_connections":5,"heartbeat_interval_ms":10000,"heartbeat_timeout_ms":30000,"max_message_size":512}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "10.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_connections, 5);
    }
}
