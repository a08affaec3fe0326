//! # veriqd
//!
//! veriq server binary — wires together settings, logging, the session
//! registry, and the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use veriq_registry::{run_sweeper, SessionRegistry, SweeperConfig};
use veriq_server::config::ServerConfig;
use veriq_server::rpc::context::RpcContext;
use veriq_server::rpc::registry::MethodRegistry;
use veriq_server::server::VeriqServer;
use veriq_server::websocket::broadcast::BroadcastManager;
use veriq_server::websocket::event_bridge::EventBridge;
use veriq_settings::{load_settings_from_path, VeriqSettings};

/// veriq session pairing server.
#[derive(Parser, Debug)]
#[command(name = "veriqd", about = "veriq session pairing server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default: `~/.veriq/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Emit newline-delimited JSON logs regardless of settings.
    #[arg(long)]
    log_json: bool,
}

/// Apply command-line overrides on top of loaded settings. Flags beat file
/// and environment values.
fn apply_cli_overrides(mut settings: VeriqSettings, args: &Cli) -> VeriqSettings {
    if let Some(host) = &args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if args.log_json {
        settings.logging.json = true;
    }
    settings
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load settings early (needed for log level before logging init). A path
    // given on the command line must load; the default path is best-effort.
    let (settings_path, settings) = match &args.settings {
        Some(path) => {
            let settings = load_settings_from_path(path).with_context(|| {
                format!("Failed to load settings from {}", path.display())
            })?;
            (path.clone(), settings)
        }
        None => {
            let path = veriq_settings::settings_path();
            let settings = load_settings_from_path(&path).unwrap_or_default();
            (path, settings)
        }
    };
    let settings = apply_cli_overrides(settings, &args);

    veriq_logging::init_logging(&settings.logging);
    tracing::debug!(path = %settings_path.display(), "settings loaded");

    // Seed the process-wide settings so later get_settings() callers see the
    // flag-adjusted values
    let _ = veriq_settings::init_settings(settings.clone());

    let metrics_handle = veriq_server::metrics::install_recorder();

    // Session registry + background expiry sweep
    let sessions = Arc::new(SessionRegistry::with_event_capacity(
        settings.registry.dedup_policy,
        settings.registry.event_buffer_size,
    ));
    let sweeper_config = SweeperConfig {
        interval: Duration::from_secs(settings.registry.sweep_interval_secs),
        completed_retention: Duration::from_secs(settings.registry.completed_retention_secs),
        waiting_ttl: Duration::from_secs(settings.registry.waiting_ttl_secs),
    };

    // RPC context
    let broadcast = Arc::new(BroadcastManager::new());
    let rpc_context = RpcContext {
        sessions: sessions.clone(),
        broadcast,
        server_start_time: std::time::Instant::now(),
    };

    // Method registry
    let mut registry = MethodRegistry::new();
    veriq_server::rpc::handlers::register_all(&mut registry);
    let method_count = registry.methods().len();

    // Build and start server
    let config = ServerConfig::from(&settings.server);
    let server = VeriqServer::new(config, registry, rpc_context, metrics_handle);

    // Event bridge: registry events → WebSocket clients
    let bridge = EventBridge::new(sessions.clone(), server.broadcast().clone());
    let bridge_handle = tokio::spawn(bridge.run(server.shutdown().token()));
    let sweeper_handle = tokio::spawn(run_sweeper(
        sessions,
        sweeper_config,
        server.shutdown().token(),
    ));

    let (addr, listener_handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!("veriq listening on http://{addr} ({method_count} RPC methods registered)");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server
        .shutdown()
        .graceful_shutdown(
            vec![listener_handle, bridge_handle, sweeper_handle],
            None,
        )
        .await;

    tracing::info!("Shutdown complete");
    Ok(())
}
