//! # veriq-server
//!
//! Axum HTTP + `WebSocket` server for the session pairing service.
//!
//! - REST endpoints: session create / fetch / redirect, waiting list, health,
//!   Prometheus metrics
//! - `WebSocket` gateway: connection management, heartbeat, RPC dispatch
//! - Event bridge: registry events fanned out to admins and attached clients
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod rpc;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::VeriqServer;
