//! # veriq-rpc
//!
//! Wire format for the WebSocket RPC protocol.
//!
//! Clients send [`RpcRequest`] frames and receive exactly one [`RpcResponse`]
//! per request, correlated by `id`. The server additionally pushes
//! [`RpcEvent`] frames (distinguished by their `type` field) to admins and to
//! connections attached to a session.
//!
//! The method surface itself lives in the server crate; this crate owns only
//! the envelope types, the error codes, and the pushed-event names.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod types;

pub use errors::RpcError;
pub use types::{RpcErrorBody, RpcEvent, RpcRequest, RpcResponse};
