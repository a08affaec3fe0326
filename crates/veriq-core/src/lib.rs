//! # veriq-core
//!
//! Foundation types for the veriq session-pairing service.
//!
//! This crate provides the shared vocabulary the other veriq crates depend on:
//!
//! - **Branded IDs**: [`SessionId`], [`ConnectionId`] as newtypes for type safety
//! - **Documents**: [`DocumentType`] with wire codes and operator-facing labels
//! - **Sessions**: [`SessionRecord`] and its `Waiting → Completed` lifecycle
//! - **Events**: [`RegistryEvent`] carrying mutation + consistent snapshot
//! - **Errors**: [`RegistryError`] via `thiserror`

#![deny(unsafe_code)]

pub mod constants;
pub mod document;
pub mod errors;
pub mod events;
pub mod ids;
pub mod session;

pub use document::DocumentType;
pub use errors::{RegistryError, Result};
pub use events::RegistryEvent;
pub use ids::{ConnectionId, SessionId};
pub use session::{DedupPolicy, SessionOutcome, SessionRecord, SessionStatus};
