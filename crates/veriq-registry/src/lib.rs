//! # veriq-registry
//!
//! The in-memory session registry and its background expiry sweeper.
//!
//! - **[`SessionRegistry`]**: create / get / complete / list / evict under a
//!   single lock, with consistent-snapshot event emission
//! - **[`run_sweeper`]**: periodic eviction of completed and abandoned
//!   records, configured by [`SweeperConfig`]

#![deny(unsafe_code)]

pub mod registry;
pub mod sweeper;

pub use registry::{SessionRegistry, SweepOutcome, DEFAULT_EVENT_CAPACITY};
pub use sweeper::{run_sweeper, SweeperConfig};
