//! RPC layer — handler context, method registry, and the method surface.

pub mod context;
pub mod handlers;
pub mod registry;
pub mod validation;
