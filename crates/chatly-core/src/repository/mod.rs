//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (chatly-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod blacklist;
pub mod user;
