//! Per-connection chat session core.
//!
//! Leaf-first: `history` (bounded turn log), `codec` (text <-> turns <->
//! provider wire form), `invoker` (provider call with failure containment),
//! `session` (one connection's controller and worker loop), `registry`
//! (connection id -> session lookup and lifecycle).

pub mod codec;
pub mod history;
pub mod invoker;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
