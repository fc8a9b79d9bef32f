//! Business logic and trait definitions for Chatly.
//!
//! This crate owns the per-connection chat session core (history buffer,
//! turn codec, completion invoker, session controller, connection registry)
//! and the authentication service. It defines the "ports" (provider,
//! repository, hasher and token traits) that the infrastructure layer
//! implements, and depends only on `chatly-types` -- never on
//! `chatly-infra` or any database/HTTP crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod repository;
