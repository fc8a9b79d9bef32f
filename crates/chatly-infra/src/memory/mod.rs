//! In-process adapters, used when persistence is not wanted.

pub mod blacklist;
