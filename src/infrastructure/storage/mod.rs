//! # Storage Backends
//!
//! User registry and grant store implementations. The JSON file registry is
//! always available; Redis needs the `redis` cargo feature.

pub mod file;
#[cfg(feature = "redis")]
pub mod redis;

pub use file::FileUserRegistry;
