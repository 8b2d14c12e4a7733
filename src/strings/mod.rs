//! # Strings Module
//!
//! Centralizes user-facing strings and log lines.
//! The user-facing ones double as the built-in English locale.

pub mod logs;
pub mod messages;
