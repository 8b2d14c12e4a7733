//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the gate.
//! Independent of Telegram and storage specifics, serving as the contract for other layers.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
