//! # Interface Layer
//!
//! Handlers for each `/start` flow. They are invoked by the Payload Router.

pub mod flows;
