//! # Application Layer
//!
//! Contains the core logic of the gate: payload parsing, token validation,
//! access grants, the retry policy, the payload router and the `StartGate`
//! that ties them together.

pub mod gate;
pub mod grants;
pub mod logging;
pub mod payload;
pub mod retry;
pub mod router;
pub mod token;
pub mod utils;
