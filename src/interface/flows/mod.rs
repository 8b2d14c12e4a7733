//! # Flow Handlers
//!
//! One handler per `/start` flow. The discard and password flows are a single
//! collaborator call each and are run inline by the router.

pub mod decode;
pub mod force_token;
pub mod token;
pub mod welcome;

use crate::application::gate::Collaborators;
use crate::domain::config::GatePolicy;
use crate::domain::types::{InboundEvent, UserId};

/// Everything a flow handler needs for one event.
pub struct FlowContext<'a> {
    pub event: &'a InboundEvent,
    /// Resolved language for this user.
    pub lang: &'a str,
    pub policy: &'a GatePolicy,
    pub deps: &'a Collaborators,
}

impl FlowContext<'_> {
    pub fn user(&self) -> UserId {
        self.event.user_id
    }
}
