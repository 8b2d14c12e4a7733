//! # Payload Router
//!
//! Classifies the `/start` payload into exactly one flow and runs it.
//! The flow handlers live in `interface/flows`.

use std::sync::Arc;

use crate::application::gate::Collaborators;
use crate::application::payload::{Flow, Payload, classify, extract_payload};
use crate::application::utils::preview;
use crate::domain::config::GatePolicy;
use crate::domain::error::GateError;
use crate::domain::types::InboundEvent;
use crate::interface::flows::{self, FlowContext};

pub struct PayloadRouter {
    policy: Arc<GatePolicy>,
    deps: Arc<Collaborators>,
}

impl PayloadRouter {
    pub fn new(policy: Arc<GatePolicy>, deps: Arc<Collaborators>) -> Self {
        Self { policy, deps }
    }

    /// Picks the flow for an event. Only consults the grant store when the
    /// answer depends on it.
    pub async fn classify(&self, event: &InboundEvent) -> Result<Flow, GateError> {
        let payload = Payload::parse(&event.raw_text);
        let has_grant = if payload.needs_grant_check(&self.policy) {
            self.deps
                .grants
                .has_active_grant(event.user_id, self.deps.clock.now_millis())
                .await?
        } else {
            false
        };
        Ok(classify(payload, &self.policy, has_grant))
    }

    /// Classifies the event and runs the selected flow. Returns the flow that ran.
    pub async fn route(&self, event: &InboundEvent, lang: &str) -> Result<Flow, GateError> {
        let flow = self.classify(event).await?;

        tracing::info!(
            user_id = %event.user_id,
            flow = flow.name(),
            payload = %preview(extract_payload(&event.raw_text), 32),
            "Routing /start"
        );

        let ctx = FlowContext {
            event,
            lang,
            policy: &self.policy,
            deps: &self.deps,
        };

        match &flow {
            Flow::Welcome => flows::welcome::handle_welcome(&ctx).await?,
            Flow::PasswordUnlock(payload) => {
                self.deps
                    .password
                    .unlock(event.user_id, payload, lang)
                    .await?
            }
            Flow::TokenValidation(issued_at) => {
                let state = flows::token::handle_token(&ctx, *issued_at).await?;
                tracing::debug!(user_id = %event.user_id, ?state, "Token flow finished");
            }
            Flow::Discard => {
                self.deps
                    .transport
                    .delete(event.user_id, event.message)
                    .await?
            }
            Flow::ForceToken(payload) => flows::force_token::handle_force_token(&ctx, payload).await?,
            Flow::ContentDecode(code) => flows::decode::handle_decode(&ctx, code).await?,
        }

        Ok(flow)
    }
}
