//! # Token Flow
//!
//! Handles `tokenTime<millis>` links produced by the force-token flow.
//! A fresh token records an access grant and silently removes the command;
//! anything else gets the fixed "generate a new link" notice.

use crate::application::token::{TokenState, is_fresh};
use crate::domain::error::GateError;
use crate::domain::types::OutgoingMessage;
use crate::interface::flows::FlowContext;
use crate::strings::messages;

pub async fn handle_token(
    ctx: &FlowContext<'_>,
    issued_at: Option<i64>,
) -> Result<TokenState, GateError> {
    let now = ctx.deps.clock.now_millis();

    if !is_fresh(issued_at, now, ctx.policy.token_window_ms()) {
        tracing::info!(user_id = %ctx.user(), ?issued_at, now, "Token link expired");
        ctx.deps
            .transport
            .send(ctx.user(), OutgoingMessage::text(messages::TOKEN_EXPIRED))
            .await?;
        return Ok(TokenState::Expired);
    }

    let state = if ctx.deps.grants.insert_if_absent(ctx.user(), now).await? {
        tracing::info!(user_id = %ctx.user(), "Access granted");
        TokenState::FreshUnseen
    } else {
        TokenState::FreshSeen
    };

    ctx.deps.transport.delete(ctx.user(), ctx.event.message).await?;
    Ok(state)
}
