//! # Force-Token Flow
//!
//! Sent instead of content when expiration is enabled and the user holds no
//! active grant. Offers a (shortened) link that issues a fresh token and, for
//! substantive payloads, a link straight back to the requested content.

use crate::application::payload::{SUBSTANTIVE_PAYLOAD_LEN, TOKEN_PREFIX};
use crate::domain::error::GateError;
use crate::domain::types::{Button, Keyboard, OutgoingMessage};
use crate::interface::flows::FlowContext;
use crate::strings::messages::builtin_button_labels;

pub const FORCE_KEY: &str = "force.message";
pub const FORCE_BUTTONS: &str = "force.button";
pub const FORCE_LAYOUT: &str = "11";

pub async fn handle_force_token(ctx: &FlowContext<'_>, payload: &str) -> Result<(), GateError> {
    let translated = ctx
        .deps
        .translator
        .resolve(FORCE_KEY, Some(FORCE_BUTTONS), ctx.lang)
        .await?;

    let now = ctx.deps.clock.now_millis();
    let renew = ctx
        .deps
        .shortener
        .shorten(&ctx.policy.deep_link(&format!("{TOKEN_PREFIX}{now}")))
        .await?;

    let mut urls = vec![renew];
    if payload.chars().count() > SUBSTANTIVE_PAYLOAD_LEN {
        urls.push(ctx.policy.deep_link(payload));
    }

    let labels: Vec<String> = translated.buttons.into_iter().map(|b| b.text).collect();
    let buttons = label_buttons(&labels, urls);

    tracing::info!(user_id = %ctx.user(), buttons = buttons.len(), "Token required");

    let message = OutgoingMessage::text(translated.text)
        .with_keyboard(Keyboard::arrange(buttons, FORCE_LAYOUT));
    ctx.deps.transport.send(ctx.user(), message).await?;
    Ok(())
}

/// Pairs URLs with labels in order. Missing labels fall back to the built-in ones.
fn label_buttons(labels: &[String], urls: Vec<String>) -> Vec<Button> {
    let builtin = builtin_button_labels(FORCE_BUTTONS);
    urls.into_iter()
        .enumerate()
        .map(|(i, url)| {
            let label = labels
                .get(i)
                .map(String::as_str)
                .or_else(|| builtin.get(i).copied())
                .unwrap_or("🔗");
            Button::url(label, url)
        })
        .collect()
}
