//! # Welcome Flow
//!
//! Handles a bare `/start`: sends the localized greeting (with the welcome
//! photo when configured) and removes the command message.

use crate::domain::error::GateError;
use crate::domain::types::{Keyboard, OutgoingMessage};
use crate::interface::flows::FlowContext;

pub const WELCOME_KEY: &str = "help.0.message";
pub const WELCOME_BUTTONS: &str = "help.0.button";
pub const WELCOME_LAYOUT: &str = "2121";

pub async fn handle_welcome(ctx: &FlowContext<'_>) -> Result<(), GateError> {
    let translated = ctx
        .deps
        .translator
        .resolve(WELCOME_KEY, Some(WELCOME_BUTTONS), ctx.lang)
        .await?;

    let message = OutgoingMessage::text(translated.text)
        .with_keyboard(Keyboard::arrange(translated.buttons, WELCOME_LAYOUT))
        .with_media(ctx.policy.welcome_media.clone());

    ctx.deps.transport.send(ctx.user(), message).await?;
    // Only reached once the greeting is out.
    ctx.deps.transport.delete(ctx.user(), ctx.event.message).await
}
