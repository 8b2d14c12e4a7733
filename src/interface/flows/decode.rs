//! # Content Decode Flow
//!
//! Hands the code to the content resolver and delivers the result. Domain
//! errors are answered with a short notice replying to the command; failures
//! of the transport or storage follow the normal error path.

use crate::application::utils::preview;
use crate::domain::error::{DecodeError, GateError};
use crate::domain::types::OutgoingMessage;
use crate::interface::flows::FlowContext;

pub const DECODE_ERROR_KEY: &str = "decode.error";

pub async fn handle_decode(ctx: &FlowContext<'_>, code: &str) -> Result<(), GateError> {
    match ctx
        .deps
        .resolver
        .decode(code, ctx.user(), ctx.event.message)
        .await
    {
        Ok(content) => ctx.deps.transport.deliver(ctx.user(), &content).await,
        Err(DecodeError::Notified) => Ok(()),
        Err(DecodeError::Gate(error)) => Err(error),
        Err(error) => {
            tracing::warn!(
                user_id = %ctx.user(),
                code = %preview(code, 32),
                error = %error,
                "Content code rejected"
            );
            let translated = ctx
                .deps
                .translator
                .resolve(DECODE_ERROR_KEY, None, ctx.lang)
                .await?;
            let reply = OutgoingMessage::text(translated.text).replying_to(ctx.event.message);
            ctx.deps.transport.send(ctx.user(), reply).await?;
            Ok(())
        }
    }
}
