//! Password-protected links: replies with the localized prompt naming the
//! protected code. Verifying the password happens outside the `/start` gate.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::payload::PASSWORD_PREFIX;
use crate::domain::error::GateError;
use crate::domain::traits::{PasswordUnlocker, Transport, Translator};
use crate::domain::types::{OutgoingMessage, UserId};

pub const PASSWORD_KEY: &str = "password.message";

pub struct TelegramPasswordUnlocker {
    transport: Arc<dyn Transport>,
    translator: Arc<dyn Translator>,
}

impl TelegramPasswordUnlocker {
    pub fn new(transport: Arc<dyn Transport>, translator: Arc<dyn Translator>) -> Self {
        Self {
            transport,
            translator,
        }
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl PasswordUnlocker for TelegramPasswordUnlocker {
    async fn unlock(&self, user: UserId, payload: &str, lang: &str) -> Result<(), GateError> {
        let code = payload.strip_prefix(PASSWORD_PREFIX).unwrap_or(payload);
        let translated = self.translator.resolve(PASSWORD_KEY, None, lang).await?;
        let text = translated.text.replace("{code}", &escape_html(code));

        self.transport.send(user, OutgoingMessage::text(text)).await?;
        tracing::info!(user_id = %user, "Password prompt sent");
        Ok(())
    }
}
