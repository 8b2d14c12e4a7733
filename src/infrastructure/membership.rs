//! # Subscription Guard
//!
//! Forced-subscription check. Users who are not members of the required
//! channel get a localized prompt with a join button and a "try again" deep
//! link that carries their original payload, and handling stops there.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::config::{ChannelConfig, GatePolicy};
use crate::domain::error::GateError;
use crate::domain::traits::{MembershipGuard, Transport, Translator};
use crate::domain::types::{Button, Keyboard, Membership, OutgoingMessage, UserId};
use crate::strings::messages::builtin_button_labels;

pub const FORCE_SUB_KEY: &str = "force_sub.message";
pub const FORCE_SUB_BUTTONS: &str = "force_sub.button";

/// Channel the user must belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(i64),
    /// Public username, without the leading `@`.
    Username(String),
}

impl ChannelRef {
    /// Accepts `-1001234567890`, `@name` or `name`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Some(Self::Id(id));
        }
        let name = raw.trim_start_matches('@');
        (!name.is_empty()).then(|| Self::Username(name.to_string()))
    }

    /// Public link for username channels.
    pub fn public_link(&self) -> Option<String> {
        match self {
            Self::Username(name) => Some(format!("https://t.me/{name}")),
            Self::Id(_) => None,
        }
    }
}

/// Membership query against the chat platform.
#[async_trait]
pub trait MemberLookup: Send + Sync {
    async fn is_member(&self, channel: &ChannelRef, user: UserId) -> Result<bool, GateError>;
}

pub struct TelegramMembershipGuard {
    channel: Option<ChannelRef>,
    join_link: Option<String>,
    policy: Arc<GatePolicy>,
    lookup: Arc<dyn MemberLookup>,
    transport: Arc<dyn Transport>,
    translator: Arc<dyn Translator>,
}

impl TelegramMembershipGuard {
    pub fn new(
        config: &ChannelConfig,
        policy: Arc<GatePolicy>,
        lookup: Arc<dyn MemberLookup>,
        transport: Arc<dyn Transport>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let channel = config.required.as_deref().and_then(ChannelRef::parse);
        let join_link = config
            .invite_link
            .clone()
            .filter(|link| !link.trim().is_empty())
            .or_else(|| channel.as_ref().and_then(ChannelRef::public_link));
        Self {
            channel,
            join_link,
            policy,
            lookup,
            transport,
            translator,
        }
    }

    fn retry_link(&self, payload: &str) -> String {
        if payload.is_empty() {
            self.policy.bot_link()
        } else {
            self.policy.deep_link(payload)
        }
    }

    async fn prompt(&self, user: UserId, payload: &str, lang: &str) -> Result<(), GateError> {
        let translated = self
            .translator
            .resolve(FORCE_SUB_KEY, Some(FORCE_SUB_BUTTONS), lang)
            .await?;

        let builtin = builtin_button_labels(FORCE_SUB_BUTTONS);
        let label = |i: usize| {
            translated
                .buttons
                .get(i)
                .map(|b| b.text.clone())
                .or_else(|| builtin.get(i).map(|s| s.to_string()))
                .unwrap_or_default()
        };

        let mut buttons = Vec::new();
        if let Some(link) = &self.join_link {
            buttons.push(Button::url(label(0), link.clone()));
        }
        buttons.push(Button::url(label(1), self.retry_link(payload)));

        let message = OutgoingMessage::text(translated.text.clone())
            .with_keyboard(Keyboard::arrange(buttons, "11"));
        self.transport.send(user, message).await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipGuard for TelegramMembershipGuard {
    async fn enforce(
        &self,
        user: UserId,
        payload: &str,
        lang: &str,
    ) -> Result<Membership, GateError> {
        let Some(channel) = &self.channel else {
            return Ok(Membership::Proceed);
        };

        if self.lookup.is_member(channel, user).await? {
            return Ok(Membership::Proceed);
        }

        tracing::info!(user_id = %user, channel = ?channel, "User not subscribed, sending join prompt");
        self.prompt(user, payload, lang).await?;
        Ok(Membership::Stop)
    }
}
