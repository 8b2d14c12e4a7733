//! # Domain Types
//!
//! Common data structures used across the gate: identities, inbound events,
//! outgoing messages with their inline keyboards, and deliverable content.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram user id. In a private chat this is also the chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a message inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// Kind of conversation an event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKind {
    Direct,
    Group,
    Channel,
}

/// A single inbound text message, stripped down to what the gate needs.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub message: MessageRef,
    pub raw_text: String,
    pub is_outgoing: bool,
    pub peer_kind: PeerKind,
    /// Language reported by the client, if any (e.g. Telegram's `language_code`).
    pub language_hint: Option<String>,
}

impl InboundEvent {
    /// True when this event is an incoming `/start` in a private chat.
    pub fn is_start_command(&self) -> bool {
        self.peer_kind == PeerKind::Direct
            && !self.is_outgoing
            && self
                .raw_text
                .get(..crate::application::payload::START_COMMAND.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(crate::application::payload::START_COMMAND))
    }
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Url(String),
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Lays buttons out following a row-size pattern such as `"2121"`
    /// (two buttons, then one, then two, then one). The pattern repeats
    /// until every button is placed. Non-digit or zero entries count as one.
    pub fn arrange(buttons: Vec<Button>, order: &str) -> Self {
        let sizes: Vec<usize> = order
            .chars()
            .map(|c| c.to_digit(10).map(|d| d.max(1) as usize).unwrap_or(1))
            .collect();
        let sizes = if sizes.is_empty() { vec![1] } else { sizes };

        let mut rows = Vec::new();
        let mut iter = buttons.into_iter().peekable();
        let mut step = 0;
        while iter.peek().is_some() {
            let size = sizes[step % sizes.len()];
            let row: Vec<Button> = iter.by_ref().take(size).collect();
            rows.push(row);
            step += 1;
        }
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    /// All buttons in reading order.
    #[cfg(test)]
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A message the gate wants the transport to send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Photo URL or local file path sent alongside the text.
    pub media: Option<String>,
    pub reply_to: Option<MessageRef>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = if keyboard.is_empty() { None } else { Some(keyboard) };
        self
    }

    pub fn with_media(mut self, media: Option<String>) -> Self {
        self.media = media;
        self
    }

    pub fn replying_to(mut self, message: MessageRef) -> Self {
        self.reply_to = Some(message);
        self
    }
}

/// Localized text together with the localized buttons that accompany it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translated {
    pub text: String,
    pub buttons: Vec<Button>,
}

/// Content resolved from a deep-link code.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Copy an existing message from another chat (usually the storage channel).
    Copy { from_chat: i64, message: MessageRef },
}

/// Fields written only when a user record is first created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDefaults {
    pub lang: String,
}

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub lang: String,
    pub created_at: i64,
}

/// Time-boxed permission to skip the token gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGrant {
    pub user_id: UserId,
    pub issued_at_ms: i64,
}

/// Outcome of the membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Proceed,
    /// The guard already told the user what to do; handling ends here.
    Stop,
}
