//! # Telegram Adapter
//!
//! Implements `Transport` and `MemberLookup` on top of `teloxide`.
//! This module is the bridge between the gate's domain messages and the Bot API:
//! HTML parse mode, inline keyboards, photos by URL or local path, and
//! rate-limit errors surfaced as `GateError::RateLimited`.

use async_trait::async_trait;
use std::path::PathBuf;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode, Recipient,
    ReplyParameters,
};
use teloxide::{ApiError, RequestError};

use crate::domain::error::GateError;
use crate::domain::traits::Transport;
use crate::domain::types::{
    Button, ButtonAction, Content, InboundEvent, Keyboard, MessageRef, OutgoingMessage, PeerKind,
    UserId,
};
use crate::infrastructure::membership::{ChannelRef, MemberLookup};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// `RetryAfter` becomes a retryable `RateLimited`; everything else is a plain transport error.
pub fn map_request_error(err: RequestError) -> GateError {
    match err {
        RequestError::RetryAfter(wait) => GateError::RateLimited {
            retry_after: wait.duration(),
        },
        other => GateError::Transport(other.to_string()),
    }
}

fn chat_of(user: UserId) -> ChatId {
    ChatId(user.0)
}

fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| row.iter().filter_map(to_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn to_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Url(url) => match reqwest::Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::url(button.text.clone(), url)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Dropping button with invalid URL");
                None
            }
        },
        ButtonAction::Callback(data) => Some(InlineKeyboardButton::callback(
            button.text.clone(),
            data.clone(),
        )),
    }
}

/// Remote URLs are passed through; anything else is read from disk.
fn input_file(media: &str) -> InputFile {
    match reqwest::Url::parse(media) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => InputFile::url(url),
        _ => InputFile::file(PathBuf::from(media)),
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, user: UserId, message: OutgoingMessage) -> Result<MessageRef, GateError> {
        let chat = chat_of(user);
        let markup = message.keyboard.as_ref().map(to_markup);
        let reply = message
            .reply_to
            .map(|r| ReplyParameters::new(MessageId(r.0)));

        let sent = match &message.media {
            Some(media) => {
                let mut req = self
                    .bot
                    .send_photo(chat, input_file(media))
                    .caption(message.text.clone())
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                if let Some(reply) = reply {
                    req = req.reply_parameters(reply);
                }
                req.await
            }
            None => {
                let mut req = self
                    .bot
                    .send_message(chat, message.text.clone())
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                if let Some(reply) = reply {
                    req = req.reply_parameters(reply);
                }
                req.await
            }
        }
        .map_err(map_request_error)?;

        tracing::debug!(user_id = %user, message_id = sent.id.0, "Message sent");
        Ok(MessageRef(sent.id.0))
    }

    async fn delete(&self, user: UserId, message: MessageRef) -> Result<(), GateError> {
        self.bot
            .delete_message(chat_of(user), MessageId(message.0))
            .await
            .map(|_| ())
            .map_err(map_request_error)
    }

    async fn deliver(&self, user: UserId, content: &Content) -> Result<(), GateError> {
        match content {
            Content::Copy { from_chat, message } => {
                self.bot
                    .copy_message(chat_of(user), ChatId(*from_chat), MessageId(message.0))
                    .await
                    .map_err(map_request_error)?;
                tracing::info!(user_id = %user, from_chat, message_id = message.0, "Content delivered");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MemberLookup for TelegramTransport {
    async fn is_member(&self, channel: &ChannelRef, user: UserId) -> Result<bool, GateError> {
        let recipient = match channel {
            ChannelRef::Id(id) => Recipient::Id(ChatId(*id)),
            ChannelRef::Username(name) => Recipient::ChannelUsername(format!("@{name}")),
        };
        match self
            .bot
            .get_chat_member(recipient, teloxide::types::UserId(user.0 as u64))
            .await
        {
            Ok(member) => Ok(member.kind.is_present()),
            Err(RequestError::Api(ApiError::UserNotFound)) => Ok(false),
            Err(e) => Err(map_request_error(e)),
        }
    }
}

/// Converts a Telegram message into an `InboundEvent`. Non-text messages and
/// messages without a sender are skipped.
pub fn inbound_event(msg: &Message, bot_id: teloxide::types::UserId) -> Option<InboundEvent> {
    let text = msg.text()?;
    let from = msg.from.as_ref()?;

    let peer_kind = if msg.chat.is_private() {
        PeerKind::Direct
    } else if msg.chat.is_channel() {
        PeerKind::Channel
    } else {
        PeerKind::Group
    };

    Some(InboundEvent {
        user_id: UserId(from.id.0 as i64),
        message: MessageRef(msg.id.0),
        raw_text: text.to_string(),
        is_outgoing: from.id == bot_id,
        peer_kind,
        language_hint: from.language_code.clone(),
    })
}
