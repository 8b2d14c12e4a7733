//! # Domain Traits
//!
//! Capability interfaces for everything the gate talks to (Telegram, storage,
//! translations, link shortening, content decoding).
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::error::{DecodeError, GateError};
use crate::domain::types::{
    Content, Membership, MessageRef, OutgoingMessage, Translated, UserDefaults, UserId,
};

/// Abstract interface for the messaging transport (e.g., Telegram).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message to the user and return its reference.
    async fn send(&self, user: UserId, message: OutgoingMessage) -> Result<MessageRef, GateError>;

    /// Delete a message from the user's chat.
    async fn delete(&self, user: UserId, message: MessageRef) -> Result<(), GateError>;

    /// Deliver resolved content to the user.
    async fn deliver(&self, user: UserId, content: &Content) -> Result<(), GateError>;
}

/// Persistent user storage.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    /// Insert the user with `defaults` if absent; never touches an existing record.
    /// Returns whether the user already existed.
    async fn upsert(&self, user: UserId, defaults: &UserDefaults) -> Result<bool, GateError>;

    /// Stored language preference, if the user is known.
    async fn language(&self, user: UserId) -> Result<Option<String>, GateError>;
}

/// Access grants issued by the token flow.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Whether the user holds a grant that has not outlived the policy window at `now_ms`.
    async fn has_active_grant(&self, user: UserId, now_ms: i64) -> Result<bool, GateError>;

    /// Compare-and-insert: records a grant issued at `issued_at_ms` unless an
    /// active one already exists. Returns true when a grant was written.
    async fn insert_if_absent(&self, user: UserId, issued_at_ms: i64) -> Result<bool, GateError>;
}

/// Forced-subscription check run before any flow.
#[async_trait]
pub trait MembershipGuard: Send + Sync {
    async fn enforce(&self, user: UserId, payload: &str, lang: &str)
    -> Result<Membership, GateError>;
}

/// Translation lookup.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn resolve(
        &self,
        key: &str,
        button_key: Option<&str>,
        lang: &str,
    ) -> Result<Translated, GateError>;
}

/// URL shortening service.
#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, url: &str) -> Result<String, GateError>;
}

/// Opaque decoder turning a deep-link code into content.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn decode(
        &self,
        code: &str,
        user: UserId,
        reply_to: MessageRef,
    ) -> Result<Content, DecodeError>;
}

/// Handles `password...` deep links.
#[async_trait]
pub trait PasswordUnlocker: Send + Sync {
    async fn unlock(&self, user: UserId, payload: &str, lang: &str) -> Result<(), GateError>;
}

/// Users that bypass subscription enforcement and registration.
pub trait AllowList: Send + Sync {
    fn contains(&self, user: UserId) -> bool;
}

impl AllowList for HashSet<UserId> {
    fn contains(&self, user: UserId) -> bool {
        HashSet::contains(self, &user)
    }
}

/// Wall clock in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}
