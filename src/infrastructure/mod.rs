//! # Infrastructure Layer
//!
//! Concrete adapters for the domain traits: Telegram (teloxide), persistent
//! storage, translations and link shortening.

pub mod content;
pub mod i18n;
pub mod membership;
pub mod password;
pub mod shortener;
pub mod storage;
pub mod telegram;
