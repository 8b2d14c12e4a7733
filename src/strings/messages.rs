//! # Messages
//!
//! Built-in user-facing strings. Locale files override the translatable ones;
//! the fixed notices below are never translated.

/// Sent when a `tokenTime` link is outside its window or malformed.
pub const TOKEN_EXPIRED: &str = "Please generate new link and try again..";

pub const WELCOME: &str = concat!(
    "<b>👋 Welcome!</b>\n\n",
    "I deliver files shared through my links.\n",
    "Open a link you received to get its file."
);

pub const FORCE_TOKEN: &str = concat!(
    "<b>🔐 Access token required</b>\n\n",
    "Your access has expired. Tap <i>Refresh Token</i>, complete the short link ",
    "and come back to get your file."
);
pub const FORCE_TOKEN_REFRESH: &str = "🔄 Refresh Token";
pub const FORCE_TOKEN_RETRY: &str = "📂 Get File";

pub const FORCE_SUB: &str = concat!(
    "<b>📢 Join our channel first</b>\n\n",
    "You need to be a member of our channel to use this bot. ",
    "Join, then tap <i>Try Again</i>."
);
pub const FORCE_SUB_JOIN: &str = "📢 Join Channel";
pub const FORCE_SUB_RETRY: &str = "🔄 Try Again";

pub const PASSWORD_PROMPT: &str = concat!(
    "<b>🔑 This file is password protected.</b>\n\n",
    "Reply to this message with the password for <code>{code}</code>."
);

pub const DECODE_ERROR: &str = "❌ This link is invalid or the file is no longer available.";

/// Built-in text for a translation key.
pub fn builtin_text(key: &str) -> Option<&'static str> {
    match key {
        "help.0.message" => Some(WELCOME),
        "force.message" => Some(FORCE_TOKEN),
        "force_sub.message" => Some(FORCE_SUB),
        "password.message" => Some(PASSWORD_PROMPT),
        "decode.error" => Some(DECODE_ERROR),
        _ => None,
    }
}

/// Built-in button labels for a translation key, in display order.
pub fn builtin_button_labels(key: &str) -> &'static [&'static str] {
    match key {
        "force.button" => &[FORCE_TOKEN_REFRESH, FORCE_TOKEN_RETRY],
        "force_sub.button" => &[FORCE_SUB_JOIN, FORCE_SUB_RETRY],
        _ => &[],
    }
}
