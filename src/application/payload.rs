//! # Payload Parsing
//!
//! Turns the text of a `/start` command into a tagged `Payload` and classifies
//! it into exactly one `Flow`. Both steps are pure.

use crate::domain::config::GatePolicy;

pub const START_COMMAND: &str = "/start";
pub const PASSWORD_PREFIX: &str = "password";
pub const TOKEN_PREFIX: &str = "tokenTime";
pub const WASTE: &str = "waste";

/// Payloads longer than this get a "back to your file" button in the force-token flow.
pub const SUBSTANTIVE_PAYLOAD_LEN: usize = 8;

/// Parsed deep-link payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Bare `/start`.
    Welcome,
    /// Full payload, prefix included.
    Password(String),
    /// Timestamp suffix in Unix millis; `None` when missing or not numeric.
    TokenTime(Option<i64>),
    Waste,
    /// Anything else: a content code.
    Code(String),
}

/// The flow a request is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Welcome,
    PasswordUnlock(String),
    TokenValidation(Option<i64>),
    Discard,
    /// Carries the original payload so the user can come back to it.
    ForceToken(String),
    ContentDecode(String),
}

impl Flow {
    pub fn name(&self) -> &'static str {
        match self {
            Flow::Welcome => "welcome",
            Flow::PasswordUnlock(_) => "password",
            Flow::TokenValidation(_) => "token",
            Flow::Discard => "discard",
            Flow::ForceToken(_) => "force_token",
            Flow::ContentDecode(_) => "decode",
        }
    }
}

/// Returns the payload of a `/start` command, trimmed. Empty for a bare
/// `/start` or `/start@MyBot`.
///
/// When the command token is glued to more text (`/startxyz`), everything after
/// the `/start` prefix is the payload.
pub fn extract_payload(text: &str) -> &str {
    let text = text.trim();
    let (command, rest) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    };
    if is_bare_command(command) {
        return rest;
    }
    match text.get(..START_COMMAND.len()) {
        Some(head) if head.eq_ignore_ascii_case(START_COMMAND) => {
            text[START_COMMAND.len()..].trim()
        }
        _ => rest,
    }
}

/// `/start` or `/start@<bot>`, any case.
fn is_bare_command(command: &str) -> bool {
    let name = command.split_once('@').map_or(command, |(name, _)| name);
    name.eq_ignore_ascii_case(START_COMMAND)
}

impl Payload {
    pub fn parse(text: &str) -> Self {
        Self::from_payload(extract_payload(text))
    }

    pub fn from_payload(payload: &str) -> Self {
        if payload.is_empty() {
            Payload::Welcome
        } else if payload.starts_with(PASSWORD_PREFIX) {
            Payload::Password(payload.to_string())
        } else if let Some(suffix) = payload.strip_prefix(TOKEN_PREFIX) {
            Payload::TokenTime(parse_timestamp(suffix))
        } else if payload == WASTE {
            Payload::Waste
        } else {
            Payload::Code(payload.to_string())
        }
    }

    /// Whether classifying this payload depends on the user's grant.
    pub fn needs_grant_check(&self, policy: &GatePolicy) -> bool {
        matches!(self, Payload::Code(_)) && policy.expiration_enabled()
    }
}

fn parse_timestamp(suffix: &str) -> Option<i64> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// First match wins: welcome, password, token, waste, force-token, decode.
pub fn classify(payload: Payload, policy: &GatePolicy, has_grant: bool) -> Flow {
    match payload {
        Payload::Welcome => Flow::Welcome,
        Payload::Password(full) => Flow::PasswordUnlock(full),
        Payload::TokenTime(ts) => Flow::TokenValidation(ts),
        Payload::Waste => Flow::Discard,
        Payload::Code(code) if policy.expiration_enabled() && !has_grant => Flow::ForceToken(code),
        Payload::Code(code) => Flow::ContentDecode(code),
    }
}
