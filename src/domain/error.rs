//! # Gate Errors
//!
//! Error types shared by the gate and its collaborators.
//! `GateError::RateLimited` is the only variant the retry wrapper acts on.

use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum GateError {
    /// Transport asked us to wait before trying again.
    RateLimited { retry_after: Duration },
    Transport(String),
    Storage(String),
    /// Failure inside one of the other collaborators (translator, shortener, ...).
    Collaborator { name: &'static str, message: String },
}

impl GateError {
    #[cfg(test)]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited {
            retry_after: Duration::from_secs(seconds),
        }
    }

    pub fn collaborator(name: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            name,
            message: message.into(),
        }
    }

    /// Wait requested by the transport, if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { retry_after } => {
                write!(f, "rate limited, retry after {}s", retry_after.as_secs())
            }
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::Collaborator { name, message } => write!(f, "[{name}] {message}"),
        }
    }
}

impl std::error::Error for GateError {}

/// Domain error of the content resolver.
#[derive(Debug)]
pub enum DecodeError {
    /// The code does not point at any content.
    NotFound(String),
    /// The code is structurally invalid or the resolver is not configured.
    Invalid(String),
    /// The resolver already replied to the user; nothing more to say.
    /// Returned by resolvers that talk to the user themselves.
    #[allow(dead_code)]
    Notified,
    /// Infrastructure failure while resolving; follows the normal error path.
    Gate(GateError),
}

impl From<GateError> for DecodeError {
    fn from(err: GateError) -> Self {
        Self::Gate(err)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(code) => write!(f, "no content for code '{code}'"),
            Self::Invalid(msg) => write!(f, "invalid code: {msg}"),
            Self::Notified => write!(f, "resolver already notified the user"),
            Self::Gate(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        assert_eq!(
            GateError::rate_limited(5).retry_after(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(GateError::Transport("boom".into()).retry_after(), None);
        assert_eq!(GateError::collaborator("i18n", "missing").retry_after(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            GateError::rate_limited(7).to_string(),
            "rate limited, retry after 7s"
        );
        assert_eq!(
            GateError::collaborator("shortener", "down").to_string(),
            "[shortener] down"
        );
        assert_eq!(
            DecodeError::from(GateError::Storage("gone".into())).to_string(),
            "storage error: gone"
        );
    }
}
