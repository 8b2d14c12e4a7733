//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Telegram connection, storage, channels, token policy,
//! retry policy, translations and logging, plus the immutable `GatePolicy`
//! snapshot handed to the router.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::types::UserId;

pub const DEFAULT_CONFIG_PATH: &str = "data/config.yaml";
pub const DEFAULT_LINK_BASE: &str = "https://telegram.dog";

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub i18n: I18nConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bot credentials and public identity.
#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub token: String,
    /// Public handle used in deep links. Looked up with `getMe` when absent.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_link_base")]
    pub link_base: String,
}

fn default_link_base() -> String {
    DEFAULT_LINK_BASE.to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Redis,
}

/// Persistent user storage. No backend means storage is disabled.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Option<StorageBackend>,
    #[serde(default = "default_users_path")]
    pub path: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_users_path() -> String {
    "data/users.json".to_string()
}

fn default_key_prefix() -> String {
    "start-gate".to_string()
}

/// Channel-related settings.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ChannelConfig {
    /// Photo (URL or local path) attached to the welcome message.
    #[serde(default)]
    pub welcome_pic: Option<String>,
    /// Channel the user must join: numeric chat id or `@username`.
    #[serde(default)]
    pub required: Option<String>,
    /// Invite link shown on the join button. Derived from `@username` when absent.
    #[serde(default)]
    pub invite_link: Option<String>,
    /// Chat holding the files that content codes point at.
    #[serde(default)]
    pub storage_chat: Option<i64>,
}

/// Token (time-boxed access) settings.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct TokenConfig {
    /// Validity window in hours. Absent or zero disables token enforcement.
    #[serde(default)]
    pub expiration_hours: Option<u64>,
    #[serde(default)]
    pub shortener: Option<ShortenerConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShortenerConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct AccessConfig {
    /// Users that skip subscription enforcement and registration.
    #[serde(default)]
    pub allow_list: Vec<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Maximum handling attempts per event. `None` retries without limit.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> Option<usize> {
    Some(5)
}

#[derive(Debug, Deserialize, Clone)]
pub struct I18nConfig {
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            locales_dir: default_locales_dir(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_locales_dir() -> String {
    "data/locales".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_file() -> Option<String> {
    Some("data/session.log".to_string())
}

fn default_log_filter() -> String {
    "info,teloxide=warn,hyper=warn,reqwest=warn".to_string()
}

impl AppConfig {
    /// Reads and parses a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Picks the config file: explicit path, then `data/config.yaml`,
    /// then `<config_dir>/start-gate/config.yaml`.
    pub fn locate(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }
        let local = PathBuf::from(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("start-gate").join("config.yaml"))
            .filter(|path| path.exists())
            .unwrap_or(local)
    }

    pub fn allow_list(&self) -> HashSet<UserId> {
        self.access.allow_list.iter().copied().map(UserId).collect()
    }

    /// Builds the immutable policy snapshot for the router.
    pub fn policy(&self, bot_username: String) -> GatePolicy {
        GatePolicy {
            bot_username,
            link_base: self.telegram.link_base.trim_end_matches('/').to_string(),
            welcome_media: self
                .channel
                .welcome_pic
                .clone()
                .filter(|pic| !pic.trim().is_empty()),
            token_window: self
                .token
                .expiration_hours
                .filter(|hours| *hours > 0)
                .map(|hours| Duration::from_secs(hours * 3600)),
            default_language: self.i18n.default_language.clone(),
        }
    }
}

/// Immutable policy snapshot consumed by the gate and its flows.
#[derive(Debug, Clone, PartialEq)]
pub struct GatePolicy {
    /// Public bot handle used to build deep links.
    pub bot_username: String,
    /// Deep-link host, without trailing slash.
    pub link_base: String,
    pub welcome_media: Option<String>,
    /// Token validity window. `None` disables the force-token flow.
    pub token_window: Option<Duration>,
    pub default_language: String,
}

impl GatePolicy {
    /// Whether the "support expiration" mode is active.
    pub fn expiration_enabled(&self) -> bool {
        self.token_window.is_some()
    }

    pub fn token_window_ms(&self) -> Option<i64> {
        self.token_window.map(|window| window.as_millis() as i64)
    }

    /// `https://telegram.dog/<bot>?start=<payload>`, payload percent-encoded.
    pub fn deep_link(&self, payload: &str) -> String {
        match reqwest::Url::parse(&self.bot_link()) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("start", payload);
                url.to_string()
            }
            Err(e) => {
                tracing::warn!(link_base = %self.link_base, error = %e, "Invalid link base");
                format!("{}?start={}", self.bot_link(), payload)
            }
        }
    }

    /// Deep link that opens the bot without a payload.
    pub fn bot_link(&self) -> String {
        format!("{}/{}", self.link_base, self.bot_username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
telegram:
  token: "123:abc"
  link_base: "https://t.me/"
storage:
  backend: file
  path: /tmp/users.json
channel:
  welcome_pic: "https://example.com/welcome.jpg"
  required: "@updates"
token:
  expiration_hours: 24
access:
  allow_list: [42, 7]
retry:
  max_attempts: 3
"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.storage.backend, Some(StorageBackend::File));
        assert_eq!(config.retry.max_attempts, Some(3));
        assert!(config.allow_list().contains(&UserId(42)));
        assert_eq!(config.i18n.default_language, "en");

        let policy = config.policy("FileBot".to_string());
        assert_eq!(policy.link_base, "https://t.me");
        assert_eq!(policy.deep_link("abc"), "https://t.me/FileBot?start=abc");
        assert_eq!(policy.token_window_ms(), Some(24 * 3_600_000));
        assert!(policy.expiration_enabled());
        assert_eq!(
            policy.welcome_media.as_deref(),
            Some("https://example.com/welcome.jpg")
        );
    }

    #[test]
    fn test_example_config_parses() {
        let config = AppConfig::from_yaml(include_str!("../../data/config.example.yaml")).unwrap();
        assert_eq!(config.storage.backend, Some(StorageBackend::File));
        assert_eq!(config.channel.storage_chat, Some(-1001234567890));
        assert!(config.policy("Bot".into()).expiration_enabled());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_yaml("telegram:\n  token: t\n").unwrap();
        assert_eq!(config.storage.backend, None);
        assert_eq!(config.retry.max_attempts, Some(5));
        assert_eq!(config.telegram.link_base, DEFAULT_LINK_BASE);

        let policy = config.policy("Bot".to_string());
        assert!(!policy.expiration_enabled());
        assert_eq!(policy.token_window_ms(), None);
        assert_eq!(policy.welcome_media, None);
    }

    #[test]
    fn test_deep_link_encodes_payload() {
        let policy = AppConfig::from_yaml("telegram:\n  token: t\n")
            .unwrap()
            .policy("FileBot".into());
        let link = policy.deep_link("abc#def&x=1");
        assert_eq!(link, "https://telegram.dog/FileBot?start=abc%23def%26x%3D1");

        let parsed = reqwest::Url::parse(&link).unwrap();
        let start: Vec<_> = parsed.query_pairs().filter(|(k, _)| k == "start").collect();
        assert_eq!(start.len(), 1);
        assert_eq!(start[0].1, "abc#def&x=1");
    }

    #[test]
    fn test_zero_hours_disables_expiration() {
        let config =
            AppConfig::from_yaml("telegram:\n  token: t\ntoken:\n  expiration_hours: 0\n").unwrap();
        assert!(!config.policy("Bot".into()).expiration_enabled());
    }

    #[test]
    fn test_blank_welcome_pic_is_absent() {
        let config =
            AppConfig::from_yaml("telegram:\n  token: t\nchannel:\n  welcome_pic: \"  \"\n").unwrap();
        assert_eq!(config.policy("Bot".into()).welcome_media, None);
    }
}
