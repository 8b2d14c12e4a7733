//! # Locale Translator
//!
//! Loads `<locales_dir>/<lang>.yaml` files and resolves dotted keys such as
//! `help.0.message` (numeric segments index into lists).
//! Lookup order: requested language, default language, built-in English.
//!
//! Buttons are lists of `{ text, url }` or `{ text, callback }` entries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::error::GateError;
use crate::domain::traits::Translator;
use crate::domain::types::{Button, Translated};
use crate::strings::messages::{builtin_button_labels, builtin_text};

#[derive(Debug, Deserialize)]
struct ButtonSpec {
    text: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    callback: Option<String>,
}

impl ButtonSpec {
    fn into_button(self) -> Option<Button> {
        match (self.url, self.callback) {
            (Some(url), _) => Some(Button::url(self.text, url)),
            (None, Some(data)) => Some(Button::callback(self.text, data)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct LocaleTranslator {
    locales: HashMap<String, Value>,
    default_language: String,
}

impl LocaleTranslator {
    pub fn new(locales: HashMap<String, Value>, default_language: impl Into<String>) -> Self {
        Self {
            locales,
            default_language: default_language.into(),
        }
    }

    /// Reads every `*.yaml` file in `dir`. A missing directory yields a
    /// translator that only knows the built-in strings.
    pub fn load(dir: &Path, default_language: &str) -> Result<Self> {
        let mut locales = HashMap::new();
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Locales directory not found, using built-in strings");
            return Ok(Self::new(locales, default_language));
        }

        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read locales directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            locales.insert(lang.to_lowercase(), value);
        }

        Ok(Self::new(locales, default_language))
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&Value> {
        let mut node = self.locales.get(lang)?;
        for segment in key.split('.') {
            node = match node {
                Value::Mapping(map) => map.get(segment)?,
                Value::Sequence(list) => list.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// First language in the fallback chain that has `key`.
    fn find(&self, lang: &str, key: &str) -> Option<&Value> {
        self.lookup(lang, key)
            .or_else(|| self.lookup(&self.default_language, key))
    }

    fn text(&self, lang: &str, key: &str) -> Option<String> {
        self.find(lang, key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| builtin_text(key).map(str::to_string))
    }

    fn buttons(&self, lang: &str, key: &str) -> Vec<Button> {
        match self.find(lang, key) {
            Some(Value::Sequence(list)) => list
                .iter()
                .filter_map(|item| serde_yaml::from_value::<ButtonSpec>(item.clone()).ok())
                .filter_map(ButtonSpec::into_button)
                .collect(),
            _ => builtin_button_labels(key)
                .iter()
                .map(|label| Button::callback(*label, key))
                .collect(),
        }
    }
}

#[async_trait]
impl Translator for LocaleTranslator {
    async fn resolve(
        &self,
        key: &str,
        button_key: Option<&str>,
        lang: &str,
    ) -> Result<Translated, GateError> {
        let text = self
            .text(lang, key)
            .ok_or_else(|| GateError::collaborator("translator", format!("missing key '{key}'")))?;
        let buttons = button_key
            .map(|button_key| self.buttons(lang, button_key))
            .unwrap_or_default();
        Ok(Translated { text, buttons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ButtonAction;
    use std::fs;
    use tempfile::tempdir;

    const EN: &str = r#"
help:
  - message: "Hello!"
    button:
      - { text: "Channel", url: "https://t.me/updates" }
      - { text: "About", callback: "about" }
      - { text: "Broken" }
force:
  message: "Token please"
"#;

    const DE: &str = r#"
help:
  - message: "Hallo!"
"#;

    fn translator() -> (tempfile::TempDir, LocaleTranslator) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("en.yaml"), EN).unwrap();
        fs::write(dir.path().join("de.yaml"), DE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let translator = LocaleTranslator::load(dir.path(), "en").unwrap();
        (dir, translator)
    }

    #[tokio::test]
    async fn test_resolves_dotted_keys_and_buttons() {
        let (_dir, t) = translator();
        assert_eq!(t.len(), 2);

        let welcome = t.resolve("help.0.message", Some("help.0.button"), "en").await.unwrap();
        assert_eq!(welcome.text, "Hello!");
        assert_eq!(welcome.buttons.len(), 2);
        assert_eq!(welcome.buttons[0].action, ButtonAction::Url("https://t.me/updates".into()));
        assert_eq!(welcome.buttons[1].action, ButtonAction::Callback("about".into()));
    }

    #[tokio::test]
    async fn test_falls_back_to_default_language_then_builtin() {
        let (_dir, t) = translator();

        let de = t.resolve("help.0.message", Some("help.0.button"), "de").await.unwrap();
        assert_eq!(de.text, "Hallo!");
        // Buttons missing in German come from English.
        assert_eq!(de.buttons.len(), 2);

        let fr = t.resolve("force.message", None, "fr").await.unwrap();
        assert_eq!(fr.text, "Token please");

        let builtin = t.resolve("decode.error", Some("force.button"), "de").await.unwrap();
        assert_eq!(builtin.text, crate::strings::messages::DECODE_ERROR);
        assert_eq!(builtin.buttons.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_key_is_an_error() {
        let (_dir, t) = translator();
        assert!(t.resolve("nope.message", None, "en").await.is_err());
    }

    #[tokio::test]
    async fn test_shipped_locale_covers_every_key() {
        let t = LocaleTranslator::load(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/locales")), "en").unwrap();
        for key in ["help.0.message", "force.message", "force_sub.message", "password.message", "decode.error"] {
            assert!(t.lookup("en", key).and_then(Value::as_str).is_some(), "{key}");
        }
        let welcome = t.resolve("help.0.message", Some("help.0.button"), "en").await.unwrap();
        assert_eq!(welcome.buttons.len(), 3);
    }

    #[test]
    fn test_missing_directory_uses_builtin() {
        let dir = tempdir().unwrap();
        let t = LocaleTranslator::load(&dir.path().join("missing"), "en").unwrap();
        assert_eq!(t.len(), 0);
    }
}
