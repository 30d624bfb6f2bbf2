//! Provider and application settings.
//!
//! Settings are plain data. Loading and saving them is the job of the
//! explicit `SettingsStore` in `skiff-infrastructure`; nothing here touches
//! ambient global state.

use crate::session::{ColorTag, StoredAuthKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The six supported AI backends.
///
/// Serializes as its lowercase name so it can key TOML tables and travel as
/// a plain string over the host-runtime command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
    OpenRouter,
    Ollama,
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProviderId::from_str(&raw)
            .map_err(|_| D::Error::custom(format!("unknown provider id '{raw}'")))
    }
}

/// Per-provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name; each adapter has its own fallback when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            model: None,
        }
    }
}

/// A saved remote host, minus its secrets.
///
/// Secrets live behind the credential vault; a saved target only carries the
/// vault reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTarget {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub auth_kind: StoredAuthKind,
    #[serde(default)]
    pub color: ColorTag,
}

/// Application settings, loaded once at startup and saved on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// The UI default; each AI request may still select another provider.
    #[serde(default = "default_provider")]
    pub default_provider: ProviderId,
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderConfig>,
    #[serde(default)]
    pub saved_targets: Vec<SavedTarget>,
}

fn default_provider() -> ProviderId {
    // Works out of the box: the local backend needs no API key.
    ProviderId::Ollama
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            saved_targets: Vec::new(),
        }
    }
}

impl Settings {
    /// Returns the configuration for a provider, falling back to defaults
    /// when the user has never configured it.
    pub fn provider_config(&self, id: ProviderId) -> ProviderConfig {
        self.providers.get(&id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_provider_id_round_trips_through_its_name() {
        for id in ProviderId::iter() {
            let name = id.to_string();
            assert_eq!(name.parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!("openrouter".parse::<ProviderId>().unwrap(), ProviderId::OpenRouter);
        assert!("copilot".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_unconfigured_provider_falls_back_to_defaults() {
        let settings = Settings::default();
        let config = settings.provider_config(ProviderId::Gemini);
        assert!(config.enabled);
        assert!(config.api_key.is_none());
        assert!(config.model.is_none());
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.default_provider = ProviderId::Anthropic;
        settings.providers.insert(
            ProviderId::Anthropic,
            ProviderConfig {
                enabled: true,
                api_key: Some("sk-ant-test".to_string()),
                base_url: None,
                model: Some("claude-3-5-haiku-latest".to_string()),
            },
        );
        settings.saved_targets.push(SavedTarget {
            name: "build box".to_string(),
            host: "build.internal".to_string(),
            port: 22,
            username: "ci".to_string(),
            credential_id: Some("cred-1".to_string()),
            auth_kind: StoredAuthKind::Key,
            color: ColorTag::Ocean,
        });

        let rendered = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }
}
