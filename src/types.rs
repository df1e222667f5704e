//! Core data model
//!
//! Provider-agnostic value types shared by the registry, the resolver, the
//! dynamic model cache and the aggregator.

use std::collections::{BTreeSet, HashMap};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// One addressable AI model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Vendor-facing model identifier, unique within a provider
    pub name: String,
    /// Human-readable display name
    pub label: String,
    /// Owning provider's registry name
    pub provider: String,
    /// Context/response token budget
    pub max_token_allowed: u32,
    /// Feature tags such as "vision" or "function-calling"
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities: BTreeSet<String>,
}

impl ModelInfo {
    /// Create a model entry. The label defaults to the model name.
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        max_token_allowed: u32,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            provider: provider.into(),
            max_token_allowed,
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Resolution hints for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// External-configuration key holding the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_key: Option<String>,
    /// Last-resort default base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// External-configuration key holding the API credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token_key: Option<String>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url_key(mut self, key: impl Into<String>) -> Self {
        self.base_url_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_token_key(mut self, key: impl Into<String>) -> Self {
        self.api_token_key = Some(key.into());
        self
    }
}

/// Administrator-supplied override for one provider.
///
/// Treated as an immutable snapshot; nothing in this crate mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSetting {
    #[serde(default)]
    pub provider_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderSetting {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            enabled: true,
            api_key: None,
            base_url: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Caller-supplied snapshot of every layered configuration source except the
/// process environment.
///
/// Field names follow the camelCase shape the HTTP layer receives, so a request
/// body can be deserialized into this type directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionInputs {
    /// Explicit API keys keyed by provider name
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Per-provider settings keyed by provider name
    ///
    /// On deserialization an empty `providerName` takes the map key, and a
    /// non-empty one that differs from its key is rejected.
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub provider_settings: HashMap<String, ProviderSetting>,
    /// Named external-configuration map (administrator controlled)
    #[serde(default)]
    pub server_env: HashMap<String, String>,
}

impl ResolutionInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.into(), key.into());
        self
    }

    /// Add a provider setting, keyed by its `provider_name`.
    pub fn with_setting(mut self, setting: ProviderSetting) -> Self {
        self.provider_settings
            .insert(setting.provider_name.clone(), setting);
        self
    }

    pub fn with_server_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_env.insert(key.into(), value.into());
        self
    }

    /// Setting registered under `provider`.
    ///
    /// Entries whose `provider_name` names a different provider are ignored.
    pub fn setting_for(&self, provider: &str) -> Option<&ProviderSetting> {
        self.provider_settings
            .get(provider)
            .filter(|s| s.provider_name.is_empty() || s.provider_name == provider)
    }

    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }
}

fn deserialize_settings<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, ProviderSetting>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut settings = HashMap::<String, ProviderSetting>::deserialize(deserializer)?;
    for (key, setting) in &mut settings {
        if setting.provider_name.is_empty() {
            setting.provider_name = key.clone();
        } else if setting.provider_name != *key {
            return Err(serde::de::Error::custom(format!(
                "provider setting under \"{key}\" names provider \"{}\"",
                setting.provider_name
            )));
        }
    }
    Ok(settings)
}

/// Effective connection parameters for one provider.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
}

impl ResolvedConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Borrow the credential in plain text.
    pub fn api_key_str(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret())
    }
}

impl PartialEq for ResolvedConfig {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url && self.api_key_str() == other.api_key_str()
    }
}

impl Eq for ResolvedConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_info_label_defaults_to_name() {
        let model = ModelInfo::new("acme-1", "Acme", 4096);
        assert_eq!(model.label, "acme-1");
        assert_eq!(model.provider, "Acme");
        assert!(model.capabilities.is_empty());
    }

    #[test]
    fn model_info_uses_camel_case_on_the_wire() {
        let model = ModelInfo::new("acme-1", "Acme", 4096).with_capability("vision");
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["maxTokenAllowed"], 4096);
        assert_eq!(json["capabilities"][0], "vision");
    }

    #[test]
    fn provider_setting_defaults_to_enabled() {
        let setting: ProviderSetting =
            serde_json::from_str(r#"{"providerName":"Acme","apiKey":"k"}"#).unwrap();
        assert!(setting.enabled);
        assert_eq!(setting.api_key.as_deref(), Some("k"));
        assert_eq!(setting.base_url, None);
    }

    #[test]
    fn resolution_inputs_deserialize_from_partial_body() {
        let inputs: ResolutionInputs =
            serde_json::from_str(r#"{"apiKeys":{"Acme":"secret"}}"#).unwrap();
        assert_eq!(inputs.api_key_for("Acme"), Some("secret"));
        assert!(inputs.provider_settings.is_empty());
        assert!(inputs.server_env.is_empty());
    }

    #[test]
    fn provider_settings_take_their_name_from_the_map_key() {
        let inputs: ResolutionInputs = serde_json::from_str(
            r#"{"providerSettings":{"Acme":{"baseUrl":"http://acme.local"}}}"#,
        )
        .unwrap();
        let setting = inputs.setting_for("Acme").unwrap();
        assert_eq!(setting.provider_name, "Acme");
        assert_eq!(setting.base_url.as_deref(), Some("http://acme.local"));
    }

    #[test]
    fn provider_setting_under_another_providers_key_is_rejected() {
        let err = serde_json::from_str::<ResolutionInputs>(
            r#"{"providerSettings":{"Acme":{"providerName":"Other"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains(r#"under "Acme" names provider "Other""#));
    }

    #[test]
    fn setting_for_ignores_entry_naming_another_provider() {
        let mut inputs = ResolutionInputs::new().with_setting(ProviderSetting::new("Acme"));
        inputs
            .provider_settings
            .insert("Beta".to_string(), ProviderSetting::new("Other"));

        assert!(inputs.setting_for("Acme").is_some());
        assert!(inputs.setting_for("Beta").is_none());
        assert!(inputs.setting_for("Other").is_none());
    }

    #[test]
    fn resolved_config_debug_redacts_key() {
        let resolved = ResolvedConfig {
            base_url: None,
            api_key: Some(SecretString::from("sk-very-secret".to_string())),
        };
        let debug = format!("{resolved:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert_eq!(resolved.api_key_str(), Some("sk-very-secret"));
    }
}
