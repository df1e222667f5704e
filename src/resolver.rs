//! Configuration resolution
//!
//! Computes the effective base URL and API credential of a provider from the
//! layered sources, highest precedence first:
//!
//! | Layer | Base URL | API key |
//! |---|---|---|
//! | 1 | `ProviderSetting.base_url` | `api_keys[provider]` |
//! | 2 | `server_env[base_url_key]` | `server_env[api_token_key]` |
//! | 3 | process env `base_url_key` | process env `api_token_key` |
//! | 4 | `ProviderConfig.base_url` | (none) |
//!
//! Empty strings count as unset at every layer. Resolution is total: missing
//! values surface as `None` and callers decide whether that is fatal.

use secrecy::SecretString;

use crate::types::{ProviderConfig, ResolutionInputs, ResolvedConfig};

/// Suffix of the conventional base URL key, e.g. `OLLAMA_API_BASE_URL`.
pub const BASE_URL_KEY_SUFFIX: &str = "_API_BASE_URL";
/// Suffix of the conventional credential key, e.g. `GROQ_API_KEY`.
pub const API_KEY_SUFFIX: &str = "_API_KEY";

/// Upper-case a provider name into an environment-key prefix.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, so `"Together AI"`
/// maps to `TOGETHER_AI`.
pub fn env_key_prefix(provider_name: &str) -> String {
    provider_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Conventional base URL key for a provider that does not name one.
pub fn default_base_url_key(provider_name: &str) -> String {
    format!("{}{}", env_key_prefix(provider_name), BASE_URL_KEY_SUFFIX)
}

/// Conventional credential key for a provider that does not name one.
pub fn default_api_token_key(provider_name: &str) -> String {
    format!("{}{}", env_key_prefix(provider_name), API_KEY_SUFFIX)
}

/// Base URL key actually consulted for this provider.
pub fn base_url_key(provider_name: &str, config: &ProviderConfig) -> String {
    non_empty(config.base_url_key.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| default_base_url_key(provider_name))
}

/// Credential key actually consulted for this provider.
pub fn api_token_key(provider_name: &str, config: &ProviderConfig) -> String {
    non_empty(config.api_token_key.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| default_api_token_key(provider_name))
}

/// Resolve against the real process environment.
pub fn resolve_config(
    provider_name: &str,
    config: &ProviderConfig,
    inputs: &ResolutionInputs,
) -> ResolvedConfig {
    resolve_config_with_env(provider_name, config, inputs, |key| std::env::var(key).ok())
}

/// Resolve with an explicit process-environment lookup.
///
/// `process_env` stands in for layer 3; everything else comes from `config`
/// and `inputs`.
pub fn resolve_config_with_env<F>(
    provider_name: &str,
    config: &ProviderConfig,
    inputs: &ResolutionInputs,
    process_env: F,
) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let setting = inputs.setting_for(provider_name);
    let url_key = base_url_key(provider_name, config);
    let token_key = api_token_key(provider_name, config);

    let server_env = |key: &str| {
        non_empty(inputs.server_env.get(key).map(String::as_str)).map(str::to_string)
    };

    let base_url = non_empty(setting.and_then(|s| s.base_url.as_deref()))
        .map(str::to_string)
        .or_else(|| server_env(&url_key))
        .or_else(|| process_env(&url_key).filter(|v| !v.is_empty()))
        .or_else(|| non_empty(config.base_url.as_deref()).map(str::to_string))
        .and_then(strip_one_trailing_slash);

    let api_key = non_empty(inputs.api_key_for(provider_name))
        .map(str::to_string)
        .or_else(|| server_env(&token_key))
        .or_else(|| process_env(&token_key).filter(|v| !v.is_empty()))
        .map(SecretString::from);

    tracing::debug!(
        provider = %provider_name,
        base_url = ?base_url,
        has_api_key = api_key.is_some(),
        "Resolved provider config"
    );

    ResolvedConfig { base_url, api_key }
}

/// Remove exactly one trailing `/`. `"https://x//"` becomes `"https://x/"`.
pub fn strip_one_trailing_slash(url: String) -> Option<String> {
    let url = match url.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => url,
    };
    if url.is_empty() { None } else { Some(url) }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests;
