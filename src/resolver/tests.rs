use super::*;
use crate::test_support::{ENV_LOCK, EnvGuard};
use crate::types::ProviderSetting;
use std::collections::HashMap;

const PROVIDER: &str = "Acme";
const URL_KEY: &str = "ACME_API_BASE_URL";
const TOKEN_KEY: &str = "ACME_API_KEY";

fn no_env(_: &str) -> Option<String> {
    None
}

/// Build inputs and a config where only the selected base URL layers are present.
/// Layer values are `layer1`..`layer4` so the winner is easy to read.
fn layered(
    setting: bool,
    server_env: bool,
    process: bool,
    default: bool,
) -> (ProviderConfig, ResolutionInputs, HashMap<String, String>) {
    let mut config = ProviderConfig::new();
    if default {
        config = config.with_base_url("https://layer4");
    }
    let mut inputs = ResolutionInputs::new();
    if setting {
        inputs =
            inputs.with_setting(ProviderSetting::new(PROVIDER).with_base_url("https://layer1"));
    }
    if server_env {
        inputs = inputs.with_server_env(URL_KEY, "https://layer2");
    }
    let mut env = HashMap::new();
    if process {
        env.insert(URL_KEY.to_string(), "https://layer3".to_string());
    }
    (config, inputs, env)
}

#[test]
fn base_url_precedence_over_every_layer_combination() {
    for mask in 0u8..16 {
        let setting = mask & 0b1000 != 0;
        let server_env = mask & 0b0100 != 0;
        let process = mask & 0b0010 != 0;
        let default = mask & 0b0001 != 0;

        let (config, inputs, env) = layered(setting, server_env, process, default);
        let resolved =
            resolve_config_with_env(PROVIDER, &config, &inputs, |k| env.get(k).cloned());

        let expected = if setting {
            Some("https://layer1")
        } else if server_env {
            Some("https://layer2")
        } else if process {
            Some("https://layer3")
        } else if default {
            Some("https://layer4")
        } else {
            None
        };
        assert_eq!(
            resolved.base_url.as_deref(),
            expected,
            "setting={setting} server_env={server_env} process={process} default={default}"
        );
    }
}

#[test]
fn api_key_precedence_over_every_layer_combination() {
    for mask in 0u8..8 {
        let explicit = mask & 0b100 != 0;
        let server_env = mask & 0b010 != 0;
        let process = mask & 0b001 != 0;

        let mut inputs = ResolutionInputs::new();
        if explicit {
            inputs = inputs.with_api_key(PROVIDER, "key1");
        }
        if server_env {
            inputs = inputs.with_server_env(TOKEN_KEY, "key2");
        }
        let env: HashMap<String, String> = if process {
            HashMap::from([(TOKEN_KEY.to_string(), "key3".to_string())])
        } else {
            HashMap::new()
        };

        let resolved = resolve_config_with_env(PROVIDER, &ProviderConfig::new(), &inputs, |k| {
            env.get(k).cloned()
        });

        let expected = if explicit {
            Some("key1")
        } else if server_env {
            Some("key2")
        } else if process {
            Some("key3")
        } else {
            None
        };
        assert_eq!(resolved.api_key_str(), expected, "mask={mask:03b}");
    }
}

#[test]
fn setting_api_key_is_not_a_credential_layer() {
    // Only the explicit api key map feeds layer 1 of credential resolution.
    let inputs = ResolutionInputs::new()
        .with_setting(ProviderSetting::new(PROVIDER).with_api_key("from-setting"));
    let resolved = resolve_config_with_env(PROVIDER, &ProviderConfig::new(), &inputs, no_env);
    assert_eq!(resolved.api_key_str(), None);
}

#[test]
fn empty_setting_base_url_falls_through() {
    let inputs = ResolutionInputs::new()
        .with_setting(ProviderSetting::new(PROVIDER).with_base_url(""))
        .with_server_env(URL_KEY, "https://from-server-env");
    let resolved = resolve_config_with_env(PROVIDER, &ProviderConfig::new(), &inputs, no_env);
    assert_eq!(resolved.base_url.as_deref(), Some("https://from-server-env"));
}

#[test]
fn empty_values_fall_through_at_lower_layers_too() {
    let config = ProviderConfig::new().with_base_url("https://default");
    let inputs = ResolutionInputs::new()
        .with_api_key(PROVIDER, "")
        .with_server_env(URL_KEY, "")
        .with_server_env(TOKEN_KEY, "");
    let resolved = resolve_config_with_env(PROVIDER, &config, &inputs, |_| Some(String::new()));
    assert_eq!(resolved.base_url.as_deref(), Some("https://default"));
    assert_eq!(resolved.api_key_str(), None);
}

#[test]
fn custom_keys_replace_conventional_keys() {
    let config = ProviderConfig::new()
        .with_base_url_key("ACME_ENDPOINT")
        .with_api_token_key("ACME_TOKEN");
    let inputs = ResolutionInputs::new()
        .with_server_env(URL_KEY, "https://ignored")
        .with_server_env("ACME_ENDPOINT", "https://custom")
        .with_server_env("ACME_TOKEN", "tok");
    let resolved = resolve_config_with_env(PROVIDER, &config, &inputs, no_env);
    assert_eq!(resolved.base_url.as_deref(), Some("https://custom"));
    assert_eq!(resolved.api_key_str(), Some("tok"));
}

#[test]
fn settings_for_other_providers_are_ignored() {
    let inputs = ResolutionInputs::new()
        .with_setting(ProviderSetting::new("Other").with_base_url("https://other"))
        .with_api_key("Other", "other-key");
    let resolved = resolve_config_with_env(PROVIDER, &ProviderConfig::new(), &inputs, no_env);
    assert_eq!(resolved, ResolvedConfig::default());
}

#[test]
fn trailing_slash_is_stripped_once() {
    let strip = |url: &str| {
        let config = ProviderConfig::new().with_base_url(url);
        resolve_config_with_env(PROVIDER, &config, &ResolutionInputs::new(), no_env).base_url
    };
    assert_eq!(strip("https://api.example.com/").as_deref(), Some("https://api.example.com"));
    assert_eq!(strip("https://api.example.com").as_deref(), Some("https://api.example.com"));
    assert_eq!(strip("https://api.example.com//").as_deref(), Some("https://api.example.com/"));
    assert_eq!(strip("/"), None);
}

#[test]
fn env_key_convention() {
    assert_eq!(default_base_url_key("Ollama"), "OLLAMA_API_BASE_URL");
    assert_eq!(default_api_token_key("Together AI"), "TOGETHER_AI_API_KEY");
    assert_eq!(default_api_token_key("x-ai"), "X_AI_API_KEY");
    assert_eq!(
        base_url_key("LMStudio", &ProviderConfig::new().with_base_url_key("")),
        "LMSTUDIO_API_BASE_URL"
    );
}

#[test]
fn process_environment_is_layer_three() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _url = EnvGuard::set("RESOLVERTEST_API_BASE_URL", "https://from-process/");
    let _key = EnvGuard::set("RESOLVERTEST_API_KEY", "process-key");

    let config = ProviderConfig::new().with_base_url("https://default");
    let resolved = resolve_config("ResolverTest", &config, &ResolutionInputs::new());
    assert_eq!(resolved.base_url.as_deref(), Some("https://from-process"));
    assert_eq!(resolved.api_key_str(), Some("process-key"));

    let inputs =
        ResolutionInputs::new().with_server_env("RESOLVERTEST_API_BASE_URL", "https://server");
    let resolved = resolve_config("ResolverTest", &config, &inputs);
    assert_eq!(resolved.base_url.as_deref(), Some("https://server"));
}

#[test]
fn unset_process_environment_falls_back_to_default() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _url = EnvGuard::remove("RESOLVERTEST_API_BASE_URL");
    let _key = EnvGuard::remove("RESOLVERTEST_API_KEY");

    let config = ProviderConfig::new().with_base_url("https://default/");
    let resolved = resolve_config("ResolverTest", &config, &ResolutionInputs::new());
    assert_eq!(resolved.base_url.as_deref(), Some("https://default"));
    assert!(!resolved.has_api_key());
}
