//! Built-in provider catalog.
//!
//! Static metadata for well-known vendors, kept in one table so bootstrap code
//! registers every built-in from a single source. Only static catalogs and
//! configuration keys live here; callers attach live model enumeration with
//! [`ProviderDescriptor::with_dynamic_fetch`].

use crate::provider::ProviderDescriptor;
use crate::registry::ProviderRegistry;
use crate::types::{ModelInfo, ProviderConfig};

pub const ANTHROPIC: &str = "Anthropic";
pub const OPENAI: &str = "OpenAI";
pub const GROQ: &str = "Groq";
pub const DEEPSEEK: &str = "Deepseek";
pub const MISTRAL: &str = "Mistral";
pub const XAI: &str = "xAI";
pub const OPENROUTER: &str = "OpenRouter";
pub const OLLAMA: &str = "Ollama";
pub const LMSTUDIO: &str = "LMStudio";

/// Static metadata for one built-in provider.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProviderMetadata {
    pub name: &'static str,
    /// Overrides the conventional `<NAME>_API_BASE_URL` key
    pub base_url_key: Option<&'static str>,
    pub default_base_url: Option<&'static str>,
    /// Overrides the conventional `<NAME>_API_KEY` key
    pub api_token_key: Option<&'static str>,
    pub api_key_link: Option<&'static str>,
    /// `(name, label, max tokens, capabilities)`
    pub models: &'static [(&'static str, &'static str, u32, &'static [&'static str])],
}

impl BuiltinProviderMetadata {
    pub fn descriptor(&self) -> ProviderDescriptor {
        let mut config = ProviderConfig::new();
        if let Some(key) = self.base_url_key {
            config = config.with_base_url_key(key);
        }
        if let Some(url) = self.default_base_url {
            config = config.with_base_url(url);
        }
        if let Some(key) = self.api_token_key {
            config = config.with_api_token_key(key);
        }

        let models = self.models.iter().map(|(name, label, max_tokens, caps)| {
            caps.iter().fold(
                ModelInfo::new(*name, self.name, *max_tokens).with_label(*label),
                |model, cap| model.with_capability(*cap),
            )
        });

        let mut desc = ProviderDescriptor::new(self.name)
            .with_config(config)
            .with_static_models(models);
        if let Some(link) = self.api_key_link {
            desc = desc.with_api_key_link(link);
        }
        desc
    }
}

const BUILTIN_PROVIDERS: &[BuiltinProviderMetadata] = &[
    BuiltinProviderMetadata {
        name: ANTHROPIC,
        base_url_key: None,
        default_base_url: Some("https://api.anthropic.com/v1"),
        api_token_key: None,
        api_key_link: Some("https://console.anthropic.com/settings/keys"),
        models: &[
            (
                "claude-3-5-sonnet-latest",
                "Claude 3.5 Sonnet",
                8000,
                &["vision", "function-calling"],
            ),
            ("claude-3-5-haiku-latest", "Claude 3.5 Haiku", 8000, &["function-calling"]),
        ],
    },
    BuiltinProviderMetadata {
        name: OPENAI,
        base_url_key: None,
        default_base_url: Some("https://api.openai.com/v1"),
        api_token_key: None,
        api_key_link: Some("https://platform.openai.com/api-keys"),
        models: &[
            ("gpt-4o", "GPT-4o", 8000, &["vision", "function-calling"]),
            ("gpt-4o-mini", "GPT-4o Mini", 8000, &["vision", "function-calling"]),
        ],
    },
    BuiltinProviderMetadata {
        name: GROQ,
        base_url_key: None,
        default_base_url: Some("https://api.groq.com/openai/v1"),
        api_token_key: None,
        api_key_link: Some("https://console.groq.com/keys"),
        models: &[("llama-3.3-70b-versatile", "Llama 3.3 70B", 8000, &[])],
    },
    BuiltinProviderMetadata {
        name: DEEPSEEK,
        base_url_key: None,
        default_base_url: Some("https://api.deepseek.com"),
        api_token_key: None,
        api_key_link: Some("https://platform.deepseek.com/apiKeys"),
        models: &[
            ("deepseek-coder", "Deepseek-Coder", 8000, &[]),
            ("deepseek-chat", "Deepseek-Chat", 8000, &[]),
        ],
    },
    BuiltinProviderMetadata {
        name: MISTRAL,
        base_url_key: None,
        default_base_url: Some("https://api.mistral.ai/v1"),
        api_token_key: None,
        api_key_link: Some("https://console.mistral.ai/api-keys/"),
        models: &[("mistral-large-latest", "Mistral Large Latest", 8000, &["function-calling"])],
    },
    BuiltinProviderMetadata {
        name: XAI,
        base_url_key: None,
        default_base_url: Some("https://api.x.ai/v1"),
        api_token_key: Some("XAI_API_KEY"),
        api_key_link: Some("https://docs.x.ai/docs/quickstart#creating-an-api-key"),
        models: &[("grok-beta", "xAI Grok Beta", 8000, &[])],
    },
    BuiltinProviderMetadata {
        name: OPENROUTER,
        base_url_key: None,
        default_base_url: Some("https://openrouter.ai/api/v1"),
        api_token_key: None,
        api_key_link: Some("https://openrouter.ai/settings/keys"),
        models: &[],
    },
    BuiltinProviderMetadata {
        name: OLLAMA,
        base_url_key: Some("OLLAMA_API_BASE_URL"),
        default_base_url: Some("http://127.0.0.1:11434"),
        api_token_key: None,
        api_key_link: None,
        models: &[],
    },
    BuiltinProviderMetadata {
        name: LMSTUDIO,
        base_url_key: Some("LMSTUDIO_API_BASE_URL"),
        default_base_url: Some("http://127.0.0.1:1234"),
        api_token_key: None,
        api_key_link: None,
        models: &[],
    },
];

/// Metadata for every built-in provider, in registration order.
pub fn builtin_providers_metadata() -> &'static [BuiltinProviderMetadata] {
    BUILTIN_PROVIDERS
}

/// Descriptors for every built-in provider, in registration order.
pub fn builtin_providers() -> Vec<ProviderDescriptor> {
    BUILTIN_PROVIDERS.iter().map(|m| m.descriptor()).collect()
}

/// Register all built-ins. Returns how many were newly registered; names that
/// are already present are skipped.
pub fn register_builtin_providers(registry: &ProviderRegistry) -> usize {
    builtin_providers()
        .into_iter()
        .filter(|desc| registry.register(desc.clone()))
        .count()
}
