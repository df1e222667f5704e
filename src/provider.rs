//! Provider descriptors
//!
//! A [`ProviderDescriptor`] is a passive value describing one vendor: identity,
//! static model catalog, configuration keys and, optionally, a
//! [`DynamicModelFetcher`] that enumerates models live. Descriptors are
//! immutable once registered; fetched models live in
//! [`crate::cache::ModelCache`], never on the descriptor.

use std::sync::Arc;

use crate::error::FetchError;
use crate::resolver;
use crate::types::{ModelInfo, ProviderConfig, ProviderSetting, ResolutionInputs, ResolvedConfig};

pub mod builtin;

/// Everything a dynamic fetch may depend on.
///
/// `resolved` carries the effective base URL and credential; the raw layers are
/// passed through for vendors that need extra keys from `server_env`.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub provider: &'a str,
    pub resolved: &'a ResolvedConfig,
    pub setting: Option<&'a ProviderSetting>,
    pub inputs: &'a ResolutionInputs,
}

/// Live model enumeration for one provider.
///
/// Implementations are vendor client code and may fail; the aggregator
/// isolates failures per provider and never retries.
#[async_trait::async_trait]
pub trait DynamicModelFetcher: Send + Sync {
    async fn fetch_models(&self, request: FetchRequest<'_>) -> Result<Vec<ModelInfo>, FetchError>;
}

/// One AI-model vendor.
#[derive(Clone)]
pub struct ProviderDescriptor {
    name: String,
    static_models: Vec<ModelInfo>,
    config: ProviderConfig,
    dynamic_fetch: Option<Arc<dyn DynamicModelFetcher>>,
    api_key_link: Option<String>,
    label_for_api_key: Option<String>,
    icon: Option<String>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("static_models", &self.static_models.len())
            .field("config", &self.config)
            .field("dynamic_fetch", &self.dynamic_fetch.is_some())
            .finish()
    }
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            static_models: Vec::new(),
            config: ProviderConfig::default(),
            dynamic_fetch: None,
            api_key_link: None,
            label_for_api_key: None,
            icon: None,
        }
    }

    /// Append a static model.
    ///
    /// An empty `provider` field is stamped with this descriptor's name. Models
    /// attributed to another provider, or repeating a name already listed, are
    /// dropped with a warning.
    pub fn with_static_model(mut self, mut model: ModelInfo) -> Self {
        if model.provider.is_empty() {
            model.provider = self.name.clone();
        } else if model.provider != self.name {
            tracing::warn!(
                provider = %self.name,
                model = %model.name,
                claimed = %model.provider,
                "Dropping static model attributed to another provider"
            );
            return self;
        }

        if self.static_models.iter().any(|m| m.name == model.name) {
            tracing::warn!(
                provider = %self.name,
                model = %model.name,
                "Dropping duplicate static model"
            );
            return self;
        }
        self.static_models.push(model);
        self
    }

    pub fn with_static_models(self, models: impl IntoIterator<Item = ModelInfo>) -> Self {
        models
            .into_iter()
            .fold(self, |desc, model| desc.with_static_model(model))
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_dynamic_fetch(mut self, fetcher: Arc<dyn DynamicModelFetcher>) -> Self {
        self.dynamic_fetch = Some(fetcher);
        self
    }

    pub fn with_api_key_link(mut self, link: impl Into<String>) -> Self {
        self.api_key_link = Some(link.into());
        self
    }

    pub fn with_label_for_api_key(mut self, label: impl Into<String>) -> Self {
        self.label_for_api_key = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn static_models(&self) -> &[ModelInfo] {
        &self.static_models
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn dynamic_fetch(&self) -> Option<&Arc<dyn DynamicModelFetcher>> {
        self.dynamic_fetch.as_ref()
    }

    pub fn has_dynamic_fetch(&self) -> bool {
        self.dynamic_fetch.is_some()
    }

    pub fn api_key_link(&self) -> Option<&str> {
        self.api_key_link.as_deref()
    }

    pub fn label_for_api_key(&self) -> Option<&str> {
        self.label_for_api_key.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Resolve this provider's effective base URL and credential.
    pub fn resolve_config(&self, inputs: &ResolutionInputs) -> ResolvedConfig {
        resolver::resolve_config(&self.name, &self.config, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    struct NoopFetcher;

    #[async_trait::async_trait]
    impl DynamicModelFetcher for NoopFetcher {
        async fn fetch_models(
            &self,
            _request: FetchRequest<'_>,
        ) -> Result<Vec<ModelInfo>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn static_models_are_stamped_with_provider_name() {
        let desc = ProviderDescriptor::new("Acme")
            .with_static_model(ModelInfo::new("acme-1", "", 4096))
            .with_static_model(ModelInfo::new("acme-2", "Acme", 8192));
        assert!(desc.static_models().iter().all(|m| m.provider == "Acme"));
        assert_eq!(desc.static_models()[1].max_token_allowed, 8192);
    }

    #[test]
    #[traced_test]
    fn static_models_owned_elsewhere_or_repeated_are_dropped() {
        let desc = ProviderDescriptor::new("A")
            .with_static_model(ModelInfo::new("x", "B", 1))
            .with_static_model(ModelInfo::new("a-1", "", 1024))
            .with_static_model(ModelInfo::new("a-1", "A", 2048));

        assert_eq!(desc.static_models(), &[ModelInfo::new("a-1", "A", 1024)]);
        assert!(logs_contain("Dropping static model attributed to another provider"));
        assert!(logs_contain("Dropping duplicate static model"));
    }

    #[test]
    fn display_metadata_is_passed_through() {
        let desc = ProviderDescriptor::new("Acme")
            .with_api_key_link("https://acme.example/keys")
            .with_label_for_api_key("Acme token")
            .with_icon("/icons/acme.svg");
        assert_eq!(desc.api_key_link(), Some("https://acme.example/keys"));
        assert_eq!(desc.label_for_api_key(), Some("Acme token"));
        assert_eq!(desc.icon(), Some("/icons/acme.svg"));
    }

    #[test]
    fn debug_reports_fetch_capability_without_internals() {
        let desc = ProviderDescriptor::new("Acme").with_dynamic_fetch(Arc::new(NoopFetcher));
        assert!(desc.has_dynamic_fetch());
        let debug = format!("{desc:?}");
        assert!(debug.contains("dynamic_fetch: true"));
    }
}
