//! Model list aggregation
//!
//! Produces the merged model catalog visible to the rest of an application.
//! For each registered provider, in registration order:
//!
//! 1. Providers without a dynamic fetcher contribute their static models only.
//! 2. Otherwise the provider's config is resolved, the cache is consulted and,
//!    on a miss, the fetcher runs (bounded by a timeout and an optional
//!    cancellation token). Successes are cached; failures become a
//!    [`ProviderWarning`] and never affect sibling providers.
//! 3. All static lists come first, then every dynamic list, each group in
//!    registration order.
//!
//! No retries happen here; retry policy belongs to callers or fetchers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::cache::ModelCache;
use crate::error::{FetchError, ProviderWarning, Result};
use crate::provider::{FetchRequest, ProviderDescriptor};
use crate::registry::ProviderRegistry;
use crate::types::{ModelInfo, ResolutionInputs, ResolvedConfig};

/// Default bound on a single provider's dynamic fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for [`ModelListAggregator`].
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Upper bound for one provider's fetch (None = unbounded)
    pub fetch_timeout: Option<Duration>,
    /// Fan out across providers concurrently instead of one at a time
    pub concurrent: bool,
    /// Leave out providers whose setting has `enabled: false`
    pub skip_disabled_providers: bool,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            concurrent: true,
            skip_disabled_providers: false,
        }
    }
}

impl AggregatorOptions {
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn skip_disabled_providers(mut self, skip: bool) -> Self {
        self.skip_disabled_providers = skip;
        self
    }
}

/// Where a provider's contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// No dynamic fetcher; static models only
    StaticOnly,
    /// Dynamic models served from the cache
    Cached,
    /// Dynamic models fetched live and stored
    Fetched,
    /// The fetch failed; static models only
    Failed,
    /// Disabled by settings and left out entirely
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOutcome {
    pub provider: String,
    pub source: ModelSource,
}

/// The merged catalog plus per-provider diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelList {
    pub models: Vec<ModelInfo>,
    pub warnings: Vec<ProviderWarning>,
    pub outcomes: Vec<ProviderOutcome>,
}

impl ModelList {
    pub fn source_of(&self, provider: &str) -> Option<ModelSource> {
        self.outcomes
            .iter()
            .find(|o| o.provider == provider)
            .map(|o| o.source)
    }

    pub fn models_from<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = &'a ModelInfo> + 'a {
        self.models.iter().filter(move |m| m.provider == provider)
    }
}

/// Result of one provider's pass through the aggregator.
struct ProviderContribution {
    provider: String,
    static_models: Vec<ModelInfo>,
    dynamic_models: Vec<ModelInfo>,
    source: ModelSource,
    warning: Option<ProviderWarning>,
}

/// Orchestrates registry, resolver, cache and fetchers into one model list.
#[derive(Debug, Clone)]
pub struct ModelListAggregator {
    registry: Arc<ProviderRegistry>,
    cache: Arc<ModelCache>,
    options: AggregatorOptions,
}

impl ModelListAggregator {
    pub fn new(registry: Arc<ProviderRegistry>, cache: Arc<ModelCache>) -> Self {
        Self {
            registry,
            cache,
            options: AggregatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AggregatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    pub fn register_provider(&self, descriptor: ProviderDescriptor) -> bool {
        self.registry.register(descriptor)
    }

    pub fn get_provider(&self, name: &str) -> Option<Arc<ProviderDescriptor>> {
        self.registry.get(name)
    }

    /// Effective configuration of a registered provider.
    pub fn resolve_config(
        &self,
        provider: &str,
        inputs: &ResolutionInputs,
    ) -> Result<ResolvedConfig> {
        Ok(self.registry.get_required(provider)?.resolve_config(inputs))
    }

    /// Merged model list of every registered provider.
    pub async fn get_model_list(&self, inputs: &ResolutionInputs) -> ModelList {
        self.collect(self.registry.all(), inputs, None).await
    }

    /// Like [`get_model_list`](Self::get_model_list); fetches still in flight
    /// when `cancel` fires contribute nothing and are reported as cancelled.
    pub async fn get_model_list_with_cancel(
        &self,
        inputs: &ResolutionInputs,
        cancel: &CancellationToken,
    ) -> ModelList {
        self.collect(self.registry.all(), inputs, Some(cancel)).await
    }

    /// Static and dynamic models of a single provider.
    pub async fn get_model_list_from_provider(
        &self,
        provider: &str,
        inputs: &ResolutionInputs,
    ) -> Result<ModelList> {
        let descriptor = self.registry.get_required(provider)?;
        Ok(self.collect(vec![descriptor], inputs, None).await)
    }

    async fn collect(
        &self,
        providers: Vec<Arc<ProviderDescriptor>>,
        inputs: &ResolutionInputs,
        cancel: Option<&CancellationToken>,
    ) -> ModelList {
        let span = tracing::info_span!("model_list", providers = providers.len());
        async {
            let contributions = if self.options.concurrent {
                futures::future::join_all(
                    providers
                        .iter()
                        .map(|p| self.provider_models(p, inputs, cancel)),
                )
                .await
            } else {
                let mut out = Vec::with_capacity(providers.len());
                for p in &providers {
                    out.push(self.provider_models(p, inputs, cancel).await);
                }
                out
            };
            merge(contributions)
        }
        .instrument(span)
        .await
    }

    async fn provider_models(
        &self,
        provider: &ProviderDescriptor,
        inputs: &ResolutionInputs,
        cancel: Option<&CancellationToken>,
    ) -> ProviderContribution {
        let name = provider.name().to_string();
        let setting = inputs.setting_for(&name);

        if self.options.skip_disabled_providers && setting.is_some_and(|s| !s.enabled) {
            tracing::debug!(provider = %name, "Provider disabled by settings; skipping");
            return ProviderContribution {
                provider: name,
                static_models: Vec::new(),
                dynamic_models: Vec::new(),
                source: ModelSource::Skipped,
                warning: None,
            };
        }

        let static_models = provider.static_models().to_vec();
        let Some(fetcher) = provider.dynamic_fetch() else {
            return ProviderContribution {
                provider: name,
                static_models,
                dynamic_models: Vec::new(),
                source: ModelSource::StaticOnly,
                warning: None,
            };
        };

        let resolved = provider.resolve_config(inputs);
        let key = self.cache.key_for(&name, &resolved, inputs);
        if let Some(entry) = self.cache.lookup(&key) {
            return ProviderContribution {
                provider: name,
                static_models,
                dynamic_models: entry.models,
                source: ModelSource::Cached,
                warning: None,
            };
        }

        let request = FetchRequest {
            provider: &name,
            resolved: &resolved,
            setting,
            inputs,
        };
        let span = tracing::debug_span!("provider_fetch", provider = %name);
        let result = self
            .bounded_fetch(fetcher.fetch_models(request), cancel)
            .instrument(span)
            .await;

        match result {
            Ok(models) => {
                let models = normalize_dynamic(&name, models);
                self.cache.store(key, name.as_str(), models.clone());
                ProviderContribution {
                    provider: name,
                    static_models,
                    dynamic_models: models,
                    source: ModelSource::Fetched,
                    warning: None,
                }
            }
            Err(error) => {
                tracing::warn!(provider = %name, error = %error, "Dynamic model fetch failed");
                ProviderContribution {
                    warning: Some(ProviderWarning::new(name.as_str(), error)),
                    provider: name,
                    static_models,
                    dynamic_models: Vec::new(),
                    source: ModelSource::Failed,
                }
            }
        }
    }

    async fn bounded_fetch<F>(
        &self,
        fetch: F,
        cancel: Option<&CancellationToken>,
    ) -> std::result::Result<Vec<ModelInfo>, FetchError>
    where
        F: std::future::Future<Output = std::result::Result<Vec<ModelInfo>, FetchError>>,
    {
        let timed = async {
            match self.options.fetch_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch)
                    .await
                    .unwrap_or(Err(FetchError::Timeout(limit))),
                None => fetch.await,
            }
        };

        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(FetchError::Cancelled),
                    result = timed => result,
                }
            }
            None => timed.await,
        }
    }
}

/// Stamp unowned models with the provider name and drop models that claim a
/// different provider or repeat a name.
fn normalize_dynamic(provider: &str, models: Vec<ModelInfo>) -> Vec<ModelInfo> {
    let mut seen = std::collections::HashSet::new();
    models
        .into_iter()
        .filter_map(|mut model| {
            if model.provider.is_empty() {
                model.provider = provider.to_string();
            } else if model.provider != provider {
                tracing::warn!(
                    provider = %provider,
                    model = %model.name,
                    claimed = %model.provider,
                    "Dropping dynamic model attributed to another provider"
                );
                return None;
            }
            seen.insert(model.name.clone()).then_some(model)
        })
        .collect()
}

/// Statics first, then dynamics, each in provider order. A dynamic model whose
/// `(provider, name)` is already listed replaces that entry in place.
fn merge(contributions: Vec<ProviderContribution>) -> ModelList {
    let mut list = ModelList::default();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut dynamic_groups = Vec::with_capacity(contributions.len());

    for contribution in contributions {
        for model in contribution.static_models {
            let key = (model.provider.clone(), model.name.clone());
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, list.models.len());
            list.models.push(model);
        }
        dynamic_groups.push(contribution.dynamic_models);
        list.outcomes.push(ProviderOutcome {
            provider: contribution.provider,
            source: contribution.source,
        });
        list.warnings.extend(contribution.warning);
    }

    for model in dynamic_groups.into_iter().flatten() {
        let key = (model.provider.clone(), model.name.clone());
        match index.get(&key) {
            Some(&pos) => list.models[pos] = model,
            None => {
                index.insert(key, list.models.len());
                list.models.push(model);
            }
        }
    }

    tracing::debug!(
        models = list.models.len(),
        warnings = list.warnings.len(),
        "Aggregated model list"
    );
    list
}
