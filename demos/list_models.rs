//! Print the merged model list of the built-in catalog plus one custom provider.
//!
//! ```bash
//! cargo run --example list_models
//! RUST_LOG=model_registry=debug cargo run --example list_models
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use model_registry::prelude::*;
use model_registry::telemetry::{SubscriberConfig, init_subscriber};

/// Stands in for a vendor `/models` endpoint.
struct LocalFetcher;

#[async_trait]
impl DynamicModelFetcher for LocalFetcher {
    async fn fetch_models(&self, request: FetchRequest<'_>) -> Result<Vec<ModelInfo>, FetchError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let base_url = request
            .resolved
            .base_url
            .as_deref()
            .ok_or_else(|| FetchError::transport("no base URL configured"))?;
        Ok(vec![
            ModelInfo::new("local-small", "", 4096).with_label(format!("Small @ {base_url}")),
            ModelInfo::new("local-large", "", 32_768)
                .with_label(format!("Large @ {base_url}"))
                .with_capability("function-calling"),
        ])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = init_subscriber(SubscriberConfig::default())?;

    let registry = Arc::new(ProviderRegistry::with_builtin_providers());
    registry.register(
        ProviderDescriptor::new("Local")
            .with_config(ProviderConfig::new().with_base_url("http://127.0.0.1:8080/"))
            .with_dynamic_fetch(Arc::new(LocalFetcher)),
    );

    let options = AggregatorOptions::default().with_fetch_timeout(Some(Duration::from_secs(5)));
    let aggregator = ModelListAggregator::new(registry, Arc::new(ModelCache::default()))
        .with_options(options);

    let inputs =
        ResolutionInputs::new().with_server_env("LOCAL_API_BASE_URL", "http://localhost:9000/");
    let list = aggregator.get_model_list(&inputs).await;
    println!("{}", serde_json::to_string_pretty(&list)?);

    // Same inputs again: served from the cache.
    let again = aggregator.get_model_list(&inputs).await;
    println!("second call outcomes: {:?}", again.outcomes);
    Ok(())
}
