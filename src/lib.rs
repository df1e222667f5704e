//! model-registry
//!
//! Provider & model registry for multi-vendor AI applications:
//!
//! - [`registry::ProviderRegistry`]: name-keyed catalog of provider descriptors
//! - [`resolver`]: layered base URL / credential resolution
//! - [`cache::ModelCache`]: fingerprint-keyed memo of dynamic model lists
//! - [`aggregator::ModelListAggregator`]: fault-isolated merge of static and
//!   dynamic models across every provider
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use model_registry::prelude::*;
//!
//! let registry = Arc::new(ProviderRegistry::with_builtin_providers());
//! let aggregator = ModelListAggregator::new(registry, Arc::new(ModelCache::default()));
//! let list = aggregator.get_model_list(&ResolutionInputs::new()).await;
//! ```
#![deny(unsafe_code)]

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_support;

pub use aggregator::{AggregatorOptions, ModelList, ModelListAggregator, ModelSource};
pub use cache::{CacheKey, CacheOptions, ModelCache};
pub use error::{FetchError, ProviderWarning, RegistryError, TelemetryError};
pub use provider::{DynamicModelFetcher, FetchRequest, ProviderDescriptor};
pub use registry::ProviderRegistry;
pub use types::{
    ModelInfo, ProviderConfig, ProviderSetting, ResolutionInputs, ResolvedConfig,
};

/// Common imports
pub mod prelude {
    pub use crate::aggregator::{AggregatorOptions, ModelList, ModelListAggregator};
    pub use crate::cache::{CacheOptions, ModelCache};
    pub use crate::error::{FetchError, ProviderWarning, RegistryError};
    pub use crate::provider::{DynamicModelFetcher, FetchRequest, ProviderDescriptor};
    pub use crate::registry::ProviderRegistry;
    pub use crate::types::{
        ModelInfo, ProviderConfig, ProviderSetting, ResolutionInputs, ResolvedConfig,
    };
}
