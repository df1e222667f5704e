//! Provider registry
//!
//! The single authoritative directory of known providers for the lifetime of
//! an application. It is constructed explicitly and shared by `Arc`, so tests
//! and embedders can run any number of isolated registries side by side.
//!
//! Registration order is part of the contract: it fixes the baseline ordering
//! of the static model list and selects the default provider.
//!
//! Writers serialize on a mutex and publish a fresh snapshot; readers clone
//! the current snapshot `Arc` and never observe a half-registered provider.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{RegistryError, Result};
use crate::provider::ProviderDescriptor;
use crate::types::ModelInfo;

type Snapshot = Arc<[Arc<ProviderDescriptor>]>;

/// Directory of registered providers, in registration order.
pub struct ProviderRegistry {
    /// Serializes writers so concurrent bootstrap paths cannot both insert a name
    write_lock: Mutex<()>,
    /// Current published directory
    snapshot: RwLock<Snapshot>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            write_lock: Mutex::new(()),
            snapshot: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Build a registry from descriptors, registering them in iteration order.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ProviderDescriptor>) -> Self {
        let registry = Self::new();
        for desc in descriptors {
            registry.register(desc);
        }
        registry
    }

    /// Build a registry pre-populated with the built-in provider catalog.
    pub fn with_builtin_providers() -> Self {
        Self::from_descriptors(crate::provider::builtin::builtin_providers())
    }

    /// Register a provider.
    ///
    /// Returns `false` without touching the registry when the name is already
    /// present; the first registrant's static models stay in place. Bootstrap
    /// code may run more than once, so this is logged rather than an error.
    pub fn register(&self, descriptor: ProviderDescriptor) -> bool {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();

        if current.iter().any(|p| p.name() == descriptor.name()) {
            tracing::warn!(
                provider = %descriptor.name(),
                "Provider already registered; ignoring duplicate registration"
            );
            return false;
        }

        let name = descriptor.name().to_string();
        let mut next: Vec<Arc<ProviderDescriptor>> = current.iter().cloned().collect();
        next.push(Arc::new(descriptor));
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(next);

        tracing::info!(provider = %name, "Registered provider");
        true
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a provider by its case-sensitive name.
    pub fn get(&self, name: &str) -> Option<Arc<ProviderDescriptor>> {
        self.snapshot().iter().find(|p| p.name() == name).cloned()
    }

    /// Look up a provider that must exist.
    pub fn get_required(&self, name: &str) -> Result<Arc<ProviderDescriptor>> {
        self.get(name)
            .ok_or_else(|| RegistryError::ProviderNotFound {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Snapshot of current registrants, in registration order.
    pub fn all(&self) -> Vec<Arc<ProviderDescriptor>> {
        self.snapshot().to_vec()
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Every registrant's static models, concatenated in registration order.
    pub fn static_model_list(&self) -> Vec<ModelInfo> {
        self.snapshot()
            .iter()
            .flat_map(|p| p.static_models().iter().cloned())
            .collect()
    }

    /// Static models of one provider.
    pub fn static_models_from_provider(&self, name: &str) -> Result<Vec<ModelInfo>> {
        Ok(self.get_required(name)?.static_models().to_vec())
    }

    /// The first-registered provider.
    pub fn default_provider(&self) -> Result<Arc<ProviderDescriptor>> {
        self.snapshot()
            .first()
            .cloned()
            .ok_or(RegistryError::NoProvidersRegistered)
    }
}
