//! Dynamic model cache
//!
//! Memoizes the outcome of a provider's dynamic model fetch under a
//! [`CacheKey`] fingerprint of the inputs that produced it. Because the key is a
//! pure function of those inputs, a changed credential or setting is a miss,
//! not stale data; there is no explicit invalidation in the normal path.
//!
//! The map is split into shards selected from the key, so lookups and stores
//! for different keys rarely share a lock. Stores for the same key are
//! last-write-wins. Optional bounds:
//! - `max_entries`: each shard becomes an LRU of `ceil(max / shards)` entries
//! - `ttl`: entries older than this are treated as misses and dropped

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;

use crate::types::{ModelInfo, ResolutionInputs, ResolvedConfig};

pub mod key;

pub use key::{CacheKey, fingerprint};

/// Options for [`ModelCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Maximum number of cached model lists (None = unbounded)
    pub max_entries: Option<usize>,
    /// Time-to-live for cached lists (None = no expiration)
    pub ttl: Option<Duration>,
    /// Number of independently locked shards
    pub shards: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_entries: None,
            ttl: None,
            shards: 16,
        }
    }
}

impl CacheOptions {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }
}

/// One memoized dynamic fetch outcome. Always replaced wholesale.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub cache_key: CacheKey,
    pub provider: String,
    pub models: Vec<ModelInfo>,
    pub fetched_at: DateTime<Utc>,
    stored_at: Instant,
}

impl CacheEntry {
    fn new(cache_key: CacheKey, provider: String, models: Vec<ModelInfo>) -> Self {
        Self {
            cache_key,
            provider,
            models,
            fetched_at: Utc::now(),
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        if let Some(ttl) = ttl {
            self.stored_at.elapsed() > ttl
        } else {
            false
        }
    }
}

/// Shared, sharded store of dynamic model lists.
pub struct ModelCache {
    shards: Box<[Mutex<LruCache<CacheKey, CacheEntry>>]>,
    ttl: Option<Duration>,
    disabled: bool,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("shards", &self.shards.len())
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl ModelCache {
    pub fn new(options: CacheOptions) -> Self {
        let mut shard_count = options.shards.max(1);
        if let Some(max) = options.max_entries {
            // Keep the total bound close to `max` for small capacities.
            shard_count = shard_count.min(max.max(1));
        }

        let per_shard = options
            .max_entries
            .and_then(|max| NonZeroUsize::new(max.div_ceil(shard_count)));
        let shards = (0..shard_count)
            .map(|_| {
                Mutex::new(match per_shard {
                    Some(cap) => LruCache::new(cap),
                    None => LruCache::unbounded(),
                })
            })
            .collect();

        Self {
            shards,
            ttl: options.ttl,
            disabled: options.max_entries == Some(0),
        }
    }

    /// Fingerprint for `provider` under the given resolution.
    pub fn key_for(
        &self,
        provider: &str,
        resolved: &ResolvedConfig,
        inputs: &ResolutionInputs,
    ) -> CacheKey {
        fingerprint(provider, resolved, inputs)
    }

    fn shard(&self, key: &CacheKey) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.shards[key.shard(self.shards.len())]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a cached entry. A miss is a normal outcome, not an error.
    pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut shard = self.shard(key);
        let expired = match shard.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                tracing::debug!(provider = %entry.provider, cache_key = %key, "Model cache hit");
                return Some(entry.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            shard.pop(key);
            tracing::debug!(cache_key = %key, "Model cache entry expired");
        } else {
            tracing::debug!(cache_key = %key, "Model cache miss");
        }
        None
    }

    /// Store a fetch outcome, replacing any entry under the same key.
    pub fn store(&self, key: CacheKey, provider: impl Into<String>, models: Vec<ModelInfo>) {
        if self.disabled {
            return;
        }
        let provider = provider.into();
        tracing::debug!(
            provider = %provider,
            cache_key = %key,
            models = models.len(),
            "Storing dynamic models"
        );
        let entry = CacheEntry::new(key.clone(), provider, models);
        self.shard(&key).put(key, entry);
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.shard(key).pop(key).is_some()
    }

    /// Drop every entry stored for `provider`. Returns how many were removed.
    pub fn invalidate_provider(&self, provider: &str) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut shard = shard.lock().unwrap_or_else(PoisonError::into_inner);
            let stale: Vec<CacheKey> = shard
                .iter()
                .filter(|(_, entry)| entry.provider == provider)
                .map(|(key, _)| key.clone())
                .collect();
            for key in stale {
                shard.pop(&key);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Number of stored entries, including ones that expired but were not yet
    /// looked up.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
