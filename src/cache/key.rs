//! Cache key derivation.
//!
//! A key is the SHA-256 of a canonical JSON document holding every input that
//! can change a provider's dynamic fetch outcome. Maps are serialized through
//! `BTreeMap` so key order never leaks into the digest.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{ProviderSetting, ResolutionInputs, ResolvedConfig};

/// Deterministic fingerprint of one provider's resolution inputs (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable shard index for a cache with `shards` shards.
    pub(crate) fn shard(&self, shards: usize) -> usize {
        let hash = self
            .0
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
        hash % shards.max(1)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    provider: &'a str,
    base_url: Option<&'a str>,
    api_key: Option<&'a str>,
    explicit_api_key: Option<&'a str>,
    setting: Option<&'a ProviderSetting>,
    server_env: BTreeMap<&'a str, &'a str>,
}

/// Fingerprint the inputs of one provider's dynamic fetch.
///
/// Covers the resolved credential set, the provider's own setting and explicit
/// key, and the whole server environment. Settings and keys of other providers
/// are excluded so they cannot invalidate this provider's entry.
pub fn fingerprint(
    provider: &str,
    resolved: &ResolvedConfig,
    inputs: &ResolutionInputs,
) -> CacheKey {
    let input = FingerprintInput {
        provider,
        base_url: resolved.base_url.as_deref(),
        api_key: resolved.api_key_str(),
        explicit_api_key: inputs.api_key_for(provider),
        setting: inputs.setting_for(provider),
        server_env: inputs
            .server_env
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect(),
    };

    let mut hasher = Sha256::new();
    match serde_json::to_vec(&input) {
        Ok(bytes) => hasher.update(&bytes),
        // Serializing plain strings cannot fail; hash the debug form regardless.
        Err(_) => hasher.update(format!("{provider}|{:?}|{:?}", resolved, inputs).as_bytes()),
    }
    CacheKey(format!("{:x}", hasher.finalize()))
}
