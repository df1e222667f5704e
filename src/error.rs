//! Error types
//!
//! - [`RegistryError`]: lookups that require a provider to exist
//! - [`FetchError`]: failures of a provider's dynamic model fetch
//! - [`ProviderWarning`]: a fetch failure converted into a per-provider warning
//!
//! Configuration resolution never fails and duplicate registration is logged,
//! so neither has an error variant here.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by registry lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `default_provider()` was called on an empty registry
    #[error("No providers registered")]
    NoProvidersRegistered,

    /// A lookup by name failed where the caller required existence
    #[error("No such provider: {name}. Available providers: {available:?}")]
    ProviderNotFound {
        name: String,
        available: Vec<String>,
    },
}

/// Errors raised by a provider's dynamic model fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FetchError {
    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Connection, DNS or HTTP-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The vendor answered but the payload could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The fetch exceeded the caller-supplied time budget
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the fetch
    #[error("Fetch cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The aggregator itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// A dynamic-fetch failure isolated to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderWarning {
    pub provider: String,
    pub error: FetchError,
}

impl ProviderWarning {
    pub fn new(provider: impl Into<String>, error: FetchError) -> Self {
        Self {
            provider: provider.into(),
            error,
        }
    }
}

impl std::fmt::Display for ProviderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to fetch dynamic models for {}: {}",
            self.provider, self.error
        )
    }
}

/// Errors raised while installing the tracing subscriber.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid log level: {0}. Valid options: trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("Invalid log format: {0}. Valid options: text, json, json-compact")]
    InvalidFormat(String),

    #[error("Invalid log file path: {0}")]
    InvalidLogFile(String),

    #[error("Telemetry initialization error: {0}")]
    Init(String),
}

/// Result type for registry operations
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
