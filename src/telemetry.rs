//! Tracing subscriber bootstrap
//!
//! The library only emits `tracing` events; binaries decide where they go.
//!
//! ```rust,ignore
//! use model_registry::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let _guard = init_subscriber(
//!     SubscriberConfig::builder()
//!         .log_level(tracing::Level::DEBUG)
//!         .output_format(OutputFormat::Json)
//!         .build(),
//! )?;
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::TelemetryError;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// JSON without span lists
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(TelemetryError::InvalidFormat(s.to_string())),
        }
    }
}

/// Configuration for [`init_subscriber`]
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Fallback level when `RUST_LOG` is not set
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Filter directive used when `RUST_LOG` is absent.
    pub fn fallback_directive(&self) -> String {
        format!(
            "model_registry={}",
            self.log_level.as_str().to_ascii_lowercase()
        )
    }
}

#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from its name (case-insensitive).
    pub fn log_level_str(mut self, level: &str) -> Result<Self, TelemetryError> {
        let parsed = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => return Err(TelemetryError::InvalidLevel(level.to_string())),
        };
        self.log_level = Some(parsed);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive for the
/// life of the program or buffered lines are lost. Fails with
/// [`TelemetryError::AlreadyInitialized`] if a global subscriber exists.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.fallback_directive()));

    let (writer, guard, ansi) = match &config.log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| TelemetryError::InvalidLogFile(path.display().to_string()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Json => builder.with_ansi(false).json().try_init(),
        OutputFormat::JsonCompact => builder
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .with_span_list(false)
            .try_init(),
        OutputFormat::Text => builder.with_ansi(ansi).try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let message = e.to_string();
            if message.contains("global default trace dispatcher has already been set") {
                Err(TelemetryError::AlreadyInitialized)
            } else {
                Err(TelemetryError::Init(message))
            }
        }
    }
}

/// Install the subscriber from `MODEL_REGISTRY_LOG_LEVEL`,
/// `MODEL_REGISTRY_LOG_FORMAT` and `MODEL_REGISTRY_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, TelemetryError> {
    init_subscriber(config_from_env(|key| std::env::var(key).ok())?)
}

pub(crate) fn config_from_env(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SubscriberConfig, TelemetryError> {
    let mut builder = SubscriberConfig::builder();
    if let Some(level) = lookup("MODEL_REGISTRY_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("MODEL_REGISTRY_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }
    if let Some(file) = lookup("MODEL_REGISTRY_LOG_FILE") {
        builder = builder.log_file(file);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn builder_defaults() {
        let config = SubscriberConfig::builder().build();
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.log_file.is_none());
        assert_eq!(config.fallback_directive(), "model_registry=info");
        assert_eq!(SubscriberConfig::debug().fallback_directive(), "model_registry=debug");
    }

    #[test]
    fn config_from_env_reads_all_keys() {
        let config = config_from_env(env(&[
            ("MODEL_REGISTRY_LOG_LEVEL", "WARN"),
            ("MODEL_REGISTRY_LOG_FORMAT", "json-compact"),
            ("MODEL_REGISTRY_LOG_FILE", "/tmp/registry.log"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::WARN);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/registry.log")));
    }

    #[test]
    fn config_from_env_rejects_unknown_values() {
        assert!(matches!(
            config_from_env(env(&[("MODEL_REGISTRY_LOG_LEVEL", "loud")])),
            Err(TelemetryError::InvalidLevel(_))
        ));
        assert!(matches!(
            config_from_env(env(&[("MODEL_REGISTRY_LOG_FORMAT", "xml")])),
            Err(TelemetryError::InvalidFormat(_))
        ));
    }
}
