//! Service configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! ```toml
//! [retry]
//! max_retries = 5
//! backoff_ms = 0
//!
//! [limits]
//! max_commands = 10000
//! max_steps = 100000
//! coordinate_bound = 100000
//!
//! [store]
//! kind = "json-lines"
//! path = "data/executions.jsonl"
//!
//! [log]
//! filter = "info"
//! json = false
//! ```
//!
//! Environment overrides: `GRIDSWEEP_MAX_RETRIES`, `GRIDSWEEP_STORE_PATH`
//! (also switches the store to JSON lines) and `GRIDSWEEP_LOG_JSON`.

use gridsweep_core::ValidationLimits;
use gridsweep_store::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Retry section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Inserts allowed per request, at least 1
    pub max_retries: u32,
    /// Pause before each reconciliation
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            backoff_ms: 0,
        }
    }
}

/// Which store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// Append-only JSON-lines file
    JsonLines,
}

/// Store section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Required for `json-lines`
    pub path: Option<PathBuf>,
}

/// Log section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub retry: RetryConfig,
    pub limits: ValidationLimits,
    pub store: StoreConfig,
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// With a JSON-lines store at `path`
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = StoreConfig {
            kind: StoreKind::JsonLines,
            path: Some(path.into()),
        };
        self
    }

    /// With validation limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for bad values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `GRIDSWEEP_*` overrides from the process environment
    ///
    /// # Errors
    /// `ConfigError::Invalid` if an override does not parse.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `GRIDSWEEP_*` overrides read through `lookup`
    ///
    /// # Errors
    /// `ConfigError::Invalid` if an override does not parse.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("GRIDSWEEP_MAX_RETRIES") {
            self.retry.max_retries = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("GRIDSWEEP_MAX_RETRIES={value} is not a number"))
            })?;
        }
        if let Some(path) = lookup("GRIDSWEEP_STORE_PATH").filter(|p| !p.is_empty()) {
            self = self.with_store_path(path);
        }
        if let Some(value) = lookup("GRIDSWEEP_LOG_JSON") {
            self.log.json = matches!(value.trim(), "1" | "true" | "yes");
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field consistency
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_retries must be at least 1".to_string(),
            ));
        }
        if self.limits.max_commands == 0 || self.limits.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_commands and limits.max_steps must be positive".to_string(),
            ));
        }
        if self.store.kind == StoreKind::JsonLines && self.store.path.is_none() {
            return Err(ConfigError::Invalid(
                "store.path is required for the json-lines store".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy described by the `[retry]` section
    ///
    /// # Errors
    /// `ConfigError::Invalid` when `max_retries` is zero.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::new(self.retry.max_retries)
            .map(|p| p.with_backoff(Duration::from_millis(self.retry.backoff_ms)))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
