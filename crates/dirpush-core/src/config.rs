//! Configuration module for dirpush.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Command-line flags are layered on top by the CLI through [`PushConfigBuilder`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::RemoteId;
use crate::governor::DEFAULT_MAX_OPS;

/// Default Google Drive API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";

// ---------------------------------------------------------------------------
// PushConfig and sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for a push run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub limits: LimitsConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Remote store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Id of the remote folder mirrored from the local directory.
    pub root_id: String,
    /// Id of the remote folder superseded files are moved into.
    pub quarantine_id: String,
    /// Base URL of the Drive API; overridden in tests.
    pub api_base_url: String,
}

/// Local side settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory whose contents are pushed. May be relative.
    pub dir: PathBuf,
}

/// Safety limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of mutating remote operations per run.
    pub max_ops: u64,
}

/// Upload retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// First retry delay in milliseconds; doubled on each attempt.
    pub retry_base_ms: u64,
    /// Upper bound on a single retry delay in milliseconds.
    pub retry_max_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl PushConfig {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PushConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`PushConfig::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/dirpush/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("dirpush")
            .join("config.yaml")
    }

    /// Parsed remote root id. Only meaningful after [`PushConfig::validate`]
    /// returned no errors.
    pub fn root_id(&self) -> Result<RemoteId, crate::domain::DomainError> {
        RemoteId::new(self.remote.root_id.clone())
    }

    /// Parsed quarantine folder id.
    pub fn quarantine_id(&self) -> Result<RemoteId, crate::domain::DomainError> {
        RemoteId::new(self.remote.quarantine_id.clone())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            root_id: String::new(),
            quarantine_id: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ops: DEFAULT_MAX_OPS,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            retry_base_ms: 500,
            retry_max_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.root_id"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl PushConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. No filesystem or
    /// network access happens here; a missing local directory is reported
    /// by the scan.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        check_remote_id(&mut errors, "remote.root_id", &self.remote.root_id);
        check_remote_id(&mut errors, "remote.quarantine_id", &self.remote.quarantine_id);
        if !self.remote.root_id.is_empty() && self.remote.root_id == self.remote.quarantine_id {
            errors.push(ValidationError {
                field: "remote.quarantine_id".into(),
                message: "must differ from remote.root_id".into(),
            });
        }
        let url = self.remote.api_base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "remote.api_base_url".into(),
                message: format!("must be an http(s) URL, got '{url}'"),
            });
        }

        // --- local ---
        if self.local.dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "local.dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- limits ---
        // A ceiling of 0 is accepted; the run aborts on its first mutation.

        // --- upload ---
        if self.upload.retry_base_ms == 0 {
            errors.push(ValidationError {
                field: "upload.retry_base_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.upload.retry_max_ms < self.upload.retry_base_ms {
            errors.push(ValidationError {
                field: "upload.retry_max_ms".into(),
                message: format!(
                    "retry_max_ms ({}) must not be below retry_base_ms ({})",
                    self.upload.retry_max_ms, self.upload.retry_base_ms
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

fn check_remote_id(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError {
            field: field.into(),
            message: "must not be empty".into(),
        });
    } else if let Err(e) = RemoteId::new(value.to_string()) {
        errors.push(ValidationError {
            field: field.into(),
            message: e.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// PushConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`PushConfig`] programmatically.
///
/// Starts from [`PushConfig::default`] (or a loaded file, via
/// [`PushConfigBuilder::from_config`]) and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use dirpush_core::config::PushConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = PushConfigBuilder::new()
///     .root_id("0AFolderRoot")
///     .quarantine_id("0AFolderOld")
///     .local_dir(PathBuf::from("/srv/photos"))
///     .max_ops(100)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PushConfigBuilder {
    config: PushConfig,
}

impl PushConfigBuilder {
    /// Create a new builder initialised with [`PushConfig::default`] values.
    pub fn new() -> Self {
        Self {
            config: PushConfig::default(),
        }
    }

    /// Start from an existing configuration, typically loaded from a file.
    pub fn from_config(config: PushConfig) -> Self {
        Self { config }
    }

    // --- remote ---

    pub fn root_id(mut self, id: impl Into<String>) -> Self {
        self.config.remote.root_id = id.into();
        self
    }

    pub fn quarantine_id(mut self, id: impl Into<String>) -> Self {
        self.config.remote.quarantine_id = id.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.api_base_url = url.into();
        self
    }

    // --- local ---

    pub fn local_dir(mut self, dir: PathBuf) -> Self {
        self.config.local.dir = dir;
        self
    }

    // --- limits ---

    pub fn max_ops(mut self, n: u64) -> Self {
        self.config.limits.max_ops = n;
        self
    }

    // --- upload ---

    pub fn retry_base_ms(mut self, ms: u64) -> Self {
        self.config.upload.retry_base_ms = ms;
        self
    }

    pub fn retry_max_ms(mut self, ms: u64) -> Self {
        self.config.upload.retry_max_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`PushConfig`].
    pub fn build(self) -> PushConfig {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<PushConfig, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for PushConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
