//! Service configuration module.
//!
//! Handles loading, validating, and merging `akira.toml`. Stock defaults are
//! overridden by an optional user config file, and CLI flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! max_upload_bytes = 10485760   # Multipart body limit
//! request_timeout_secs = 15     # Deadline for one resize request
//!
//! [processing]
//! pool_size = 5                 # Concurrent transforms, process-wide
//! output_format = "jpeg"        # "jpeg" or "avif"
//! max_dimension = 8192          # Largest accepted width/height of a size
//!
//! [resize]
//! default_quality = 100         # Used when a request omits `quality`
//! report_failures = false       # List failed sizes and set error:true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [processing]
//! pool_size = 8
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::dispatch::{DEFAULT_POOL_SIZE, DispatchConfig};
use crate::imaging::{OutputFormat, Quality, TransformOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `akira.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AkiraConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Worker pool and encoder settings.
    pub processing: ProcessingConfig,
    /// Per-request defaults and reporting.
    pub resize: ResizeConfig,
}

impl AkiraConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.host must not be empty".into(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.max_upload_bytes must be non-zero".into(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.request_timeout_secs must be non-zero".into(),
            ));
        }
        if self.processing.pool_size == 0 {
            return Err(ConfigError::Validation(
                "processing.pool_size must be at least 1".into(),
            ));
        }
        if self.processing.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "processing.max_dimension must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            pool_size: self.processing.pool_size,
            transform: TransformOptions {
                format: self.processing.output_format,
                max_dimension: self.processing.max_dimension,
            },
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Jobs not yet started when this elapses are skipped.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 << 20,
            request_timeout_secs: 15,
        }
    }
}

/// Worker pool and encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of transforms that may run at once across all requests.
    pub pool_size: usize,
    pub output_format: OutputFormat,
    pub max_dimension: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            output_format: OutputFormat::default(),
            max_dimension: TransformOptions::default().max_dimension,
        }
    }
}

/// Per-request defaults and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub default_quality: Quality,
    /// When set, failed sizes are listed in the response and flip `error`.
    pub report_failures: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AkiraConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AkiraConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AkiraConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, or stock defaults when `path` is `None`.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<AkiraConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `akira.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Akira Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass the file with `akira --config akira.toml serve`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Interface and port to listen on.
host = "0.0.0.0"
port = 8000

# Largest accepted request body in bytes (10 MiB).
max_upload_bytes = 10485760

# Seconds a resize request may run. Sizes not yet started when the
# deadline passes are skipped; a transform already running finishes.
request_timeout_secs = 15

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Number of resize jobs that may run at the same time, shared by all
# requests.
pool_size = 5

# Container every size is re-encoded into: "jpeg" or "avif".
output_format = "jpeg"

# Largest accepted width or height of a requested size, in pixels.
max_dimension = 8192

# ---------------------------------------------------------------------------
# Resize requests
# ---------------------------------------------------------------------------
[resize]
# Encoding quality used when a request has no `quality` field (0-100).
default_quality = 100

# When true, sizes that failed are listed under "failed" in the response
# and "error" is set to true. When false they are silently left out.
report_failures = false
"##
}
