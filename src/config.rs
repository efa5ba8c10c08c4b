//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `album-resizer.toml`. The user file
//! is a sparse overlay on top of stock defaults; a missing file means "use
//! the defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [[sizes]]                 # Ordered derivative catalog
//! name = "thumb"
//! max_dimension = 256
//!
//! [output]
//! quality = 100             # JPEG quality (1-100)
//! preserve_metadata = true  # Carry the source EXIF block into derivatives
//!
//! [derivatives]
//! enabled = true            # Generate/delete derivatives for `full` originals
//!
//! [metadata]
//! enabled = true            # Log EXIF tags for every uploaded image
//!
//! [storage]
//! force_path_style = false  # Needed by most S3-compatible servers
//! # region = "eu-west-1"
//! # endpoint_url = "http://localhost:9000"
//!
//! [listener]
//! max_messages = 10         # Per SQS receive call (1-10)
//! wait_time_seconds = 20    # Long-poll duration (0-20)
//! # queue_url = "https://sqs.eu-west-1.amazonaws.com/123456789012/uploads"
//! ```
//!
//! ## Partial Configuration
//!
//! Tables merge key by key, so this only turns off the EXIF path:
//!
//! ```toml
//! [metadata]
//! enabled = false
//! ```
//!
//! Arrays replace wholesale: a `[[sizes]]` list in the user file is the whole
//! catalog, not an addition to the default one.
//!
//! ## Validation
//!
//! Unknown keys are rejected. The size catalog is checked for empty or
//! reserved names, duplicates, and zero bounds. Listener limits must sit
//! inside what SQS accepts.

use crate::catalog::{SizeCatalog, SizeSpec, default_sizes};
use crate::imaging::{DerivativeConfig, OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "album-resizer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Derivative catalog, in generation order.
    pub sizes: Vec<SizeSpec>,
    pub output: OutputConfig,
    pub derivatives: DerivativesConfig,
    pub metadata: MetadataConfig,
    pub storage: StorageConfig,
    pub listener: ListenerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            output: OutputConfig::default(),
            derivatives: DerivativesConfig::default(),
            metadata: MetadataConfig::default(),
            storage: StorageConfig::default(),
            listener: ListenerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog()?;
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !(1..=10).contains(&self.listener.max_messages) {
            return Err(ConfigError::Validation(
                "listener.max_messages must be 1-10".into(),
            ));
        }
        if !(0..=20).contains(&self.listener.wait_time_seconds) {
            return Err(ConfigError::Validation(
                "listener.wait_time_seconds must be 0-20".into(),
            ));
        }
        Ok(())
    }

    /// The validated size catalog.
    pub fn catalog(&self) -> Result<SizeCatalog, ConfigError> {
        SizeCatalog::new(self.sizes.clone())
            .map_err(|e| ConfigError::Validation(format!("sizes: {e}")))
    }

    /// Encoding settings handed to the derivative generator.
    pub fn derivative_config(&self) -> DerivativeConfig {
        DerivativeConfig {
            format: OutputFormat::Jpeg,
            quality: Quality::new(self.output.quality),
            preserve_metadata: self.output.preserve_metadata,
        }
    }
}

/// Derivative encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (1-100).
    pub quality: u32,
    /// Re-embed the source EXIF block into each derivative.
    pub preserve_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::maximum().value(),
            preserve_metadata: true,
        }
    }
}

/// Switch for the derivative pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DerivativesConfig {
    pub enabled: bool,
}

impl Default for DerivativesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Switch for the EXIF reporting pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub enabled: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Object storage client settings. Unset values fall back to the
/// standard AWS environment/profile chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// SQS long-poll settings for `listen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_url: Option<String>,
    pub max_messages: i32,
    pub wait_time_seconds: i32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            queue_url: None,
            max_messages: 10,
            wait_time_seconds: 20,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Album Resizer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Derivative sizes
# ---------------------------------------------------------------------------
# Each entry writes {container}/{name}/{file} next to {container}/full/{file},
# with the longer edge scaled to max_dimension. Order is generation order.
# Listing [[sizes]] here replaces the whole default list.
[[sizes]]
name = "thumb"
max_dimension = 256

# [[sizes]]
# name = "large"
# max_dimension = 1920

# [[sizes]]
# name = "medium"
# max_dimension = 1024

# [[sizes]]
# name = "small"
# max_dimension = 512

# ---------------------------------------------------------------------------
# Derivative encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best).
quality = 100

# Copy the original's EXIF block into every derivative.
preserve_metadata = true

# ---------------------------------------------------------------------------
# Pipelines
# ---------------------------------------------------------------------------
[derivatives]
# Generate derivatives on upload and remove them on delete, for keys whose
# middle segment is "full".
enabled = true

[metadata]
# Log the EXIF tags of every uploaded object whose extension looks like an image.
enabled = true

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Region and endpoint default to the AWS environment/profile chain.
# region = "eu-west-1"
# endpoint_url = "http://localhost:9000"

# Path-style addressing (bucket in the path), needed by MinIO and friends.
force_path_style = false

# ---------------------------------------------------------------------------
# SQS listener (the `listen` command)
# ---------------------------------------------------------------------------
[listener]
# Queue receiving the bucket's event notifications. Can also be given
# with --queue-url.
# queue_url = "https://sqs.eu-west-1.amazonaws.com/123456789012/uploads"

# Messages per receive call (1-10).
max_messages = 10

# Long-poll wait in seconds (0-20).
wait_time_seconds = 20
"##
}
