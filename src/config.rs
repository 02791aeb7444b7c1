//! Configuration module.
//!
//! Handles loading, validating, and merging `image-variations.toml`.
//! Configuration is layered: stock defaults are overridden by the config
//! file, which is overridden by command-line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [naming]
//! pattern = "%filename%__%id%.%ext%"  # Must hold %filename%, %id% and %ext% once each
//! pass_through_formats = ["gif", "svg"]
//!
//! [pipeline]
//! supported_formats = ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "ico", "webp"]
//! pass_through_formats = ["gif", "svg"]
//!
//! [uri]
//! prefix = ""
//! glue = "/"
//!
//! [storage]
//! root = "."
//!
//! [variations.thumb]
//! id = "t1"
//! extension = "jpg"
//! width = 200
//! height = 200
//! crop = true
//! quality = 80
//! ```
//!
//! Variations are registered in file order. The two pass-through lists are
//! independent: `naming` decides which extension a derived name keeps,
//! `pipeline` decides which sources are copied instead of decoded.
//!
//! Unknown keys are rejected to catch typos early.

use crate::naming::{DEFAULT_PASS_THROUGH, DEFAULT_PATTERN, FilenameCodec, PatternError};
use crate::pipeline::{DEFAULT_SUPPORTED, PipelineOptions};
use crate::registry::RegistryError;
use crate::resolver::VariationResolver;
use crate::uri::UriOptions;
use crate::variation::VariationDefinition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILENAME: &str = "image-variations.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid naming pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("Invalid variation: {0}")]
    Registry(#[from] RegistryError),
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration loaded from `image-variations.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub naming: NamingConfig,
    pub pipeline: PipelineConfig,
    pub uri: UriOptions,
    pub storage: StorageConfig,
    /// Variation definitions keyed by alias, in file order.
    pub variations: IndexMap<String, VariationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub pattern: String,
    /// Source extensions kept in derived names.
    pub pass_through_formats: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            pass_through_formats: strings(DEFAULT_PASS_THROUGH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub supported_formats: Vec<String>,
    /// Source extensions copied verbatim.
    pub pass_through_formats: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            supported_formats: strings(DEFAULT_SUPPORTED),
            pass_through_formats: strings(DEFAULT_PASS_THROUGH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory that source and derived names are relative to.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        FilenameCodec::new(&self.naming.pattern)?;

        if self.pipeline.supported_formats.is_empty() {
            return Err(ConfigError::Validation(
                "pipeline.supported_formats must not be empty".into(),
            ));
        }
        for (alias, def) in &self.variations {
            if def.quality.is_some_and(|q| q > 100) {
                return Err(ConfigError::Validation(format!(
                    "variations.{alias}.quality must be 0-100"
                )));
            }
            if def.width == Some(0) || def.height == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "variations.{alias} width/height must be non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Naming codec for `[naming]`.
    pub fn codec(&self) -> Result<FilenameCodec, ConfigError> {
        Ok(FilenameCodec::new(&self.naming.pattern)?
            .with_pass_through(self.naming.pass_through_formats.iter().cloned()))
    }

    /// Resolver with every `[variations.*]` entry registered in file order.
    pub fn build_resolver(&self) -> Result<VariationResolver, ConfigError> {
        let mut resolver = VariationResolver::new(self.codec()?);
        for (alias, def) in &self.variations {
            resolver.register(alias.clone(), def.clone())?;
        }
        Ok(resolver)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            supported_formats: self.pipeline.supported_formats.clone(),
            pass_through_formats: self.pipeline.pass_through_formats.iter().cloned().collect(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Overlay built from command-line flags.
pub fn flag_overrides(root: Option<&str>, pattern: Option<&str>) -> toml::Value {
    let mut table = toml::map::Map::new();
    if let Some(root) = root {
        let mut storage = toml::map::Map::new();
        storage.insert("root".into(), toml::Value::String(root.to_string()));
        table.insert("storage".into(), toml::Value::Table(storage));
    }
    if let Some(pattern) = pattern {
        let mut naming = toml::map::Map::new();
        naming.insert("pattern".into(), toml::Value::String(pattern.to_string()));
        table.insert("naming".into(), toml::Value::Table(naming));
    }
    toml::Value::Table(table)
}

/// Merge overlays in order onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config<I>(overlays: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = toml::Value>,
{
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (if it exists) on top of stock defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `image-variations.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-variations configuration
# ==============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Derived filenames
# ---------------------------------------------------------------------------
[naming]
# Template for derived names. Must contain %filename%, %id% and %ext%
# exactly once each, with literal text between neighbouring placeholders.
# The source directory is kept in front: photos/cat.png -> photos/cat__t1.jpg
pattern = "%filename%__%id%.%ext%"

# Source extensions that keep their own extension in derived names.
pass_through_formats = ["gif", "svg"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[pipeline]
# Formats that may be decoded for metadata and used as variation outputs.
# Compared case-sensitively.
supported_formats = ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "ico", "webp"]

# Source extensions copied byte for byte instead of transformed.
# Keep in sync with naming.pass_through_formats.
pass_through_formats = ["gif", "svg"]

# ---------------------------------------------------------------------------
# Public links
# ---------------------------------------------------------------------------
[uri]
# Base URL or path put in front of derived names.
prefix = ""
# Separator between prefix and derived name.
glue = "/"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Directory that source and derived names are relative to.
root = "."

# ---------------------------------------------------------------------------
# Variations
# ---------------------------------------------------------------------------
# One table per alias. `id` goes into derived names: 1-30 of A-Z, a-z, 0-9.
# Omit width/height to keep the source size. `crop = true` fills the exact
# box (a missing side copies the other); otherwise the image is fitted
# inside the box, keeping its aspect ratio.
[variations]
# [variations.thumb]
# id = "t1"
# extension = "jpg"
# width = 200
# height = 200
# crop = true
# quality = 80
#
# [variations.preview]
# id = "t2"
# extension = "webp"
# width = 1200
# sharpen = 10
"##
}
