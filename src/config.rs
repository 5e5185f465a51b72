//! Library configuration.
//!
//! Handles loading, validating, and merging the `lightbox.toml` file. The
//! file is sparse: stock defaults are overridden key-by-key by whatever the
//! user writes, and unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! cache_dir = ".lightbox-cache"   # Root of the mirrored artifact tree
//!
//! [thumbnails]
//! quality = 90                    # JPEG thumbnail quality (1-100)
//!
//! [processing]
//! max_processes = 4               # Max parallel workers (omit for auto = CPU cores)
//!
//! [[indexes]]                     # Ordered; position is the index id
//! name = "Photos"
//! path = "/srv/photos"
//! ```
//!
//! ## Relative Paths
//!
//! `cache_dir` and every index `path` resolve against the directory holding
//! the config file, so a config checked in next to its albums keeps working
//! from any working directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "lightbox.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `lightbox.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Root of the mirrored cache tree for thumbnails and metadata.
    pub cache_dir: PathBuf,
    /// Thumbnail encoding settings.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Image roots, in id order.
    pub indexes: Vec<IndexConfig>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".lightbox-cache"),
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
            indexes: Vec::new(),
        }
    }
}

impl LibraryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indexes.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[indexes]] entry is required".into(),
            ));
        }
        if let Some(pos) = self.indexes.iter().position(|i| i.name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "indexes[{pos}].name must not be empty"
            )));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Rebase relative paths onto `base` (the config file's directory).
    fn rebase(mut self, base: &Path) -> Self {
        if self.cache_dir.is_relative() {
            self.cache_dir = base.join(&self.cache_dir);
        }
        for index in &mut self.indexes {
            if index.path.is_relative() {
                index.path = base.join(&index.path);
            }
        }
        self
    }
}

/// One configured image root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Display name shown to clients.
    pub name: String,
    /// Directory whose tree is exposed under this index.
    pub path: PathBuf,
}

/// Thumbnail encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Quality for JPEG thumbnails. Lossless formats ignore it.
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers for listings and warm-up.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LibraryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
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

/// Parse config text, merge it over the stock defaults, and validate.
pub fn parse_config(content: &str) -> Result<LibraryConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: LibraryConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, resolving relative paths against its directory.
pub fn load_config(path: &Path) -> Result<LibraryConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or(Path::new("."));
    Ok(parse_config(&content)?.rebase(base))
}

/// Returns a fully-commented stock `lightbox.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lightbox Configuration
# ======================
# Values shown below are the defaults. Only [[indexes]] is required.
# Relative paths resolve against the directory containing this file.
# Unknown keys will cause an error.

# Root of the derived-artifact cache. Thumbnails land under <cache_dir>/thumb/
# and metadata records under <cache_dir>/meta/, mirroring each image's path.
# Artifacts are never regenerated once written; delete them to force a rebuild.
cache_dir = ".lightbox-cache"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# JPEG encoding quality for thumbnails of JPEG sources (1 = worst, 100 = best).
# PNG, GIF and WebP thumbnails are lossless and ignore this.
quality = 90

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers for directory listings and warm-up.
# Omit to use all available CPU cores. Values above the core count are
# clamped down.
# max_processes = 4

# ---------------------------------------------------------------------------
# Indexes
# ---------------------------------------------------------------------------
# Each [[indexes]] entry exposes one directory tree. Ids are assigned by
# position, starting at 0, so append new roots at the end to keep links stable.
#
# [[indexes]]
# name = "Photos"
# path = "/srv/photos"
"##
}
