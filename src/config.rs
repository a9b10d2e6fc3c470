//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `asset-press.toml`. Stock
//! defaults are serialized to a TOML table and the user file, if present in
//! the project root, is merged on top key by key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! portfolio = "src/assets/portfolio"   # dedup pass root
//! targets = ["src/assets/portfolio", "public/images", "public/company.jpg"]
//!
//! [dedup]
//! extensions = ["jpg", "jpeg", "png", "webp", "gif"]
//!
//! [compress]
//! extensions = ["jpg", "jpeg", "png", "webp"]
//! max_dimension = 2400      # longest side, pixels; larger images shrink
//! min_savings_ratio = 0.98  # replace only if new size < 98% of original
//!
//! [compress.quality]
//! jpeg = 72
//! png = 80
//! webp = 68
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Relative paths resolve against the project root. Unknown keys are
//! rejected to catch typos early.

use crate::compress::CompressionPolicy;
use crate::imaging::{FormatPolicy, Quality};
use crate::walk::ExtensionFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "asset-press.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
///
/// All fields have defaults matching a typical site layout; a config file
/// only needs the values it wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where the passes look for images.
    pub paths: PathsConfig,
    /// Duplicate removal settings.
    pub dedup: DedupConfig,
    /// Recompression settings.
    pub compress: CompressConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.compress.quality;
        for (name, value) in [("jpeg", q.jpeg), ("png", q.png), ("webp", q.webp)] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "compress.quality.{name} must be 1-100"
                )));
            }
        }
        if self.compress.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "compress.max_dimension must be positive".into(),
            ));
        }
        let ratio = self.compress.min_savings_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::Validation(
                "compress.min_savings_ratio must be in (0, 1]".into(),
            ));
        }
        if self.dedup_filter().is_empty() {
            return Err(ConfigError::Validation(
                "dedup.extensions must not be empty".into(),
            ));
        }
        if self.compress_filter().is_empty() {
            return Err(ConfigError::Validation(
                "compress.extensions must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The format policy table for the compression engine.
    pub fn format_policy(&self) -> FormatPolicy {
        FormatPolicy {
            jpeg: Quality::new(self.compress.quality.jpeg),
            png: Quality::new(self.compress.quality.png),
            webp: Quality::new(self.compress.quality.webp),
            max_dimension: self.compress.max_dimension,
        }
    }

    /// Format policy plus the savings margin.
    pub fn compression_policy(&self) -> CompressionPolicy {
        CompressionPolicy {
            formats: self.format_policy(),
            min_savings_ratio: self.compress.min_savings_ratio,
        }
    }

    pub fn dedup_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.dedup.extensions)
    }

    pub fn compress_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.compress.extensions)
    }

    /// Root of the dedup pass, resolved against `project_root`.
    pub fn portfolio_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.portfolio)
    }

    /// Roots of the compress pass, resolved against `project_root`.
    pub fn target_roots(&self, project_root: &Path) -> Vec<PathBuf> {
        self.paths
            .targets
            .iter()
            .map(|t| project_root.join(t))
            .collect()
    }

    /// Roots of the compress pass: `overrides` when given, otherwise the
    /// configured targets. Both resolve against `project_root`.
    pub fn compress_roots(&self, project_root: &Path, overrides: &[PathBuf]) -> Vec<PathBuf> {
        if overrides.is_empty() {
            return self.target_roots(project_root);
        }
        overrides.iter().map(|p| project_root.join(p)).collect()
    }
}

/// Input locations, relative to the project root (absolute paths also work).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory scanned for duplicates.
    pub portfolio: String,
    /// Directories and single files recompressed.
    pub targets: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            portfolio: "src/assets/portfolio".to_string(),
            targets: vec![
                "src/assets/portfolio".to_string(),
                "public/images".to_string(),
                "public/company.jpg".to_string(),
            ],
        }
    }
}

/// Duplicate removal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DedupConfig {
    /// File extensions considered (case-insensitive, leading dot optional).
    pub extensions: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp", "gif"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Recompression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// File extensions recompressed (case-insensitive, leading dot optional).
    pub extensions: Vec<String>,
    /// Longest side in pixels; larger images are scaled down to fit.
    pub max_dimension: u32,
    /// A re-encode replaces the original only when
    /// `new_size < original_size * min_savings_ratio`.
    pub min_savings_ratio: f64,
    /// Encoder quality per format.
    pub quality: QualityConfig,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp"].map(String::from).to_vec(),
            max_dimension: 2400,
            min_savings_ratio: 0.98,
            quality: QualityConfig::default(),
        }
    }
}

/// Encoder quality per output format (1 = worst, 100 = best).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub jpeg: u32,
    pub png: u32,
    pub webp: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            jpeg: 72,
            png: 80,
            webp: 68,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel hashing / encoding workers.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   `extensions` array in a user file replaces the stock list.
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

/// Load the config file from `project_root` as a raw TOML value.
///
/// Returns `Ok(None)` if there is no config file.
pub fn load_raw_config(project_root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = project_root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a project: stock defaults, overridden by the project's
/// config file when it exists, then validated.
pub fn load_config(project_root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(project_root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-press configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Relative paths resolve against the project root (--root, default ".").

# ---------------------------------------------------------------------------
# Inputs
# ---------------------------------------------------------------------------
[paths]
# Directory scanned for byte-identical duplicates (dedup pass).
portfolio = "src/assets/portfolio"

# Directories and single files recompressed in place (compress pass).
targets = ["src/assets/portfolio", "public/images", "public/company.jpg"]

# ---------------------------------------------------------------------------
# Duplicate removal
# ---------------------------------------------------------------------------
[dedup]
# Extensions considered, case-insensitive.
extensions = ["jpg", "jpeg", "png", "webp", "gif"]

# ---------------------------------------------------------------------------
# Recompression
# ---------------------------------------------------------------------------
[compress]
# Extensions recompressed, case-insensitive. Anything that is not png or
# webp is written back as JPEG.
extensions = ["jpg", "jpeg", "png", "webp"]

# Longest side in pixels. Larger images are scaled down to fit, keeping
# their aspect ratio. Smaller images are never enlarged.
max_dimension = 2400

# Replace a file only if the re-encode is below this fraction of the
# original size (0.98 = at least 2% smaller).
min_savings_ratio = 0.98

[compress.quality]
# Encoder quality, 1 (worst) to 100 (best). For png this is the palette
# quantization target; the lossless encoding is kept when it is smaller.
jpeg = 72
png = 80
webp = 68

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel hashing / encoding workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
