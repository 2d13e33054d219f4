use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level Telemine configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemineConfig {
    /// I/O settings.
    #[serde(default)]
    pub io: IoToml,

    /// Wavelet engine settings.
    #[serde(default)]
    pub wavelet: WaveletToml,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchToml,

    /// Detection rules, in evaluation order. Entries stay untyped here so
    /// that a malformed rule is reported on its own at dispatch.
    #[serde(default, rename = "rule")]
    pub rules: Vec<serde_json::Value>,
}

impl TelemineConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    /// Channels to load; all when absent.
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            time_column: default_time_column(),
            channels: None,
            delimiter: default_delimiter(),
            compression: default_compression(),
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_time_column() -> String {
    telemine_events::DEFAULT_TIME_COLUMN.to_string()
}
fn default_delimiter() -> String {
    ",".to_string()
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveletToml {
    /// Build the wavelet engine for energy change-point rules.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_level")]
    pub level: Option<usize>,
    /// Decompose to the deepest level the series supports; overrides `level`.
    #[serde(default)]
    pub max_level: bool,
    #[serde(default)]
    pub energy_window: Option<usize>,
}

impl Default for WaveletToml {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: default_filter(),
            level: default_level(),
            max_level: false,
            energy_window: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "db4".to_string()
}
fn default_level() -> Option<usize> {
    Some(4)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchToml {
    #[serde(default)]
    pub parallel: bool,
}
