use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::validate::PageLimits;

pub const CONFIG_FILE_NAME: &str = "rentals.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RentalsConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub properties: PropertiesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_history_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "default_max_export_records")]
    pub max_export_records: usize,
    /// Change records a single property may accumulate.
    #[serde(default = "default_max_records_per_property")]
    pub max_records_per_property: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_history_page_size(),
            max_page_size: default_history_max_page_size(),
            max_export_records: default_max_export_records(),
            max_records_per_property: default_max_records_per_property(),
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub const fn page_limits(&self) -> PageLimits {
        PageLimits {
            default: self.default_page_size,
            max: self.max_page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertiesConfig {
    #[serde(default = "default_property_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_property_max_page_size")]
    pub max_page_size: usize,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_property_page_size(),
            max_page_size: default_property_max_page_size(),
        }
    }
}

impl PropertiesConfig {
    #[must_use]
    pub const fn page_limits(&self) -> PageLimits {
        PageLimits {
            default: self.default_page_size,
            max: self.max_page_size,
        }
    }
}

impl RentalsConfig {
    /// Reject limits that would make every request fail.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first inconsistent setting.
    pub fn check(&self) -> Result<()> {
        for (section, limits) in [
            ("history", self.history.page_limits()),
            ("properties", self.properties.page_limits()),
        ] {
            if limits.default == 0 || limits.max == 0 {
                bail!("[{section}] page sizes must be at least 1");
            }
            if limits.default > limits.max {
                bail!(
                    "[{section}] default_page_size ({}) exceeds max_page_size ({})",
                    limits.default,
                    limits.max
                );
            }
        }
        if self.history.max_export_records == 0 {
            bail!("[history] max_export_records must be at least 1");
        }
        if self.history.max_records_per_property == 0 {
            bail!("[history] max_records_per_property must be at least 1");
        }
        if self.server.bind.trim().is_empty() {
            bail!("[server] bind must not be empty");
        }
        Ok(())
    }
}

/// Parse and check one config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or fails [`RentalsConfig::check`].
pub fn load_config_file(path: &Path) -> Result<RentalsConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = toml::from_str::<RentalsConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .check()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(config)
}

/// Candidate locations, in lookup order: `rentals.toml` in `working_dir`,
/// then `<config_dir>/rentals/config.toml`.
#[must_use]
pub fn config_search_paths(working_dir: &Path) -> Vec<PathBuf> {
    let mut paths = vec![working_dir.join(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("rentals/config.toml"));
    }
    paths
}

/// Load the effective config and report where it came from.
///
/// An explicit path must exist. Otherwise the first existing search path
/// wins, and defaults apply when none exists.
///
/// # Errors
///
/// Returns an error for a missing explicit path or an unreadable or
/// invalid file.
pub fn load_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<(RentalsConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
        return Ok((load_config_file(path)?, Some(path.to_path_buf())));
    }

    for path in config_search_paths(working_dir) {
        if path.exists() {
            return Ok((load_config_file(&path)?, Some(path)));
        }
    }
    Ok((RentalsConfig::default(), None))
}

/// Bind address precedence: CLI flag, then `RENTALS_BIND`, then the file.
#[must_use]
pub fn resolve_bind(
    config: &RentalsConfig,
    env_bind: Option<String>,
    cli_bind: Option<String>,
) -> String {
    cli_bind
        .filter(|b| !b.trim().is_empty())
        .or_else(|| env_bind.filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| config.server.bind.clone())
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

const fn default_history_page_size() -> usize {
    50
}

const fn default_history_max_page_size() -> usize {
    200
}

const fn default_max_export_records() -> usize {
    10_000
}

const fn default_max_records_per_property() -> usize {
    10_000
}

const fn default_property_page_size() -> usize {
    20
}

const fn default_property_max_page_size() -> usize {
    100
}
