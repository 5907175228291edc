// Configuration types and TOML loading

use super::merger::PartialConfig;
use crate::conversation::DEFAULT_MAX_ENTRIES;
use crate::estimation::DEFAULT_PARALLEL_THRESHOLD;
use crate::models::ResourceAllocation;
use crate::utils::app_config_dir;
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_PORT: u16 = 3420;
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// `[rates]` section: hourly rate per role plus the fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesConfig {
    pub default_rate: f64,
    #[serde(default)]
    pub table: BTreeMap<String, f64>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        let allocation = ResourceAllocation::default();
        Self {
            default_rate: allocation.default_rate,
            table: allocation.rates,
        }
    }
}

impl RatesConfig {
    pub fn to_allocation(&self) -> ResourceAllocation {
        ResourceAllocation::new(self.table.clone(), self.default_rate)
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Conversations (and stored estimates) kept before the oldest is dropped
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

fn default_max_conversations() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
            max_conversations: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Task count at which per-task work runs on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EstimatorConfig {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        self.rates
            .to_allocation()
            .validate()
            .map_err(|e| anyhow!("Invalid [rates] section: {}", e))?;

        if self.analysis.parallel_threshold == 0 {
            bail!("Invalid [analysis] section: parallel_threshold must be at least 1");
        }
        if self.server.max_conversations == 0 {
            bail!("Invalid [server] section: max_conversations must be at least 1");
        }
        if self.server.bind.trim().is_empty() {
            bail!("Invalid [server] section: bind address must not be empty");
        }
        Ok(())
    }
}

/// Global config file path (`~/.project-estimator/config.toml`)
pub fn global_config_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Read a TOML file as a partial configuration.
///
/// Missing sections and keys stay unset so lower-priority layers show through.
pub fn load_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    toml::from_str(&contents)
        .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))
}

/// Like [`load_partial`], but a missing file is not an error
pub fn load_partial_if_exists(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        log::debug!("No config file at {}", path.display());
        return Ok(None);
    }
    load_partial(path).map(Some)
}

/// Write a full configuration as TOML, creating the parent directory
pub fn save_config(path: &Path, config: &EstimatorConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                anyhow!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
    fs::write(path, contents)
        .map_err(|e| anyhow!("Failed to write config file '{}': {}", path.display(), e))
}

/// Write the default configuration to `path`.
///
/// An existing file is left alone unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file '{}' already exists (use --force to overwrite)",
            path.display()
        );
    }
    save_config(path, &EstimatorConfig::default())?;
    log::info!("Wrote default configuration to {}", path.display());
    Ok(())
}
