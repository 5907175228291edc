// Configuration merging with priority

use super::loader::{AnalysisConfig, EstimatorConfig, RatesConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partial configuration for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub rates: Option<PartialRatesConfig>,
    #[serde(default)]
    pub server: Option<PartialServerConfig>,
    #[serde(default)]
    pub analysis: Option<PartialAnalysisConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialRatesConfig {
    pub default_rate: Option<f64>,
    /// Entries are added to, or replace, the lower layer's table
    pub table: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialServerConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub cors_origins: Option<Vec<String>>,
    pub max_conversations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialAnalysisConfig {
    pub parallel_threshold: Option<usize>,
}

/// Configuration merger
/// Priority order: CLI -> File -> Global -> Defaults
pub struct ConfigMerger {
    defaults: EstimatorConfig,
    global: Option<PartialConfig>,
    file: Option<PartialConfig>,
    cli: Option<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: EstimatorConfig::default(),
            global: None,
            file: None,
            cli: None,
        }
    }

    /// Set global config
    pub fn with_global(mut self, config: Option<PartialConfig>) -> Self {
        self.global = config;
        self
    }

    /// Set the config file passed with `--config`
    pub fn with_file(mut self, config: Option<PartialConfig>) -> Self {
        self.file = config;
        self
    }

    /// Set CLI overrides
    pub fn with_cli(mut self, config: Option<PartialConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all configs with priority
    pub fn merge(&self) -> EstimatorConfig {
        [&self.global, &self.file, &self.cli]
            .into_iter()
            .flatten()
            .fold(self.defaults.clone(), |base, partial| {
                self.merge_partial(&base, partial)
            })
    }

    /// Merge partial config into full config
    fn merge_partial(&self, base: &EstimatorConfig, partial: &PartialConfig) -> EstimatorConfig {
        EstimatorConfig {
            rates: partial
                .rates
                .as_ref()
                .map(|p| self.merge_partial_rates(&base.rates, p))
                .unwrap_or_else(|| base.rates.clone()),
            server: partial
                .server
                .as_ref()
                .map(|p| self.merge_partial_server(&base.server, p))
                .unwrap_or_else(|| base.server.clone()),
            analysis: partial
                .analysis
                .as_ref()
                .map(|p| self.merge_partial_analysis(&base.analysis, p))
                .unwrap_or_else(|| base.analysis.clone()),
        }
    }

    fn merge_partial_rates(&self, base: &RatesConfig, partial: &PartialRatesConfig) -> RatesConfig {
        let mut table = base.table.clone();
        if let Some(ref overrides) = partial.table {
            table.extend(overrides.iter().map(|(role, rate)| (role.clone(), *rate)));
        }

        RatesConfig {
            default_rate: partial.default_rate.unwrap_or(base.default_rate),
            table,
        }
    }

    fn merge_partial_server(
        &self,
        base: &ServerConfig,
        partial: &PartialServerConfig,
    ) -> ServerConfig {
        ServerConfig {
            port: partial.port.unwrap_or(base.port),
            bind: partial.bind.clone().unwrap_or_else(|| base.bind.clone()),
            cors_origins: partial
                .cors_origins
                .clone()
                .unwrap_or_else(|| base.cors_origins.clone()),
            max_conversations: partial.max_conversations.unwrap_or(base.max_conversations),
        }
    }

    fn merge_partial_analysis(
        &self,
        base: &AnalysisConfig,
        partial: &PartialAnalysisConfig,
    ) -> AnalysisConfig {
        AnalysisConfig {
            parallel_threshold: partial
                .parallel_threshold
                .unwrap_or(base.parallel_threshold),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}
