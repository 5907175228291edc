// Layered TOML configuration: defaults, global file, --config file, CLI flags

pub mod loader;
pub mod merger;

pub use loader::{
    global_config_path, load_partial, load_partial_if_exists, save_config, write_default_config,
    AnalysisConfig, EstimatorConfig, RatesConfig, ServerConfig, CONFIG_FILE_NAME, DEFAULT_BIND,
    DEFAULT_PORT,
};
pub use merger::{
    ConfigMerger, PartialAnalysisConfig, PartialConfig, PartialRatesConfig, PartialServerConfig,
};

use anyhow::Result;
use std::path::Path;

/// Load and validate the effective configuration.
///
/// The global file is optional. An explicit `config_file` must exist.
pub fn load_merged_config(
    config_file: Option<&Path>,
    cli: Option<PartialConfig>,
) -> Result<EstimatorConfig> {
    let global = match global_config_path() {
        Some(path) => load_partial_if_exists(&path)?,
        None => None,
    };
    let file = config_file.map(load_partial).transpose()?;

    let config = ConfigMerger::new()
        .with_global(global)
        .with_file(file)
        .with_cli(cli)
        .merge();
    config.validate()?;

    log::debug!(
        "Loaded config: port={}, {} role rates, parallel_threshold={}",
        config.server.port,
        config.rates.table.len(),
        config.analysis.parallel_threshold
    );
    Ok(config)
}
