// Configuration commands

use super::CommandResult;
use crate::config::EstimatorConfig;
use crate::models::ResourceAllocation;

/// Effective configuration the service is running with
pub async fn get_config(config: &EstimatorConfig) -> CommandResult<EstimatorConfig> {
    Ok(config.clone())
}

/// Rate table applied to every analysis
pub async fn get_rate_table(config: &EstimatorConfig) -> CommandResult<ResourceAllocation> {
    Ok(config.rates.to_allocation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_table_reflects_config() {
        let mut config = EstimatorConfig::default();
        config.rates.default_rate = 900.0;

        let rates = get_rate_table(&config).await.unwrap();
        assert_eq!(rates.default_rate, 900.0);
        assert_eq!(rates.rate_for("QA Engineer"), (600.0, false));
    }
}
