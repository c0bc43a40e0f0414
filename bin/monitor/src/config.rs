use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 RPC endpoint url
    pub l1_rpc_url: String,

    /// L2 RPC endpoint url
    pub l2_rpc_url: String,

    /// Listen address for the metrics exporter
    #[serde(default = "default_metrics_listen")]
    pub metrics_listen: String,

    /// Seconds between metrics snapshot cycles
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
}

fn default_metrics_listen() -> String {
    "0.0.0.0:7300".to_string()
}

const fn default_snapshot_interval_secs() -> u64 {
    30
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let config: Config = toml::from_str(
            r#"
            l1_rpc_url = "http://localhost:8545"
            l2_rpc_url = "http://localhost:9545"
            "#,
        )
        .unwrap();

        assert_eq!(config.metrics_listen, "0.0.0.0:7300");
        assert_eq!(config.snapshot_interval_secs, 30);
    }
}
