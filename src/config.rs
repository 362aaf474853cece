use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ids: IdConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Human readable prefixes for bech32 encoded ids
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IdConfig {
    pub draft_prefix: String,
    pub order_prefix: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            draft_prefix: "draft_".into(),
            order_prefix: "order_".into(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/sales.db"

[ids]
draft_prefix = "draft_"
order_prefix = "order_"
"#;

/// Load configuration from `path`, falling back to the embedded default when
/// no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}
