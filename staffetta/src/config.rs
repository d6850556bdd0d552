//! Top-level configuration

use std::path::Path;

use serde::Deserialize;
use staffetta_delivery::{ProcessorConfig, TransportConfig};
use staffetta_health::HealthConfig;
use staffetta_store::StoreConfig;

/// Environment variable naming an alternative config file path.
const CONFIG_PATH_VAR: &str = "STAFFETTA_CONFIG";

/// Environment variable carrying the provider API key.
///
/// Secrets stay out of the config file; the environment always wins.
const API_KEY_VAR: &str = "STAFFETTA_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "./staffetta.config.toml";

/// Whole-process configuration, one section per component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub processor: ProcessorConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

impl Config {
    /// Load configuration from the TOML file, then apply environment
    /// overrides. A missing file yields pure defaults, so a bare binary
    /// still starts (and reports its missing credentials through the
    /// health surface instead of crashing).
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            toml::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            tracing::warn!(path, "No config file found, using defaults");
            Self::default()
        };

        if let Ok(api_key) = std::env::var(API_KEY_VAR) {
            config.transport.api_key = api_key;
        }

        Ok(config)
    }
}
