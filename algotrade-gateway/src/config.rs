//! Gateway configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Endpoint must be a ws:// or wss:// URL: {0}")]
    InvalidEndpoint(String),
    #[error("Team secret must not be empty")]
    MissingSecret,
}

/// Connection settings for one exchange session.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Websocket endpoint, e.g. `ws://192.168.100.10:9001/trade`.
    pub endpoint: String,
    /// Authentication secret, sent as the `team_secret` query parameter.
    pub team_secret: String,
    /// Per-command resolution deadline in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_command_timeout_secs() -> u64 {
    3
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>, team_secret: impl Into<String>) -> Self {
        GatewayConfig {
            endpoint: endpoint.into(),
            team_secret: team_secret.into(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }
        if self.team_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(())
    }
}

/// Load gateway configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = serde_json::from_str(json)?;
    Ok(config)
}
