//! Configuration loading and management.

use crate::transport::MemberId;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Engine identity.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Metrics endpoint configuration.
    pub metrics: Option<MetricsConfig>,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Display name used in log output.
    #[serde(default = "default_engine_name")]
    pub name: String,
    /// The engine's own member id on the chat platform. Its reactions seed
    /// the vote counters and are excluded from tallies.
    #[serde(default)]
    pub member_id: MemberId,
}

fn default_engine_name() -> String {
    "suggestd".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            member_id: 0,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: String,
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Port for the Prometheus `/metrics` endpoint; 0 disables it.
    pub port: u16,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
