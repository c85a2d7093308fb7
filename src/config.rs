use serde::Deserialize;
use thiserror::Error;

/// Tunables for the Assignor (§6 "Configuration").
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AssignorConfig {
    /// Non-negative, typically 5 minutes; 0 disables the grace window.
    pub max_delay_millis: u64,
}

impl Default for AssignorConfig {
    fn default() -> Self {
        Self {
            max_delay_millis: 5 * 60 * 1000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl AssignorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }
}
