use std::path::Path;

use serde_derive::Deserialize;

pub mod defaults;
pub mod error;
pub mod types;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use types::{bit_width, DebounceConfig, ScanConfig};

/// Configurations of the keyscanner firmware, read from `keyboard.toml`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KeyscannerTomlConfig {
    /// Debounce engine constants
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Scan timing
    #[serde(default)]
    pub scan: ScanConfig,
}

impl KeyscannerTomlConfig {
    /// Load and validate the configuration file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse and validate a configuration from a toml string. `origin` is only used in error messages
    pub fn from_toml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            path: origin.to_string(),
            message: e.message().to_string(),
        })?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}
