//! Error types for keyscanner-config

use std::fmt;

/// Unified error type for keyscanner-config
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// File I/O error
    FileRead { path: String, message: String },
    /// TOML parsing error
    TomlParse { path: String, message: String },
    /// Validation error with context
    Validation { field: String, message: String },
    /// Invalid value
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileRead { path, message } => {
                write!(f, "Failed to read config file '{}': {}", path, message)
            }
            ConfigError::TomlParse { path, message } => {
                write!(f, "Failed to parse '{}': {}", path, message)
            }
            ConfigError::Validation { field, message } => {
                write!(f, "Validation error in '{}': {}", field, message)
            }
            ConfigError::InvalidValue {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for '{}', expected: {}",
                    value, field, expected
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
