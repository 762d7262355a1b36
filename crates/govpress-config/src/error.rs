//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("configuration file unreadable")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Configuration file was not valid TOML for the expected schema.
    #[error("configuration file invalid")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Source TOML error.
        source: toml::de::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
