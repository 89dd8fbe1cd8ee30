//! Configuration error types.

use palisade_core::PathError;
use thiserror::Error;

/// Errors that can occur while resolving configuration.
///
/// These surface synchronously from pipeline construction or
/// reconfiguration; they never reach a handler callback.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Missing required field.
    #[error("missing required configuration field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// A dotted path option could not be parsed.
    #[error("invalid path for {field}: {source}")]
    InvalidPath {
        /// The option holding the path.
        field: String,
        /// Underlying parse error.
        #[source]
        source: PathError,
    },

    /// Unsupported configuration text format.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid path error.
    pub fn invalid_path(field: impl Into<String>, source: PathError) -> Self {
        Self::InvalidPath {
            field: field.into(),
            source,
        }
    }

    /// Returns the field name for missing-field errors.
    #[must_use]
    pub fn missing(&self) -> Option<&str> {
        match self {
            Self::MissingField { field } => Some(field),
            _ => None,
        }
    }
}
