//! Error types for the CLI.

use std::path::PathBuf;

use thiserror::Error;
use tyrpc::{DefinitionError, SchemaError};
use tyrpc_codegen::CodegenError;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error loading the app definition.
    #[error("Failed to load definition: {0}")]
    Load(#[from] LoadError),

    /// Error during client generation.
    #[error("Failed to generate client: {0}")]
    Codegen(#[from] CodegenError),

    /// One or more generators failed; each was reported already.
    #[error("{failed} of {total} generator(s) failed")]
    Generators { failed: usize, total: usize },

    /// A precondition of the command was not met.
    #[error("{0}")]
    Usage(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the error means the definition itself is invalid.
    pub fn is_invalid_definition(&self) -> bool {
        matches!(
            self,
            CliError::Load(LoadError::Parse { .. } | LoadError::Invalid { .. })
        )
    }
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax or shape.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error loading an app definition file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Definition file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed definition.
    #[error("Invalid definition in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// The definition parsed but cannot drive a generator.
    #[error("Invalid definition in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_definition_classification() {
        let err = CliError::Load(LoadError::Invalid {
            path: PathBuf::from("app.json"),
            source: DefinitionError::ModelNotObject {
                name: "User".to_string(),
                form: "enum".to_string(),
            },
        });
        assert!(err.is_invalid_definition());

        let err = CliError::Load(LoadError::NotFound {
            path: PathBuf::from("app.json"),
        });
        assert!(!err.is_invalid_definition());
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::invalid_value("generators[0].client_name", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'generators[0].client_name': must not be empty"
        );
    }
}
