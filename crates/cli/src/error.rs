//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid command-line override
    #[error("Invalid override --{flag}: {message}")]
    InvalidOverride { flag: &'static str, message: String },

    /// Source or sink could not be created
    #[error("Failed to create {kind} '{name}': {message}")]
    Adapter {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// Signal handler installation error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(flag: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            flag,
            message: message.into(),
        }
    }

    pub fn adapter(kind: &'static str, name: impl Into<String>, message: impl ToString) -> Self {
        Self::Adapter {
            kind,
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
