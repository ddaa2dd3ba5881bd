//! Layered error definitions
//!
//! Categorized by origin: config / source / sink / connection

use thiserror::Error;

/// Unified adapter-level error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Source could not deliver values this tick
    #[error("source unavailable: {message}")]
    SourceUnavailable { message: String },

    // ===== Sink Errors =====
    /// Row does not fit the sink's established header
    #[error("shape mismatch: expected {expected} columns, got {actual}: {message}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        message: String,
    },

    /// Header was already established and cannot change
    #[error("header already established with {columns} columns")]
    HeaderAlreadyEstablished { columns: usize },

    /// Write attempted before the header was established
    #[error("header not established")]
    HeaderNotEstablished,

    /// Sink write error
    #[error("sink write error: {message}")]
    SinkWrite { message: String },

    // ===== Connection Errors =====
    /// Connection to an underlying resource could not be established
    #[error("connection to '{target}' failed after {attempts} attempt(s): {message}")]
    Connection {
        target: String,
        attempts: u32,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source unavailable error
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create shape mismatch error
    pub fn shape_mismatch(expected: usize, actual: usize, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected,
            actual,
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(message: impl Into<String>) -> Self {
        Self::SinkWrite {
            message: message.into(),
        }
    }

    /// Whether the error is a row/header shape rejection
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}
