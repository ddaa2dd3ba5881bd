//! Logger error types

use contracts::ContractError;
use thiserror::Error;

/// Errors raised while building a logger or starting a session.
///
/// Everything that can go wrong during a tick is isolated and logged instead.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Invalid logger setup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two sources (or two sinks) share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A rename rule points at a source or sink that does not exist
    #[error("rename rule references unknown {kind} '{name}'")]
    UnknownRenameTarget { kind: &'static str, name: String },

    /// A name still collides after whole-source prefixing
    #[error("sink '{sink}': column '{column}' is not unique even after prefixing")]
    UnresolvedCollision { sink: String, column: String },

    /// Non-positive or non-finite interval/duration
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Adapter error (e.g. establishing a header)
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
}

impl LoggerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::InvalidSession(message.into())
    }
}
