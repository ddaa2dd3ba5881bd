//! DataSink trait - persistence side of an adapter
//!
//! Defines the abstract interface for sinks and the write-once header used by tabular sinks.

use std::sync::OnceLock;

use crate::{ContractError, Row};

/// Column name used for the tick timestamp unless a sink overrides it
pub const DEFAULT_TIMESTAMP_KEY: &str = "Time";

/// Data output trait
///
/// All sink implementations must implement this trait.
pub trait DataSink: Send + Sync {
    /// Whether rows must carry the tick timestamp
    fn needs_timestamp(&self) -> bool;

    /// Reserved key of the timestamp column
    fn timestamp_key(&self) -> &str {
        DEFAULT_TIMESTAMP_KEY
    }

    /// Whether the sink persists a fixed physical header
    fn requires_header(&self) -> bool {
        false
    }

    /// Establish the fixed header (called once, before any row is written)
    ///
    /// # Errors
    /// Returns [`ContractError::HeaderAlreadyEstablished`] on a second call, or an I/O error.
    fn establish_header(&self, _columns: Vec<String>) -> Result<(), ContractError> {
        Ok(())
    }

    /// Write one row
    ///
    /// # Errors
    /// Returns [`ContractError::ShapeMismatch`] when the row disagrees with the established header
    /// (nothing is written), or a write error.
    fn write(&self, row: &Row) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    fn flush(&self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Header that can be set exactly once
#[derive(Debug, Default)]
pub struct FixedHeader {
    columns: OnceLock<Vec<String>>,
}

impl FixedHeader {
    /// Create an unset header
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header; fails if it is already set
    pub fn establish(&self, columns: Vec<String>) -> Result<&[String], ContractError> {
        let mut pending = Some(columns);
        let stored = self.columns.get_or_init(|| pending.take().unwrap_or_default());
        match pending {
            // get_or_init did not consume our columns: someone else won
            Some(_) => Err(ContractError::HeaderAlreadyEstablished {
                columns: stored.len(),
            }),
            None => Ok(stored),
        }
    }

    /// Header columns, if established
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.get().map(Vec::as_slice)
    }

    /// Check that `row` has exactly the header's keys, in header order
    pub fn check(&self, row: &Row) -> Result<&[String], ContractError> {
        let columns = self.columns().ok_or(ContractError::HeaderNotEstablished)?;

        if row.len() != columns.len() {
            return Err(ContractError::shape_mismatch(
                columns.len(),
                row.len(),
                "row width differs from header",
            ));
        }

        if let Some((expected, actual)) = columns
            .iter()
            .zip(row.keys())
            .find(|(expected, actual)| expected.as_str() != *actual)
        {
            return Err(ContractError::shape_mismatch(
                columns.len(),
                row.len(),
                format!("expected column '{expected}', found '{actual}'"),
            ));
        }

        Ok(columns)
    }
}
