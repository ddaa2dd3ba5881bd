//! LogSink - logs each row via tracing

use std::collections::HashMap;

use contracts::params::param_or;
use contracts::{ContractError, DataSink, Row};
use tracing::{info, instrument};

/// Sink that logs rows for debugging
pub struct LogSink {
    name: String,
    timestamp: bool,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: true,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        Ok(Self {
            name: name.into(),
            timestamp: param_or(params, "timestamp", true)?,
        })
    }

    fn render(row: &Row) -> String {
        row.iter()
            .map(|(key, value)| match value {
                Some(v) => format!("{key}={v}"),
                None => format!("{key}=-"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl DataSink for LogSink {
    fn needs_timestamp(&self) -> bool {
        self.timestamp
    }

    #[instrument(name = "log_sink_write", skip(self, row), fields(sink = %self.name))]
    fn write(&self, row: &Row) -> Result<(), ContractError> {
        let present = row.present().count();
        info!(
            sink = %self.name,
            columns = row.len(),
            missing = row.len() - present,
            "{}",
            Self::render(row)
        );
        Ok(())
    }
}
