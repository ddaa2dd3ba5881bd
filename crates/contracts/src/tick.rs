//! TickOutcome - diagnostic record of one dispatched tick
//!
//! Produced by the logger after every tick and consumed by observability. Not persisted.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a sink write for one tick was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFailureKind {
    /// Row disagreed with the sink's fixed header
    ShapeMismatch,
    /// Any other write error
    Write,
}

impl SinkFailureKind {
    /// Label used in metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShapeMismatch => "shape_mismatch",
            Self::Write => "write",
        }
    }
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Monotonic tick counter of the logger (1-based)
    pub tick: u64,

    /// Time spent reading sources and dispatching rows
    pub duration: Duration,

    /// How far behind its grid deadline the tick started
    pub lateness: Duration,

    /// Sources whose read failed this tick
    pub failed_sources: Vec<String>,

    /// Sinks that accepted their row
    pub written_sinks: Vec<String>,

    /// Sinks whose write was skipped, with the reason
    pub failed_sinks: Vec<(String, SinkFailureKind)>,
}

impl TickOutcome {
    /// Whether every source read and every sink write succeeded
    pub fn is_clean(&self) -> bool {
        self.failed_sources.is_empty() && self.failed_sinks.is_empty()
    }
}
