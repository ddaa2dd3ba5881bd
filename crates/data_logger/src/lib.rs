//! # Data Logger
//!
//! Orchestration core: polls named sources on a fixed schedule, merges their values into one row
//! per sink and writes each row with per-sink failure isolation.
//!
//! - [`resolver`]: collision-free column names per (source, sink), computed once
//! - [`Scheduler`]: drift-compensated ticks with optional duration and cooperative cancellation
//! - [`DataLogger`]: ties both together; built with [`DataLoggerBuilder`]
//!
//! ## Usage
//! ```ignore
//! let logger = DataLogger::builder()
//!     .source("Sou1", source)
//!     .sink("OutA", sink)
//!     .rename_rules(rules)
//!     .build()?;
//! let report = logger.run(interval, Some(duration), cancel).await?;
//! ```

pub mod error;
pub mod logger;
pub mod metrics;
pub mod resolver;
pub mod scheduler;

pub use error::LoggerError;
pub use logger::{
    DataLogger, DataLoggerBuilder, TickObserver, DEFAULT_PREFIX_DELIMITER, TIMESTAMP_FORMAT,
};
pub use metrics::{SinkMetrics, SinkMetricsSnapshot, SourceMetrics, SourceMetricsSnapshot};
pub use resolver::{resolve, ResolvedMapping, SinkLayout, SinkNames, SourceNames};
pub use scheduler::{Scheduler, SessionReport, SessionStatus, TickControl, TickInfo};
pub use tokio_util::sync::CancellationToken;
