//! DataLogger - the orchestrator
//!
//! Owns named sources and sinks, resolves their names once at build time, and on every tick reads
//! all sources, assembles one row per sink and dispatches it. Failures are isolated per source and
//! per sink; they never end a session.

use std::collections::HashSet;
use std::future::ready;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    ContractError, DataSink, DataSource, Reading, RenameRules, Row, SessionConfig,
    SinkFailureKind, TickOutcome, Value,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::LoggerError;
use crate::metrics::{SinkMetrics, SinkMetricsSnapshot, SourceMetrics, SourceMetricsSnapshot};
use crate::resolver::{resolve, ResolvedMapping, SinkLayout, SinkNames, SourceNames};
use crate::scheduler::{Scheduler, SessionReport, TickControl, TickInfo};

/// Format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default delimiter of the prefixing fallback
pub const DEFAULT_PREFIX_DELIMITER: &str = "_";

/// Callback invoked with the outcome of every tick
pub type TickObserver = Arc<dyn Fn(&TickOutcome) + Send + Sync>;

struct SourceEntry {
    name: String,
    source: Arc<dyn DataSource>,
    metrics: SourceMetrics,
}

struct SinkEntry {
    name: String,
    sink: Arc<dyn DataSink>,
    metrics: SinkMetrics,
}

/// Builder for creating a DataLogger
pub struct DataLoggerBuilder {
    sources: Vec<(String, Arc<dyn DataSource>)>,
    sinks: Vec<(String, Arc<dyn DataSink>)>,
    rules: RenameRules,
    delimiter: String,
    observer: Option<TickObserver>,
}

impl Default for DataLoggerBuilder {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            sinks: Vec::new(),
            rules: RenameRules::new(),
            delimiter: DEFAULT_PREFIX_DELIMITER.to_string(),
            observer: None,
        }
    }
}

impl DataLoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named source (declaration order is row order)
    pub fn source(mut self, name: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        self.sources.push((name.into(), source));
        self
    }

    /// Add a named sink
    pub fn sink(mut self, name: impl Into<String>, sink: Arc<dyn DataSink>) -> Self {
        self.sinks.push((name.into(), sink));
        self
    }

    pub fn rename_rules(mut self, rules: RenameRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn prefix_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Call `observer` after every tick
    pub fn on_tick<F>(mut self, observer: F) -> Self
    where
        F: Fn(&TickOutcome) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Validate, resolve names and establish the headers of header-bound sinks
    ///
    /// # Errors
    /// Any [`LoggerError`] other than `InvalidSession`; nothing has been written when this fails,
    /// except headers of sinks established before a later sink's header failed.
    #[instrument(
        name = "data_logger_build",
        skip(self),
        fields(sources = self.sources.len(), sinks = self.sinks.len())
    )]
    pub fn build(self) -> Result<DataLogger, LoggerError> {
        self.validate()?;

        let source_names: Vec<SourceNames<'_>> = self
            .sources
            .iter()
            .map(|(name, source)| SourceNames {
                name,
                variables: source.variable_names(),
            })
            .collect();
        let sink_names: Vec<SinkNames<'_>> = self
            .sinks
            .iter()
            .map(|(name, sink)| SinkNames {
                name,
                timestamp_key: sink.needs_timestamp().then(|| sink.timestamp_key()),
            })
            .collect();
        let resolved = resolve(&source_names, &sink_names, &self.rules, &self.delimiter)?;

        for ((name, sink), layout) in self.sinks.iter().zip(resolved.layouts()) {
            if layout.is_prefixed() {
                info!(sink = %name, "Variables prefixed with their source name");
            }
            if sink.requires_header() {
                let header = layout.header();
                debug!(sink = %name, columns = header.len(), "Establishing header");
                sink.establish_header(header)?;
            }
        }

        info!("Data logger initialised");
        Ok(DataLogger {
            sources: self
                .sources
                .into_iter()
                .map(|(name, source)| SourceEntry {
                    name,
                    source,
                    metrics: SourceMetrics::new(),
                })
                .collect(),
            sinks: self
                .sinks
                .into_iter()
                .map(|(name, sink)| SinkEntry {
                    name,
                    sink,
                    metrics: SinkMetrics::new(),
                })
                .collect(),
            resolved,
            observer: self.observer,
            tick_count: AtomicU64::new(0),
        })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.delimiter.is_empty() {
            return Err(LoggerError::configuration("prefix delimiter must not be empty"));
        }

        let source_names = unique_names("source", self.sources.iter().map(|(n, _)| n))?;
        let sink_names = unique_names("sink", self.sinks.iter().map(|(n, _)| n))?;

        for (name, source) in &self.sources {
            let mut seen = HashSet::new();
            if let Some(dup) = source.variable_names().iter().find(|v| !seen.insert(*v)) {
                return Err(LoggerError::configuration(format!(
                    "source '{name}' declares variable '{dup}' twice"
                )));
            }
        }

        for (source, sink) in self.rules.pairs() {
            if !source_names.contains(source) {
                return Err(LoggerError::UnknownRenameTarget {
                    kind: "source",
                    name: source.to_string(),
                });
            }
            if !sink_names.contains(sink) {
                return Err(LoggerError::UnknownRenameTarget {
                    kind: "sink",
                    name: sink.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<HashSet<&'a str>, LoggerError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(LoggerError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(seen)
}

/// Time-triggered data logger
pub struct DataLogger {
    sources: Vec<SourceEntry>,
    sinks: Vec<SinkEntry>,
    resolved: ResolvedMapping,
    observer: Option<TickObserver>,
    tick_count: AtomicU64,
}

impl DataLogger {
    pub fn builder() -> DataLoggerBuilder {
        DataLoggerBuilder::new()
    }

    /// Resolved names, computed at build time
    pub fn resolved(&self) -> &ResolvedMapping {
        &self.resolved
    }

    /// Row layout (header) of every sink, in sink order
    pub fn headers(&self) -> Vec<(String, Vec<String>)> {
        self.resolved
            .layouts()
            .iter()
            .map(|layout| (layout.sink().to_string(), layout.header()))
            .collect()
    }

    /// Ticks dispatched over the logger's lifetime
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    /// Get counters for all sinks
    pub fn sink_metrics(&self) -> Vec<(String, SinkMetricsSnapshot)> {
        self.sinks
            .iter()
            .map(|s| (s.name.clone(), s.metrics.snapshot()))
            .collect()
    }

    /// Get counters for all sources
    pub fn source_metrics(&self) -> Vec<(String, SourceMetricsSnapshot)> {
        self.sources
            .iter()
            .map(|s| (s.name.clone(), s.metrics.snapshot()))
            .collect()
    }

    /// Run a session: tick every `interval` until `duration` elapses or `cancel` fires
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidSession`] before any tick for a zero interval or duration.
    #[instrument(name = "data_logger_run", skip(self, cancel))]
    pub async fn run(
        &self,
        interval: Duration,
        duration: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<SessionReport, LoggerError> {
        let scheduler = Scheduler::new(interval, duration)?.with_cancellation(cancel);

        let report = scheduler
            .run(|info| {
                self.tick(info);
                ready(TickControl::Continue)
            })
            .await;

        self.flush_sinks();
        Ok(report)
    }

    /// Run a session with timing taken from a [`SessionConfig`]
    pub async fn run_session(
        &self,
        session: &SessionConfig,
        cancel: CancellationToken,
    ) -> Result<SessionReport, LoggerError> {
        let interval = session.interval().map_err(session_error)?;
        let duration = session.duration().map_err(session_error)?;
        self.run(interval, duration, cancel).await
    }

    /// Run a session as a background task
    pub fn spawn(
        self: Arc<Self>,
        interval: Duration,
        duration: Option<Duration>,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<SessionReport, LoggerError>> {
        tokio::spawn(async move { self.run(interval, duration, cancel).await })
    }

    /// Read every source and dispatch one row to every sink, right now
    pub fn log_once(&self) -> TickOutcome {
        self.dispatch_tick(Duration::ZERO)
    }

    fn tick(&self, info: TickInfo) {
        debug!(tick = info.index, lateness_ms = info.lateness.as_millis() as u64, "Tick");
        self.dispatch_tick(info.lateness);
    }

    fn dispatch_tick(&self, lateness: Duration) -> TickOutcome {
        let started = Instant::now();
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

        let mut outcome = TickOutcome {
            tick,
            lateness,
            ..Default::default()
        };

        let readings: Vec<Option<Reading>> = self
            .sources
            .iter()
            .map(|entry| {
                Self::read_source(entry).unwrap_or_else(|e| {
                    warn!(source = %entry.name, error = %e, "Source unavailable this tick");
                    entry.metrics.inc_failure_count();
                    outcome.failed_sources.push(entry.name.clone());
                    None
                })
            })
            .collect();

        for (entry, layout) in self.sinks.iter().zip(self.resolved.layouts()) {
            let row = self.assemble_row(layout, &readings, &timestamp);
            match entry.sink.write(&row) {
                Ok(()) => {
                    entry.metrics.inc_write_count();
                    outcome.written_sinks.push(entry.name.clone());
                }
                Err(e) => {
                    let kind = if e.is_shape_mismatch() {
                        entry.metrics.inc_shape_mismatch_count();
                        SinkFailureKind::ShapeMismatch
                    } else {
                        entry.metrics.inc_failure_count();
                        SinkFailureKind::Write
                    };
                    error!(sink = %entry.name, tick, error = %e, "Sink write skipped");
                    outcome.failed_sinks.push((entry.name.clone(), kind));
                }
            }
        }

        outcome.duration = started.elapsed();
        info!(
            tick,
            sinks_written = outcome.written_sinks.len(),
            sinks_failed = outcome.failed_sinks.len(),
            "Logging count"
        );
        if let Some(observer) = &self.observer {
            observer(&outcome);
        }
        outcome
    }

    /// `Ok(None)` when the source returned nothing usable
    fn read_source(entry: &SourceEntry) -> Result<Option<Reading>, ContractError> {
        let reading = entry.source.read()?;
        if reading.is_empty() {
            debug!(source = %entry.name, "Source returned no values");
            entry.metrics.inc_empty_count();
            return Ok(None);
        }
        entry.metrics.inc_read_count();
        Ok(Some(reading))
    }

    fn assemble_row(
        &self,
        layout: &SinkLayout,
        readings: &[Option<Reading>],
        timestamp: &str,
    ) -> Row {
        let mut row = Row::with_capacity(layout.width());
        if let Some(key) = layout.timestamp_key() {
            row.push(key, Some(Value::from(timestamp)));
        }

        for (index, (entry, reading)) in self.sources.iter().zip(readings).enumerate() {
            let declared = entry.source.variable_names();
            for (variable, column) in declared.iter().zip(layout.names(index)) {
                let value = reading
                    .as_ref()
                    .and_then(|r| r.get(variable))
                    .cloned()
                    .flatten();
                row.push(column.clone(), value);
            }
        }
        row
    }

    fn flush_sinks(&self) {
        for entry in &self.sinks {
            if let Err(e) = entry.sink.flush() {
                warn!(sink = %entry.name, error = %e, "Flush failed");
            }
        }
    }
}

fn session_error(e: ContractError) -> LoggerError {
    LoggerError::invalid_session(e.to_string())
}
