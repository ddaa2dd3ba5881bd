//! Tick metrics
//!
//! Records every [`TickOutcome`] through the `metrics` facade and aggregates them in memory for
//! end-of-session summaries.

use std::collections::BTreeMap;
use std::fmt;

use contracts::TickOutcome;
use metrics::{counter, gauge, histogram};

/// Record metrics from one TickOutcome
///
/// # Example
///
/// ```ignore
/// let logger = DataLogger::builder()
///     .on_tick(|outcome| observability::metrics::record_tick_metrics(outcome))
///     .build()?;
/// ```
pub fn record_tick_metrics(outcome: &TickOutcome) {
    counter!("daq_logger_ticks_total").increment(1);
    gauge!("daq_logger_last_tick").set(outcome.tick as f64);

    histogram!("daq_logger_tick_duration_ms").record(outcome.duration.as_secs_f64() * 1000.0);
    histogram!("daq_logger_tick_lateness_ms").record(outcome.lateness.as_secs_f64() * 1000.0);

    for sink in &outcome.written_sinks {
        counter!("daq_logger_sink_writes_total", "sink" => sink.clone()).increment(1);
    }

    for (sink, kind) in &outcome.failed_sinks {
        counter!(
            "daq_logger_sink_failures_total",
            "sink" => sink.clone(),
            "kind" => kind.as_str()
        )
        .increment(1);
    }

    for source in &outcome.failed_sources {
        counter!("daq_logger_source_failures_total", "source" => source.clone()).increment(1);
    }
}

/// Record the end of a session
pub fn record_session_finished(status: &str, ticks: u64) {
    counter!("daq_logger_sessions_total", "status" => status.to_string()).increment(1);
    gauge!("daq_logger_session_ticks").set(ticks as f64);
}

/// In-memory tick aggregator
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    /// Ticks seen
    pub total_ticks: u64,

    /// Ticks where every read and write succeeded
    pub clean_ticks: u64,

    /// Tick duration statistics (ms)
    pub duration_stats: RunningStats,

    /// Tick lateness statistics (ms)
    pub lateness_stats: RunningStats,

    /// Failed reads per source
    pub source_failures: BTreeMap<String, u64>,

    /// Skipped writes per sink
    pub sink_failures: BTreeMap<String, u64>,
}

impl TickMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics
    pub fn update(&mut self, outcome: &TickOutcome) {
        self.total_ticks += 1;
        if outcome.is_clean() {
            self.clean_ticks += 1;
        }

        self.duration_stats
            .push(outcome.duration.as_secs_f64() * 1000.0);
        self.lateness_stats
            .push(outcome.lateness.as_secs_f64() * 1000.0);

        for source in &outcome.failed_sources {
            *self.source_failures.entry(source.clone()).or_insert(0) += 1;
        }
        for (sink, _) in &outcome.failed_sinks {
            *self.sink_failures.entry(sink.clone()).or_insert(0) += 1;
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            clean_ticks: self.clean_ticks,
            clean_rate: if self.total_ticks > 0 {
                self.clean_ticks as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            tick_duration_ms: StatsSummary::from(&self.duration_stats),
            tick_lateness_ms: StatsSummary::from(&self.lateness_stats),
            source_failures: self.source_failures.clone(),
            sink_failures: self.sink_failures.clone(),
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub clean_ticks: u64,
    pub clean_rate: f64,
    pub tick_duration_ms: StatsSummary,
    pub tick_lateness_ms: StatsSummary,
    pub source_failures: BTreeMap<String, u64>,
    pub sink_failures: BTreeMap<String, u64>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Tick Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Clean ticks: {} ({:.2}%)",
            self.clean_ticks, self.clean_rate
        )?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;
        writeln!(f, "Tick lateness (ms): {}", self.tick_lateness_ms)?;

        if !self.source_failures.is_empty() {
            writeln!(f, "Source failures:")?;
            for (source, count) in &self.source_failures {
                writeln!(f, "  {source}: {count}")?;
            }
        }
        if !self.sink_failures.is_empty() {
            writeln!(f, "Sink failures:")?;
            for (sink, count) in &self.sink_failures {
                writeln!(f, "  {sink}: {count}")?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkFailureKind;
    use std::time::Duration;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TickMetricsAggregator::new();

        aggregator.update(&TickOutcome {
            tick: 1,
            duration: Duration::from_millis(3),
            written_sinks: vec!["csv".into()],
            ..Default::default()
        });
        aggregator.update(&TickOutcome {
            tick: 2,
            duration: Duration::from_millis(5),
            failed_sources: vec!["plc".into()],
            failed_sinks: vec![("csv".into(), SinkFailureKind::ShapeMismatch)],
            ..Default::default()
        });

        assert_eq!(aggregator.total_ticks, 2);
        assert_eq!(aggregator.clean_ticks, 1);
        assert_eq!(aggregator.source_failures.get("plc"), Some(&1));
        assert_eq!(aggregator.sink_failures.get("csv"), Some(&1));
        assert!((aggregator.duration_stats.mean() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = TickMetricsAggregator::new();
        for tick in 1..=4 {
            aggregator.update(&TickOutcome {
                tick,
                ..Default::default()
            });
        }

        let output = aggregator.summary().to_string();
        assert!(output.contains("Total ticks: 4"));
        assert!(output.contains("100.00%"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_tick_metrics(&TickOutcome::default());
        record_session_finished("completed", 0);
    }
}
