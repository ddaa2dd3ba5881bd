//! Session statistics.

use std::time::Duration;

use data_logger::{SessionStatus, SinkMetricsSnapshot, SourceMetricsSnapshot};
use observability::MetricsSummary;

/// Statistics from one logging session
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// How the session ended
    pub status: SessionStatus,

    /// Ticks dispatched
    pub ticks: u64,

    /// Ticks that overran the next deadline
    pub late_ticks: u64,

    /// Wall time including source and sink setup
    pub duration: Duration,

    /// Number of configured sources
    pub active_sources: usize,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Aggregated tick outcomes
    pub tick_metrics: MetricsSummary,

    /// Per-source counters, in declaration order
    pub source_metrics: Vec<(String, SourceMetricsSnapshot)>,

    /// Per-sink counters, in declaration order
    pub sink_metrics: Vec<(String, SinkMetricsSnapshot)>,
}

impl PipelineStats {
    /// Ticks per second over the whole run
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");

        println!("Overview");
        println!("   Status: {}", self.status.as_str());
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Ticks: {} ({} late)", self.ticks, self.late_ticks);
        println!("   Tick rate: {:.2}/s", self.tick_rate());
        println!("   Sources: {}", self.active_sources);
        println!("   Sinks: {}", self.active_sinks);

        if !self.source_metrics.is_empty() {
            println!("\nSources");
            for (name, m) in &self.source_metrics {
                println!(
                    "   {name}: {} reads, {} empty, {} failed",
                    m.read_count, m.empty_count, m.failure_count
                );
            }
        }

        if !self.sink_metrics.is_empty() {
            println!("\nSinks");
            for (name, m) in &self.sink_metrics {
                println!(
                    "   {name}: {} rows, {} failed ({} shape mismatches)",
                    m.write_count, m.failure_count, m.shape_mismatch_count
                );
            }
        }

        println!("\n{}", self.tick_metrics);
    }
}
