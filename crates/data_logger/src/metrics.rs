//! Per-sink and per-source counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Rows accepted
    write_count: AtomicU64,
    /// Writes that failed for any reason other than shape
    failure_count: AtomicU64,
    /// Rows rejected because they disagreed with the header
    shape_mismatch_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn shape_mismatch_count(&self) -> u64 {
        self.shape_mismatch_count.load(Ordering::Relaxed)
    }

    pub fn inc_shape_mismatch_count(&self) {
        self.shape_mismatch_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            shape_mismatch_count: self.shape_mismatch_count(),
        }
    }
}

/// Snapshot of sink counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkMetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
    pub shape_mismatch_count: u64,
}

/// Counters for a single source
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Reads that returned at least one value
    read_count: AtomicU64,
    /// Reads that returned nothing
    empty_count: AtomicU64,
    /// Reads that failed
    failure_count: AtomicU64,
}

impl SourceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    pub fn inc_read_count(&self) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn empty_count(&self) -> u64 {
        self.empty_count.load(Ordering::Relaxed)
    }

    pub fn inc_empty_count(&self) {
        self.empty_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            read_count: self.read_count(),
            empty_count: self.empty_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of source counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMetricsSnapshot {
    pub read_count: u64,
    pub empty_count: u64,
    pub failure_count: u64,
}
