//! Scheduler - drift-compensated periodic ticks
//!
//! Deadlines sit on a fixed grid `T0, T0 + I, T0 + 2I, ...` anchored when the session starts.
//! A slow tick shortens the following sleep (or skips it with a warning); the grid itself never
//! moves. Cancellation is only observed between ticks.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::LoggerError;

/// Terminal state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Duration elapsed
    Completed,
    /// Cancelled externally or stopped by the tick callback
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Returned by the tick callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    /// End the session after this tick (reported as `Cancelled`)
    Stop,
}

/// Passed to the tick callback
#[derive(Debug, Clone, Copy)]
pub struct TickInfo {
    /// 1-based index within the session
    pub index: u64,
    /// Grid deadline of this tick
    pub deadline: Instant,
    /// How far behind its deadline the tick started
    pub lateness: Duration,
}

/// Result of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub status: SessionStatus,
    /// Ticks dispatched
    pub ticks: u64,
    /// Wall time from session start to exit
    pub elapsed: Duration,
    /// Ticks whose work overran the next deadline
    pub late_ticks: u64,
}

/// One-shot periodic scheduler
///
/// `run` consumes the scheduler: a finished session cannot be resumed.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    duration: Option<Duration>,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidSession`] for a zero interval or a zero duration.
    pub fn new(interval: Duration, duration: Option<Duration>) -> Result<Self, LoggerError> {
        if interval.is_zero() {
            return Err(LoggerError::invalid_session("interval must be > 0"));
        }
        if duration.is_some_and(|d| d.is_zero()) {
            return Err(LoggerError::invalid_session("duration must be > 0"));
        }

        Ok(Self {
            interval,
            duration,
            cancel: CancellationToken::new(),
        })
    }

    /// Observe `token` between ticks
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Run ticks until the duration elapses, the token is cancelled or `on_tick` stops
    ///
    /// The first tick runs immediately. With a duration `D`, the tick at deadline `d` only runs
    /// if its whole slot fits (`d + I <= T0 + D`), giving `floor(D / I)` ticks. A duration whose
    /// end lies beyond the clock's range is treated as unbounded; an interval whose next deadline
    /// lies beyond it leaves the session waiting for cancellation.
    pub async fn run<F, Fut>(self, mut on_tick: F) -> SessionReport
    where
        F: FnMut(TickInfo) -> Fut,
        Fut: Future<Output = TickControl>,
    {
        let start = Instant::now();
        let end = self.duration.and_then(|d| start.checked_add(d));
        let mut deadline = start;
        let mut ticks = 0u64;
        let mut late_ticks = 0u64;

        info!(
            interval_ms = self.interval.as_millis() as u64,
            duration_ms = self.duration.map(|d| d.as_millis() as u64),
            "Session started"
        );

        let status = loop {
            if self.cancel.is_cancelled() {
                break SessionStatus::Cancelled;
            }

            let now = Instant::now();
            if let Some(end) = end {
                let slot_end = deadline.checked_add(self.interval);
                if now >= end || slot_end.map_or(true, |next| next > end) {
                    break SessionStatus::Completed;
                }
            }

            ticks += 1;
            let info = TickInfo {
                index: ticks,
                deadline,
                lateness: now.saturating_duration_since(deadline),
            };
            if on_tick(info).await == TickControl::Stop {
                debug!(tick = ticks, "Tick requested stop");
                break SessionStatus::Cancelled;
            }

            let Some(next) = deadline.checked_add(self.interval) else {
                debug!(tick = ticks, "Next deadline out of clock range");
                self.cancel.cancelled().await;
                break SessionStatus::Cancelled;
            };
            deadline = next;
            let now = Instant::now();
            if deadline < now {
                late_ticks += 1;
                warn!(
                    tick = ticks,
                    behind_ms = (now - deadline).as_millis() as u64,
                    "Tick overran its slot, skipping sleep"
                );
                continue;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break SessionStatus::Cancelled,
                _ = tokio::time::sleep_until(deadline) => {}
            }
        };

        let report = SessionReport {
            status,
            ticks,
            elapsed: start.elapsed(),
            late_ticks,
        };
        info!(
            status = ?report.status,
            ticks = report.ticks,
            late_ticks = report.late_ticks,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Session finished"
        );
        report
    }
}
