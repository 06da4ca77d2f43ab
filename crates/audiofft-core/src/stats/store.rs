//! Pipeline counters shared between the render thread and observers
//!
//! The render thread only ever increments relaxed atomics here. Readers take
//! a [`StatsSnapshot`] whenever they want a consistent-enough view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Sentinel for "no analysis yet"
const NEVER: i64 = i64::MIN;

/// Running counters for one engine
#[derive(Debug)]
pub struct PipelineStats {
    started_at: DateTime<Utc>,
    buffers_rendered: AtomicU64,
    buffers_analyzed: AtomicU64,
    buffers_skipped: AtomicU64,
    /// Admitted buffers shorter than the analysis window
    underruns: AtomicU64,
    events_emitted: AtomicU64,
    /// Events lost because the consumer fell behind
    events_dropped: AtomicU64,
    /// Events discarded because their session ended
    stale_events: AtomicU64,
    progress_emitted: AtomicU64,
    /// Milliseconds since the Unix epoch of the last analysis
    last_analysis_ms: AtomicI64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub buffers_rendered: u64,
    pub buffers_analyzed: u64,
    pub buffers_skipped: u64,
    pub underruns: u64,
    pub events_emitted: u64,
    pub events_dropped: u64,
    pub stale_events: u64,
    pub progress_emitted: u64,
    pub last_analysis_at: Option<DateTime<Utc>>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            buffers_rendered: AtomicU64::new(0),
            buffers_analyzed: AtomicU64::new(0),
            buffers_skipped: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            stale_events: AtomicU64::new(0),
            progress_emitted: AtomicU64::new(0),
            last_analysis_ms: AtomicI64::new(NEVER),
        }
    }

    pub fn record_rendered(&self) {
        self.buffers_rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an analyzed buffer, noting whether it had to be zero-padded
    pub fn record_analyzed(&self, underrun: bool) {
        self.buffers_analyzed.fetch_add(1, Ordering::Relaxed);
        if underrun {
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
        self.last_analysis_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.buffers_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event dropped on a full channel
    ///
    /// # Returns
    /// Total number of dropped events so far
    pub fn record_dropped(&self) -> u64 {
        self.events_dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_stale(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_progress(&self) {
        self.progress_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let now = Utc::now();
        let last_ms = self.last_analysis_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: (now - self.started_at).num_seconds().max(0) as u64,
            buffers_rendered: self.buffers_rendered.load(Ordering::Relaxed),
            buffers_analyzed: self.buffers_analyzed.load(Ordering::Relaxed),
            buffers_skipped: self.buffers_skipped.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            stale_events: self.stale_events.load(Ordering::Relaxed),
            progress_emitted: self.progress_emitted.load(Ordering::Relaxed),
            last_analysis_at: if last_ms == NEVER {
                None
            } else {
                DateTime::from_timestamp_millis(last_ms)
            },
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}
