//! Outbound events and their delivery channel
//!
//! The render thread publishes through an [`EventSink`] with `try_send` on a
//! bounded crossbeam channel: when the consumer falls behind the newest event
//! is dropped and counted, the render thread never waits.
//!
//! Every event carries the session it was produced in. The engine bumps the
//! shared [`SessionCounter`] on load and stop, and [`EventStream`] silently
//! discards anything stamped with an older session.
//!
//! Consumers may hand analysis events back through [`EventStream::recycle`]
//! so the render thread can refill their vectors instead of allocating.

use super::pipeline::AnalysisResult;
use crate::stats::PipelineStats;
use crossbeam_channel::{
    Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Spectrum, bands and loudness of one analyzed buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEvent {
    pub raw_magnitudes: Vec<f32>,
    pub band_magnitudes: Vec<f32>,
    pub band_frequencies: Vec<f32>,
    pub loudness: f32,
    pub current_time: f64,
    #[serde(skip)]
    pub session: u64,
}

impl AnalysisEvent {
    /// Overwrite this event with `result`, reusing the vectors' capacity
    fn fill(&mut self, result: &AnalysisResult<'_>, session: u64) {
        self.raw_magnitudes.clear();
        self.raw_magnitudes.extend_from_slice(result.raw_magnitudes);
        self.band_magnitudes.clear();
        self.band_magnitudes.extend_from_slice(result.band_magnitudes);
        self.band_frequencies.clear();
        self.band_frequencies.extend_from_slice(result.band_frequencies);
        self.loudness = result.loudness;
        self.current_time = result.current_time;
        self.session = session;
    }
}

/// Periodic playback position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub current_time: f64,
    #[serde(skip)]
    pub session: u64,
}

/// Everything the engine publishes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    Analysis(AnalysisEvent),
    Progress(ProgressEvent),
}

impl PlayerEvent {
    pub fn session(&self) -> u64 {
        match self {
            Self::Analysis(event) => event.session,
            Self::Progress(event) => event.session,
        }
    }
}

/// Monotonic session id shared by the engine, its workers and the stream
#[derive(Debug, Clone, Default)]
pub struct SessionCounter(Arc<AtomicU64>);

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Start a new session, invalidating everything stamped with older ones
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Create a connected sink/stream pair
///
/// # Arguments
/// * `capacity` - Bound of the event channel (and of the recycling channel)
/// * `session` - Session counter shared with the producer side
/// * `stats` - Counters for emitted, dropped and stale events
pub fn channel(
    capacity: usize,
    session: SessionCounter,
    stats: Arc<PipelineStats>,
) -> (EventSink, EventStream) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(capacity.max(1));
    let sink = EventSink {
        tx,
        recycle_rx,
        session: session.clone(),
        stats: Arc::clone(&stats),
    };
    let stream = EventStream {
        rx,
        recycle_tx,
        session,
        stats,
    };
    (sink, stream)
}

/// Producer side, cheap to clone
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<PlayerEvent>,
    recycle_rx: Receiver<AnalysisEvent>,
    session: SessionCounter,
    stats: Arc<PipelineStats>,
}

impl EventSink {
    /// Publish an analysis result produced during `session`
    ///
    /// Returns `true` if the event was queued.
    pub fn emit_analysis(&self, result: &AnalysisResult<'_>, session: u64) -> bool {
        if session != self.session.current() {
            self.stats.record_stale();
            return false;
        }
        let mut event = self.recycle_rx.try_recv().unwrap_or_default();
        event.fill(result, session);
        self.send(PlayerEvent::Analysis(event))
    }

    /// Publish a progress tick produced during `session`
    pub fn emit_progress(&self, current_time: f64, session: u64) -> bool {
        if session != self.session.current() {
            self.stats.record_stale();
            return false;
        }
        let sent = self.send(PlayerEvent::Progress(ProgressEvent {
            current_time,
            session,
        }));
        if sent {
            self.stats.record_progress();
        }
        sent
    }

    fn send(&self, event: PlayerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.record_emitted();
                true
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.stats.record_dropped();
                if dropped.is_power_of_two() {
                    tracing::warn!(dropped, "Event consumer is falling behind, dropping events");
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer side of the event channel
///
/// Events from sessions that ended before they were received are skipped.
#[derive(Debug)]
pub struct EventStream {
    rx: Receiver<PlayerEvent>,
    recycle_tx: Sender<AnalysisEvent>,
    session: SessionCounter,
    stats: Arc<PipelineStats>,
}

impl EventStream {
    /// Take the next current event without blocking
    pub fn try_recv(&self) -> Result<PlayerEvent, TryRecvError> {
        loop {
            let event = self.rx.try_recv()?;
            if let Some(event) = self.admit(event) {
                return Ok(event);
            }
        }
    }

    /// Wait up to `timeout` for the next current event
    pub fn recv_timeout(&self, timeout: Duration) -> Result<PlayerEvent, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = self.rx.recv_timeout(remaining)?;
            if let Some(event) = self.admit(event) {
                return Ok(event);
            }
        }
    }

    /// Block until the next current event, failing once the engine is gone
    pub fn recv(&self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.rx.recv()?;
            if let Some(event) = self.admit(event) {
                return Ok(event);
            }
        }
    }

    /// Drain every current event that is already queued
    pub fn drain(&self) -> Vec<PlayerEvent> {
        std::iter::from_fn(|| self.try_recv().ok()).collect()
    }

    /// Return an analysis event so its buffers can be reused
    pub fn recycle(&self, event: AnalysisEvent) {
        let _ = self.recycle_tx.try_send(event);
    }

    fn admit(&self, event: PlayerEvent) -> Option<PlayerEvent> {
        if event.session() == self.session.current() {
            return Some(event);
        }
        self.stats.record_stale();
        if let PlayerEvent::Analysis(stale) = event {
            self.recycle(stale);
        }
        None
    }
}
