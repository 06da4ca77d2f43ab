//! Playback position tracking across play, pause and seek
//!
//! The transport's sample counter starts again from zero on every scheduled
//! segment restart, which includes every seek. The clock keeps the seconds
//! offset of the current segment and adds the live sample counter to it:
//!
//! ```text
//! current_time = offset + observed_sample_time / sample_rate
//! ```
//!
//! The clock never talks to the transport directly. Operations return the
//! [`TransportAction`] the caller has to apply, which keeps the state machine
//! testable without a renderer.

use super::transport::SourceMetadata;

/// Playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No source, or the source was stopped
    Stopped,
    /// Source loaded, playback not started yet
    Loaded,
    /// Transport is rendering
    Playing,
    /// Transport is paused, time is frozen
    Paused,
}

/// Instruction for the transport produced by a clock transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    /// Continue rendering from the current position
    Resume,
    /// Schedule a segment starting at this frame and play it
    RestartAt(u64),
    /// Pause rendering
    Pause,
    /// Stop rendering and drop the scheduled source
    Stop,
}

/// Result of an accepted seek
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekOutcome {
    /// Accepted target in seconds, clamped to the source duration
    pub target: f64,
    /// Immediate restart when playing, `None` when deferred to the next play
    pub action: Option<TransportAction>,
}

/// Snapshot of the clock's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    /// Seconds at which the current segment started
    pub current_time_offset: f64,
    /// Transport sample counter at the last observation
    pub last_known_sample_time: u64,
    pub sample_rate: u32,
    pub is_playing: bool,
}

/// Reconciles the transport sample counter with seek and pause history
///
/// # Example
/// ```
/// use audiofft_core::audio::clock::{PlaybackClock, TransportAction};
/// use audiofft_core::audio::transport::SourceMetadata;
///
/// let mut clock = PlaybackClock::new();
/// clock.load(SourceMetadata::new(48000, 1, 48000 * 10));
/// assert_eq!(clock.play(), Some(TransportAction::Resume));
/// clock.observe(Some(96000));
/// assert_eq!(clock.current_time(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: ClockState,
    metadata: Option<SourceMetadata>,
    offset: f64,
    last_sample_time: u64,
    /// Frame to restart from on the next play (deferred seek)
    pending_start: Option<u64>,
    current_time: f64,
}

impl PlaybackClock {
    /// Create a stopped clock with no source
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            metadata: None,
            offset: 0.0,
            last_sample_time: 0,
            pending_start: None,
            current_time: 0.0,
        }
    }

    /// Current state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Metadata of the loaded source
    pub fn metadata(&self) -> Option<&SourceMetadata> {
        self.metadata.as_ref()
    }

    /// Seconds at which the current segment started
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Frame a deferred seek will restart from
    pub fn pending_start(&self) -> Option<u64> {
        self.pending_start
    }

    /// Playback position in seconds
    ///
    /// Live while playing (as of the last [`Self::observe`]), frozen otherwise.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether the clock is in the playing state
    pub fn is_playing(&self) -> bool {
        self.state == ClockState::Playing
    }

    /// Bookkeeping snapshot
    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            current_time_offset: self.offset,
            last_known_sample_time: self.last_sample_time,
            sample_rate: self.metadata.map_or(0, |m| m.sample_rate),
            is_playing: self.is_playing(),
        }
    }

    /// Attach a new source, resetting all position state
    pub fn load(&mut self, metadata: SourceMetadata) {
        self.reset();
        self.metadata = Some(metadata);
        self.state = ClockState::Loaded;
        tracing::debug!(
            duration = metadata.duration_seconds,
            sample_rate = metadata.sample_rate,
            "clock_loaded"
        );
    }

    /// Start or resume playback
    ///
    /// Returns `None` when there is nothing to play or playback is already running.
    pub fn play(&mut self) -> Option<TransportAction> {
        match self.state {
            ClockState::Loaded | ClockState::Paused => {
                self.state = ClockState::Playing;
                match self.pending_start.take() {
                    Some(frame) => {
                        self.last_sample_time = 0;
                        Some(TransportAction::RestartAt(frame))
                    }
                    None => Some(TransportAction::Resume),
                }
            }
            ClockState::Playing | ClockState::Stopped => None,
        }
    }

    /// Pause playback, freezing the reported time
    pub fn pause(&mut self) -> Option<TransportAction> {
        if self.state == ClockState::Playing {
            self.state = ClockState::Paused;
            Some(TransportAction::Pause)
        } else {
            None
        }
    }

    /// Stop playback and forget the source
    pub fn stop(&mut self) -> Option<TransportAction> {
        if self.state == ClockState::Stopped {
            return None;
        }
        self.reset();
        self.metadata = None;
        self.state = ClockState::Stopped;
        Some(TransportAction::Stop)
    }

    /// Move the playback position to `to_seconds`
    ///
    /// While playing the transport is restarted right away. Otherwise the
    /// target is recorded and applied by the next [`Self::play`]. Returns
    /// `None` when no source is loaded or the target is not a number.
    pub fn seek(&mut self, to_seconds: f64) -> Option<SeekOutcome> {
        let metadata = self.metadata?;
        if self.state == ClockState::Stopped || !to_seconds.is_finite() {
            return None;
        }

        let target = to_seconds.clamp(0.0, metadata.duration_seconds);
        let frame = metadata.frame_at(target);
        self.offset = target;
        self.current_time = target;
        self.last_sample_time = 0;

        let action = if self.state == ClockState::Playing {
            self.pending_start = None;
            Some(TransportAction::RestartAt(frame))
        } else {
            self.pending_start = Some(frame);
            None
        };

        tracing::debug!(target, frame, deferred = action.is_none(), "clock_seek");
        Some(SeekOutcome { target, action })
    }

    /// Feed the transport's live sample counter
    ///
    /// Returns [`TransportAction::Pause`] once when the position reaches the
    /// end of the source.
    pub fn observe(&mut self, sample_time: Option<u64>) -> Option<TransportAction> {
        if self.state != ClockState::Playing {
            return None;
        }
        let metadata = self.metadata?;
        let sample_time = sample_time?;

        self.last_sample_time = sample_time;
        if metadata.sample_rate > 0 {
            self.current_time = self.offset + sample_time as f64 / metadata.sample_rate as f64;
        }

        if self.current_time >= metadata.duration_seconds {
            self.state = ClockState::Paused;
            tracing::debug!(current_time = self.current_time, "clock_reached_end");
            return Some(TransportAction::Pause);
        }
        None
    }

    fn reset(&mut self) {
        self.offset = 0.0;
        self.last_sample_time = 0;
        self.pending_start = None;
        self.current_time = 0.0;
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
