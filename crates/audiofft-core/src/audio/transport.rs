//! Audio sources and the transport that renders them
//!
//! A [`SourceLoader`] resolves a URI into metadata plus an opaque source on
//! the control thread. The source is then handed to a [`Transport`] that
//! lives on the render thread and produces mono `f32` buffers together with
//! a sample counter that restarts from zero on every scheduled segment.
//!
//! [`MemoryLibrary`] and [`MemoryTransport`] implement both sides over
//! in-memory PCM and are what the tests, benchmarks and demo binary use.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while opening a source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Source unavailable: {uri} ({reason})")]
    SourceUnavailable { uri: String, reason: String },
}

/// Properties of an opened source
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Length in seconds (`total_samples / sample_rate`)
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channel_count: u16,
    /// Length in frames
    pub total_samples: u64,
}

impl SourceMetadata {
    /// Build metadata, deriving the duration
    pub fn new(sample_rate: u32, channel_count: u16, total_samples: u64) -> Self {
        let duration_seconds = if sample_rate > 0 {
            total_samples as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            duration_seconds,
            sample_rate,
            channel_count,
            total_samples,
        }
    }

    /// Frame index at `seconds`, floored and clamped to the source length
    pub fn frame_at(&self, seconds: f64) -> u64 {
        let frame = (seconds.max(0.0) * self.sample_rate as f64).floor() as u64;
        frame.min(self.total_samples)
    }
}

/// Resolves URIs into playable sources
///
/// Called on the control thread, so opening may block on I/O.
pub trait SourceLoader: Send + Sync + 'static {
    /// Opened source handed to the transport
    type Source: Send + 'static;

    /// Open `uri`
    ///
    /// # Errors
    /// [`TransportError::SourceUnavailable`] when the URI cannot be resolved or
    /// its contents are not playable.
    fn open(&self, uri: &str) -> Result<(SourceMetadata, Self::Source), TransportError>;
}

/// Render-side playback primitives
///
/// All methods are called from the render thread only.
pub trait Transport: Send + 'static {
    type Source: Send + 'static;

    /// Replace the current source, positioned at frame 0 and paused
    fn load(&mut self, source: Self::Source);

    /// Start or resume rendering
    fn play(&mut self);

    /// Stop rendering, keeping the position
    fn pause(&mut self);

    /// Stop rendering and drop the source
    fn stop(&mut self);

    /// Schedule a segment from `start_frame` to the end, resetting the sample counter
    fn schedule_from(&mut self, start_frame: u64);

    /// Samples rendered since the current segment started, `None` when not playing
    fn sample_time(&self) -> Option<u64>;

    /// Whether [`Self::render`] currently produces audio
    fn is_rendering(&self) -> bool;

    /// Fill `out` with the next mono buffer
    ///
    /// Returns the number of source frames written. The rest of `out` is
    /// zeroed. The sample counter advances by `out.len()` whenever the
    /// transport is rendering, including past the end of the source.
    fn render(&mut self, out: &mut [f32]) -> usize;
}

/// Interleaved PCM held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Wrap interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Wrap single-channel samples
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Synthesize a mono sine tone
    ///
    /// # Example
    /// ```
    /// use audiofft_core::audio::transport::PcmBuffer;
    ///
    /// let tone = PcmBuffer::sine(440.0, 0.5, 2.0, 48000);
    /// assert_eq!(tone.frames(), 96000);
    /// ```
    pub fn sine(frequency: f32, amplitude: f32, seconds: f64, sample_rate: u32) -> Self {
        let frames = (seconds.max(0.0) * sample_rate as f64) as usize;
        let step = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate.max(1) as f64;
        let samples = (0..frames)
            .map(|i| amplitude * (step * i as f64).sin() as f32)
            .collect();
        Self::mono(samples, sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in frames
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Sample of channel 0 at `frame`
    fn first_channel(&self, frame: usize) -> f32 {
        self.samples
            .get(frame * self.channels as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn metadata(&self) -> SourceMetadata {
        SourceMetadata::new(self.sample_rate, self.channels, self.frames() as u64)
    }
}

/// URI-addressed collection of in-memory sources
#[derive(Debug, Default, Clone)]
pub struct MemoryLibrary {
    sources: HashMap<String, Arc<PcmBuffer>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `buffer` under `uri`, replacing any previous entry
    pub fn insert(&mut self, uri: impl Into<String>, buffer: PcmBuffer) {
        self.sources.insert(uri.into(), Arc::new(buffer));
    }

    /// Builder form of [`Self::insert`]
    pub fn with_source(mut self, uri: impl Into<String>, buffer: PcmBuffer) -> Self {
        self.insert(uri, buffer);
        self
    }
}

impl SourceLoader for MemoryLibrary {
    type Source = Arc<PcmBuffer>;

    fn open(&self, uri: &str) -> Result<(SourceMetadata, Self::Source), TransportError> {
        let unavailable = |reason: &str| TransportError::SourceUnavailable {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let buffer = self.sources.get(uri).ok_or_else(|| unavailable("not found"))?;
        if buffer.channels == 0 || buffer.sample_rate == 0 {
            return Err(unavailable("unsupported format"));
        }
        Ok((buffer.metadata(), Arc::clone(buffer)))
    }
}

/// Transport rendering channel 0 of an in-memory buffer
#[derive(Debug, Default)]
pub struct MemoryTransport {
    source: Option<Arc<PcmBuffer>>,
    /// Next frame to render
    cursor: usize,
    /// Samples rendered since the segment started
    segment_samples: u64,
    playing: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next frame to be rendered
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Transport for MemoryTransport {
    type Source = Arc<PcmBuffer>;

    fn load(&mut self, source: Self::Source) {
        self.source = Some(source);
        self.cursor = 0;
        self.segment_samples = 0;
        self.playing = false;
    }

    fn play(&mut self) {
        self.playing = self.source.is_some();
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.source = None;
        self.cursor = 0;
        self.segment_samples = 0;
        self.playing = false;
    }

    fn schedule_from(&mut self, start_frame: u64) {
        let frames = self.source.as_ref().map_or(0, |s| s.frames());
        self.cursor = usize::try_from(start_frame).unwrap_or(usize::MAX).min(frames);
        self.segment_samples = 0;
    }

    fn sample_time(&self) -> Option<u64> {
        self.is_rendering().then_some(self.segment_samples)
    }

    fn is_rendering(&self) -> bool {
        self.playing && self.source.is_some()
    }

    fn render(&mut self, out: &mut [f32]) -> usize {
        let source = match (&self.source, self.playing) {
            (Some(source), true) => source,
            _ => {
                out.fill(0.0);
                return 0;
            }
        };

        let available = source.frames().saturating_sub(self.cursor);
        let written = available.min(out.len());
        for (i, slot) in out[..written].iter_mut().enumerate() {
            *slot = source.first_channel(self.cursor + i);
        }
        out[written..].fill(0.0);

        self.cursor += written;
        self.segment_samples += out.len() as u64;
        written
    }
}
