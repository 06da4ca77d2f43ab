//! Per-buffer analysis: throttle, frame, loudness, FFT, banding
//!
//! [`AnalysisPipeline`] owns every working buffer it needs. After
//! construction the only allocation it can perform is resizing the band
//! output when the band count changes.

use super::banding::{BandAggregator, SharedBandingConfig};
use super::loudness::LoudnessEstimator;
use super::spectrum::SpectralTransform;
use super::throttle::FrameThrottle;
use crate::config::{AnalyzerConfig, ConfigError};
use crate::stats::PipelineStats;
use std::sync::Arc;

/// One analyzed buffer, borrowed from the pipeline's working buffers
#[derive(Debug, Clone, Copy)]
pub struct AnalysisResult<'a> {
    /// One-sided FFT magnitudes (window / 2 bins)
    pub raw_magnitudes: &'a [f32],
    pub band_magnitudes: &'a [f32],
    /// Band centre frequencies, zeros for group methods
    pub band_frequencies: &'a [f32],
    pub loudness: f32,
    /// Playback position of the buffer in seconds
    pub current_time: f64,
}

/// Turns delivered PCM buffers into analysis results
///
/// # Example
/// ```
/// use audiofft_core::audio::pipeline::AnalysisPipeline;
/// use audiofft_core::config::AnalyzerConfig;
///
/// let mut pipeline = AnalysisPipeline::from_config(&AnalyzerConfig::default()).unwrap();
/// let result = pipeline.analyze(&[0.0; 1024], 44100, 0.0);
/// assert_eq!(result.raw_magnitudes.len(), 1024);
/// assert_eq!(result.band_magnitudes.len(), 80);
/// ```
#[derive(Debug)]
pub struct AnalysisPipeline {
    throttle: FrameThrottle,
    /// Analysis frame, window-sized
    frame: Vec<f32>,
    transform: SpectralTransform,
    loudness: LoudnessEstimator,
    aggregator: BandAggregator,
    banding: SharedBandingConfig,
    stats: Arc<PipelineStats>,
}

impl AnalysisPipeline {
    /// Build a pipeline reading banding options from `banding`
    ///
    /// # Arguments
    /// * `config` - Analyzer configuration, validated here
    /// * `banding` - Shared banding cell written by the control thread
    /// * `stats` - Counters updated on every delivered buffer
    pub fn new(
        config: &AnalyzerConfig,
        banding: SharedBandingConfig,
        stats: Arc<PipelineStats>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.buffer_size < config.window_size {
            tracing::warn!(
                buffer_size = config.buffer_size,
                window_size = config.window_size,
                "Buffers shorter than the window, every analysis will be zero-padded"
            );
        }

        let transform = SpectralTransform::new(config.window_size, config.window_function)?
            .with_magnitude_scale(config.magnitude_scale);
        let aggregator = BandAggregator::new(banding.load().config.num_bands)
            .with_linear_range(config.linear_min_frequency, config.linear_max_frequency)
            .with_smoothing(config.smoothing);

        Ok(Self {
            throttle: FrameThrottle::new(config.skip_count),
            frame: vec![0.0; config.window_size],
            transform,
            loudness: LoudnessEstimator::new(config.loudness),
            aggregator,
            banding,
            stats,
        })
    }

    /// Build a standalone pipeline with its own banding cell and counters
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        let banding = SharedBandingConfig::new(config.banding()?);
        Self::new(config, banding, Arc::new(PipelineStats::new()))
    }

    /// Shared banding cell; storing into it affects the next analysis
    pub fn banding(&self) -> &SharedBandingConfig {
        &self.banding
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    pub fn window_size(&self) -> usize {
        self.frame.len()
    }

    /// Make the next delivered buffer eligible for analysis
    pub fn reset(&mut self) {
        self.throttle.reset();
    }

    /// Throttled entry point, called once per delivered buffer
    ///
    /// Returns `None` for buffers the throttle skips.
    pub fn process(
        &mut self,
        buffer: &[f32],
        sample_rate: u32,
        current_time: f64,
    ) -> Option<AnalysisResult<'_>> {
        if !self.throttle.should_analyze() {
            self.stats.record_skipped();
            return None;
        }
        Some(self.analyze(buffer, sample_rate, current_time))
    }

    /// Analyze `buffer` unconditionally
    ///
    /// Buffers shorter than the window are zero-padded (counted as an
    /// underrun), longer ones are truncated to the window.
    pub fn analyze(
        &mut self,
        buffer: &[f32],
        sample_rate: u32,
        current_time: f64,
    ) -> AnalysisResult<'_> {
        let copied = buffer.len().min(self.frame.len());
        self.frame[..copied].copy_from_slice(&buffer[..copied]);
        self.frame[copied..].fill(0.0);
        self.stats.record_analyzed(copied < self.frame.len());

        let loudness = self.loudness.estimate(&self.frame);
        let raw_magnitudes = self.transform.transform(&self.frame);
        // One snapshot per cycle; a concurrent store applies to the next buffer
        let snapshot = self.banding.load();
        let bands = self.aggregator.aggregate(raw_magnitudes, snapshot, sample_rate);

        AnalysisResult {
            raw_magnitudes,
            band_magnitudes: bands.magnitudes,
            band_frequencies: bands.frequencies,
            loudness,
            current_time,
        }
    }
}
