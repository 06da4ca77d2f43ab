//! Magnitude spectrum of a single analysis frame
//!
//! Wraps a forward FFT of fixed size `N` and turns a real PCM frame into
//! `N / 2` one-sided magnitude bins. Every working buffer is allocated once in
//! [`SpectralTransform::new`] and reused, so [`SpectralTransform::transform`]
//! is allocation-free and safe to call from the render thread.

use crate::config::ConfigError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

/// Smallest supported analysis window
pub const MIN_WINDOW_SIZE: usize = 16;

/// Largest supported analysis window
pub const MAX_WINDOW_SIZE: usize = 65536;

/// Tapering applied to the frame before the FFT
///
/// The default is [`WindowFunction::Rectangular`] (no tapering), which keeps
/// output identical to a plain DFT at the cost of spectral leakage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// No tapering
    #[default]
    Rectangular,
    /// Periodic Hann window
    Hann,
    /// Periodic Hamming window
    Hamming,
}

impl WindowFunction {
    /// Window coefficients for a frame of `size` samples, `None` for rectangular
    fn coefficients(self, size: usize) -> Option<Vec<f32>> {
        let n = size as f32;
        match self {
            Self::Rectangular => None,
            Self::Hann => Some(
                (0..size)
                    .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n).cos())
                    .collect(),
            ),
            Self::Hamming => Some(
                (0..size)
                    .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / n).cos())
                    .collect(),
            ),
        }
    }
}

/// Forward FFT producing one-sided magnitudes
///
/// # Example
/// ```
/// use audiofft_core::audio::spectrum::{SpectralTransform, WindowFunction};
///
/// let mut transform = SpectralTransform::new(1024, WindowFunction::Rectangular).unwrap();
/// let silence = vec![0.0f32; 1024];
/// let magnitudes = transform.transform(&silence);
/// assert_eq!(magnitudes.len(), 512);
/// assert!(magnitudes.iter().all(|&m| m == 0.0));
/// ```
pub struct SpectralTransform {
    /// Window size N
    size: usize,
    /// Planned forward FFT of size N
    fft: Arc<dyn Fft<f32>>,
    /// In-place FFT buffer (N complex values)
    buffer: Vec<Complex<f32>>,
    /// FFT scratch space
    scratch: Vec<Complex<f32>>,
    /// Pre-computed window coefficients
    window: Option<Vec<f32>>,
    window_function: WindowFunction,
    /// Output magnitudes (N / 2 values)
    magnitudes: Vec<f32>,
    /// Multiplier applied to every magnitude
    magnitude_scale: f32,
}

impl SpectralTransform {
    /// Plan a transform of `size` samples
    ///
    /// # Arguments
    /// * `size` - Window size, must be a power of two in
    ///   [`MIN_WINDOW_SIZE`]..=[`MAX_WINDOW_SIZE`]
    /// * `window` - Tapering applied before the FFT
    pub fn new(size: usize, window: WindowFunction) -> Result<Self, ConfigError> {
        if !size.is_power_of_two() || !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&size) {
            return Err(ConfigError::InvalidWindowSize(size));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            size,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            window: window.coefficients(size),
            window_function: window,
            magnitudes: vec![0.0; size / 2],
            magnitude_scale: 1.0,
        })
    }

    /// Multiply every output magnitude by `scale`
    pub fn with_magnitude_scale(mut self, scale: f32) -> Self {
        self.magnitude_scale = scale;
        self
    }

    /// Window size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of output bins (N / 2)
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Configured window function
    pub fn window_function(&self) -> WindowFunction {
        self.window_function
    }

    /// Frequency spacing between adjacent bins in Hz
    pub fn bin_width(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.size as f64
    }

    /// Transform one frame and return its magnitudes
    ///
    /// Frames shorter than the window are zero-padded, longer ones are
    /// truncated. Non-finite samples are treated as silence.
    pub fn transform(&mut self, frame: &[f32]) -> &[f32] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = frame
                .get(i)
                .copied()
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);
            let weight = self.window.as_ref().map_or(1.0, |w| w[i]);
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = self.magnitude_scale;
        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = (bin.re * bin.re + bin.im * bin.im).sqrt() * scale;
        }

        &self.magnitudes
    }
}

impl std::fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("size", &self.size)
            .field("window_function", &self.window_function)
            .field("magnitude_scale", &self.magnitude_scale)
            .finish()
    }
}
