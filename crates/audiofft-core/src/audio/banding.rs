//! Reduction of magnitude bins into display bands
//!
//! The banding options (`num_bands`, `method`) are written by a control thread
//! and read by the render thread. They live in a single [`AtomicU64`] inside
//! [`SharedBandingConfig`], so a reader always sees both fields from the same
//! write together with the generation number of that write.
//!
//! ## Methods
//!
//! | Method        | Grouping                                   | Frequencies |
//! |---------------|--------------------------------------------|-------------|
//! | `logarithmic` | geometric bands between 20 Hz and 20 kHz   | yes         |
//! | `linear`      | equal bin ranges between min and max freq  | yes         |
//! | `average`     | equal contiguous groups, mean              | zero-filled |
//! | `min`         | equal contiguous groups, minimum           | zero-filled |
//! | `max`         | equal contiguous groups, maximum           | zero-filled |
//!
//! The logarithmic range is fixed and independent of the source Nyquist
//! frequency. For low sample rates the top bands therefore map above the
//! last bin and stay at zero.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lower edge of the logarithmic band range in Hz
pub const LOG_MIN_FREQUENCY: f64 = 20.0;

/// Upper edge of the logarithmic band range in Hz
pub const LOG_MAX_FREQUENCY: f64 = 20000.0;

/// Largest accepted band count
pub const MAX_BANDS: usize = 16384;

const BANDS_MASK: u64 = 0x00FF_FFFF;
const METHOD_SHIFT: u32 = 24;
const GENERATION_SHIFT: u32 = 32;

/// Strategy used to group bins into bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandingMethod {
    /// Geometrically spaced bands over a fixed 20 Hz - 20 kHz range
    #[default]
    Logarithmic,
    /// Equal-width bands over a frequency range
    Linear,
    /// Mean of equal contiguous bin groups
    #[serde(alias = "avg")]
    Average,
    /// Minimum of equal contiguous bin groups
    Min,
    /// Maximum of equal contiguous bin groups
    Max,
}

impl BandingMethod {
    /// All methods in wire order
    pub const ALL: [BandingMethod; 5] = [
        Self::Logarithmic,
        Self::Linear,
        Self::Average,
        Self::Min,
        Self::Max,
    ];

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logarithmic => "logarithmic",
            Self::Linear => "linear",
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Whether this method produces band centre frequencies
    pub fn has_frequencies(self) -> bool {
        matches!(self, Self::Logarithmic | Self::Linear)
    }

    fn index(self) -> u64 {
        match self {
            Self::Logarithmic => 0,
            Self::Linear => 1,
            Self::Average => 2,
            Self::Min => 3,
            Self::Max => 4,
        }
    }

    fn from_index(index: u64) -> Self {
        match index {
            1 => Self::Linear,
            2 => Self::Average,
            3 => Self::Min,
            4 => Self::Max,
            _ => Self::Logarithmic,
        }
    }
}

impl fmt::Display for BandingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandingMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logarithmic" | "log" => Ok(Self::Logarithmic),
            "linear" => Ok(Self::Linear),
            "average" | "avg" => Ok(Self::Average),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(ConfigError::UnknownBandingMethod(s.to_string())),
        }
    }
}

/// Validated banding options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandingConfig {
    pub num_bands: usize,
    pub method: BandingMethod,
}

impl BandingConfig {
    /// Validate and build a banding config
    ///
    /// # Errors
    /// [`ConfigError::InvalidBandCount`] when `num_bands` is 0 or above [`MAX_BANDS`]
    pub fn new(num_bands: usize, method: BandingMethod) -> Result<Self, ConfigError> {
        if num_bands == 0 || num_bands > MAX_BANDS {
            return Err(ConfigError::InvalidBandCount(num_bands));
        }
        Ok(Self { num_bands, method })
    }
}

impl Default for BandingConfig {
    fn default() -> Self {
        Self {
            num_bands: crate::DEFAULT_NUM_BANDS,
            method: BandingMethod::Logarithmic,
        }
    }
}

/// One consistent read of the shared banding options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandingSnapshot {
    pub config: BandingConfig,
    /// Incremented on every store; smoothing state is tied to it
    pub generation: u32,
}

fn pack(config: BandingConfig, generation: u32) -> u64 {
    (config.num_bands as u64 & BANDS_MASK)
        | (config.method.index() << METHOD_SHIFT)
        | ((generation as u64) << GENERATION_SHIFT)
}

fn unpack(packed: u64) -> BandingSnapshot {
    BandingSnapshot {
        config: BandingConfig {
            num_bands: ((packed & BANDS_MASK) as usize).max(1),
            method: BandingMethod::from_index((packed >> METHOD_SHIFT) & 0xFF),
        },
        generation: (packed >> GENERATION_SHIFT) as u32,
    }
}

/// Banding options shared between the control and render threads
///
/// Cloning shares the same underlying cell.
///
/// # Example
/// ```
/// use audiofft_core::audio::banding::{BandingConfig, BandingMethod, SharedBandingConfig};
///
/// let shared = SharedBandingConfig::new(BandingConfig::default());
/// let before = shared.load();
/// shared.store(BandingConfig::new(32, BandingMethod::Linear).unwrap());
/// let after = shared.load();
/// assert_eq!(after.config.num_bands, 32);
/// assert_ne!(before.generation, after.generation);
/// ```
#[derive(Debug, Clone)]
pub struct SharedBandingConfig {
    packed: Arc<AtomicU64>,
}

impl SharedBandingConfig {
    /// Create a cell holding `initial` at generation 0
    pub fn new(initial: BandingConfig) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack(initial, 0))),
        }
    }

    /// Publish a new config, bumping the generation
    pub fn store(&self, config: BandingConfig) {
        // fetch_update keeps generations unique if two control threads race
        let _ = self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let generation = unpack(current).generation.wrapping_add(1);
                Some(pack(config, generation))
            });
    }

    /// Read the current config in a single atomic load
    pub fn load(&self) -> BandingSnapshot {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

/// Bounds of each logarithmic band in Hz
///
/// Band `i` spans `20 * factor^i .. 20 * factor^(i + 1)` with
/// `factor = (20000 / 20)^(1 / num_bands)`. The range does not depend on the
/// sample rate; bands above Nyquist read as empty.
pub fn log_band_edges(num_bands: usize) -> impl Iterator<Item = (f64, f64)> {
    let n = num_bands.max(1);
    let factor = (LOG_MAX_FREQUENCY / LOG_MIN_FREQUENCY).powf(1.0 / n as f64);
    (0..n).map(move |i| {
        let lower = LOG_MIN_FREQUENCY * factor.powi(i as i32);
        let upper = if i + 1 == n {
            LOG_MAX_FREQUENCY
        } else {
            LOG_MIN_FREQUENCY * factor.powi(i as i32 + 1)
        };
        (lower, upper)
    })
}

/// Aggregated band output borrowed from the aggregator
#[derive(Debug, Clone, Copy)]
pub struct BandResult<'a> {
    pub magnitudes: &'a [f32],
    /// Band centre frequencies in Hz, zero-filled for group methods
    pub frequencies: &'a [f32],
}

/// Exponential smoothing state for one banding generation
#[derive(Debug)]
struct Smoother {
    alpha: f32,
    state: Vec<f32>,
    generation: Option<u32>,
}

impl Smoother {
    fn apply(&mut self, generation: u32, raw: &mut [f32]) {
        if self.generation != Some(generation) || self.state.len() != raw.len() {
            // New band semantics: start over from the current raw values
            self.state.clear();
            self.state.extend_from_slice(raw);
            self.generation = Some(generation);
            return;
        }
        let alpha = self.alpha;
        for (smoothed, value) in self.state.iter_mut().zip(raw.iter_mut()) {
            *smoothed = *smoothed * (1.0 - alpha) + *value * alpha;
            *value = *smoothed;
        }
    }
}

/// Reduces a magnitude spectrum to display bands
///
/// Output buffers are kept between calls and only resized when the band
/// count changes.
#[derive(Debug)]
pub struct BandAggregator {
    magnitudes: Vec<f32>,
    frequencies: Vec<f32>,
    /// Lower bound for linear banding in Hz
    linear_min_frequency: f64,
    /// Upper bound for linear banding in Hz, capped at Nyquist
    linear_max_frequency: Option<f64>,
    smoother: Option<Smoother>,
}

impl BandAggregator {
    /// Create an aggregator sized for `initial_bands`
    pub fn new(initial_bands: usize) -> Self {
        Self {
            magnitudes: vec![0.0; initial_bands],
            frequencies: vec![0.0; initial_bands],
            linear_min_frequency: 0.0,
            linear_max_frequency: None,
            smoother: None,
        }
    }

    /// Restrict linear banding to `min..max` Hz (`None` = Nyquist)
    pub fn with_linear_range(mut self, min_frequency: f64, max_frequency: Option<f64>) -> Self {
        self.linear_min_frequency = min_frequency.max(0.0);
        self.linear_max_frequency = max_frequency;
        self
    }

    /// Enable exponential smoothing with factor `alpha` (weight of the new value)
    pub fn with_smoothing(mut self, alpha: Option<f32>) -> Self {
        self.smoother = alpha.map(|alpha| Smoother {
            alpha: alpha.clamp(0.0, 1.0),
            state: Vec::with_capacity(self.magnitudes.len()),
            generation: None,
        });
        self
    }

    /// Group `spectrum` into bands according to `snapshot`
    ///
    /// # Arguments
    /// * `spectrum` - One-sided magnitudes (N / 2 bins)
    /// * `snapshot` - Banding options read once for this cycle
    /// * `sample_rate` - Source sample rate in Hz
    pub fn aggregate(
        &mut self,
        spectrum: &[f32],
        snapshot: BandingSnapshot,
        sample_rate: u32,
    ) -> BandResult<'_> {
        let n = snapshot.config.num_bands;
        if self.magnitudes.len() != n {
            self.magnitudes.resize(n, 0.0);
            self.frequencies.resize(n, 0.0);
        }

        let nyquist = sample_rate as f64 / 2.0;
        if spectrum.is_empty() || nyquist <= 0.0 {
            self.magnitudes.fill(0.0);
            self.frequencies.fill(0.0);
        } else {
            match snapshot.config.method {
                BandingMethod::Logarithmic => self.logarithmic(spectrum, nyquist),
                BandingMethod::Linear => self.linear(spectrum, nyquist),
                method => self.grouped(spectrum, method),
            }
        }

        if let Some(smoother) = self.smoother.as_mut() {
            smoother.apply(snapshot.generation, &mut self.magnitudes);
        }

        BandResult {
            magnitudes: &self.magnitudes,
            frequencies: &self.frequencies,
        }
    }

    fn logarithmic(&mut self, spectrum: &[f32], nyquist: f64) {
        let len = spectrum.len();
        let bin_width = nyquist / len as f64;
        let to_bin = |freq: f64| ((freq / bin_width).floor() as usize).min(len);

        let bands = self.magnitudes.len();
        for (i, (lower, upper)) in log_band_edges(bands).enumerate() {
            let lo = to_bin(lower);
            let hi = to_bin(upper).max(lo);
            self.magnitudes[i] = mean(&spectrum[lo..hi]);
            self.frequencies[i] = bin_frequency((lo + hi) as f64 / 2.0, len, nyquist);
        }
    }

    fn linear(&mut self, spectrum: &[f32], nyquist: f64) {
        let len = spectrum.len();
        let index_for = |freq: f64| ((len as f64 * freq / nyquist).floor().max(0.0) as usize).min(len);

        let max_frequency = self
            .linear_max_frequency
            .map_or(nyquist, |max| max.min(nyquist));
        let lower = index_for(self.linear_min_frequency);
        let upper = index_for(max_frequency).max(lower);

        let bands = self.magnitudes.len();
        let ratio = (upper - lower) as f64 / bands as f64;
        for i in 0..bands {
            let start = (i as f64 * ratio).floor() as usize + lower;
            let end = ((i + 1) as f64 * ratio).floor() as usize + lower;
            self.magnitudes[i] = if end <= start {
                // More bands than bins: reuse the single bin
                spectrum[start.min(len - 1)]
            } else {
                mean(&spectrum[start.min(len)..end.min(len)])
            };
            self.frequencies[i] = ((bin_frequency(start as f64, len, nyquist)
                + bin_frequency(end as f64, len, nyquist))
                / 2.0) as f32;
        }
    }

    fn grouped(&mut self, spectrum: &[f32], method: BandingMethod) {
        let len = spectrum.len();
        let bands = self.magnitudes.len();
        let factor = (len / bands).max(1);

        for i in 0..bands {
            let start = i * factor;
            // Last band absorbs the remainder
            let end = if i + 1 == bands {
                len
            } else {
                ((i + 1) * factor).min(len)
            };
            self.magnitudes[i] = if start >= end {
                0.0
            } else {
                let group = &spectrum[start..end];
                match method {
                    BandingMethod::Min => group.iter().copied().fold(f32::INFINITY, f32::min),
                    BandingMethod::Max => group.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    _ => mean(group),
                }
            };
        }
        self.frequencies.fill(0.0);
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn bin_frequency(bin: f64, len: usize, nyquist: f64) -> f32 {
    (bin / len as f64 * nyquist) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(num_bands: usize, method: BandingMethod) -> BandingSnapshot {
        BandingSnapshot {
            config: BandingConfig::new(num_bands, method).unwrap(),
            generation: 0,
        }
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_band_counts_for_every_method() {
        let spectrum = ramp(1024);
        for method in BandingMethod::ALL {
            for bands in [1, 2, 7, 10, 60, 80, 512, 1024, 3000] {
                let mut aggregator = BandAggregator::new(4);
                let result = aggregator.aggregate(&spectrum, snapshot(bands, method), 44100);
                assert_eq!(result.magnitudes.len(), bands, "{} {}", method, bands);
                assert_eq!(result.frequencies.len(), bands, "{} {}", method, bands);
            }
        }
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("logarithmic".parse::<BandingMethod>().unwrap(), BandingMethod::Logarithmic);
        assert_eq!("avg".parse::<BandingMethod>().unwrap(), BandingMethod::Average);
        assert_eq!(" MAX ".parse::<BandingMethod>().unwrap(), BandingMethod::Max);
        assert!(matches!(
            "cubic".parse::<BandingMethod>(),
            Err(ConfigError::UnknownBandingMethod(_))
        ));
        for method in BandingMethod::ALL {
            assert_eq!(method.as_str().parse::<BandingMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(BandingConfig::new(0, BandingMethod::Linear).is_err());
        assert!(BandingConfig::new(MAX_BANDS + 1, BandingMethod::Linear).is_err());
        assert!(BandingConfig::new(MAX_BANDS, BandingMethod::Linear).is_ok());
    }

    #[test]
    fn test_shared_config_round_trip() {
        let shared = SharedBandingConfig::new(BandingConfig::default());
        for method in BandingMethod::ALL {
            let config = BandingConfig::new(MAX_BANDS, method).unwrap();
            shared.store(config);
            assert_eq!(shared.load().config, config);
        }
        assert_eq!(shared.load().generation, 5);
    }

    #[test]
    fn test_shared_config_never_torn() {
        let shared = SharedBandingConfig::new(BandingConfig::new(10, BandingMethod::Linear).unwrap());
        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for _ in 0..10_000 {
                writer.store(BandingConfig::new(10, BandingMethod::Linear).unwrap());
                writer.store(BandingConfig::new(99, BandingMethod::Max).unwrap());
            }
        });
        for _ in 0..10_000 {
            let config = shared.load().config;
            let consistent = (config.num_bands == 10 && config.method == BandingMethod::Linear)
                || (config.num_bands == 99 && config.method == BandingMethod::Max);
            assert!(consistent, "torn read: {:?}", config);
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_log_band_edges() {
        for bands in [1, 10, 80] {
            let edges: Vec<(f64, f64)> = log_band_edges(bands).collect();
            assert_eq!(edges.len(), bands);
            assert_relative_eq!(edges[0].0, 20.0, epsilon = 1e-9);
            assert_relative_eq!(edges[bands - 1].1, 20000.0, epsilon = 1e-6);
            for (i, (lower, upper)) in edges.iter().enumerate() {
                assert!(upper > lower);
                if i > 0 {
                    assert!(*lower > edges[i - 1].0);
                    assert_relative_eq!(*lower, edges[i - 1].1, max_relative = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_logarithmic_means_bins() {
        // 1024 bins over 22050 Hz: ~21.5 Hz per bin
        let spectrum = vec![2.0f32; 1024];
        let mut aggregator = BandAggregator::new(10);
        let result = aggregator.aggregate(&spectrum, snapshot(10, BandingMethod::Logarithmic), 44100);
        // Every non-empty band averages to the constant
        for &m in result.magnitudes {
            assert!(m == 0.0 || (m - 2.0).abs() < 1e-6);
        }
        assert!(result.magnitudes.iter().filter(|&&m| m > 0.0).count() >= 8);
        assert!(result.frequencies.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_logarithmic_narrow_low_band_is_zero() {
        // At 40 bands, band 1 spans 23.8..28.3 Hz and falls inside bin 1
        let spectrum = vec![1.0f32; 1024];
        let mut aggregator = BandAggregator::new(40);
        let result = aggregator.aggregate(&spectrum, snapshot(40, BandingMethod::Logarithmic), 44100);
        assert_eq!(result.magnitudes[0], 1.0);
        assert_eq!(result.magnitudes[1], 0.0);
    }

    #[test]
    fn test_logarithmic_above_nyquist_is_empty() {
        // 16 kHz source: Nyquist 8 kHz, top log bands cannot be filled
        let spectrum = vec![1.0f32; 512];
        let mut aggregator = BandAggregator::new(10);
        let result = aggregator.aggregate(&spectrum, snapshot(10, BandingMethod::Logarithmic), 16000);
        assert_eq!(result.magnitudes[9], 0.0);
        assert!(result.frequencies.iter().all(|&f| f <= 8000.0));
    }

    #[test]
    fn test_linear_even_split() {
        let spectrum = ramp(1024);
        let mut aggregator = BandAggregator::new(4);
        let result = aggregator.aggregate(&spectrum, snapshot(4, BandingMethod::Linear), 44100);
        // Bands of 256 bins: mean of 0..256 is 127.5
        assert_relative_eq!(result.magnitudes[0], 127.5, epsilon = 1e-3);
        assert_relative_eq!(result.magnitudes[3], 895.5, epsilon = 1e-3);
        // Centre of band 0 is bin 128 of 1024 -> 2756.25 Hz
        assert_relative_eq!(result.frequencies[0], 2756.25, epsilon = 1e-2);
    }

    #[test]
    fn test_linear_more_bands_than_bins() {
        let spectrum = ramp(8);
        let mut aggregator = BandAggregator::new(1);
        let result = aggregator.aggregate(&spectrum, snapshot(20, BandingMethod::Linear), 44100);
        assert_eq!(result.magnitudes.len(), 20);
        // Degenerate bands carry a single bin value
        for &m in result.magnitudes {
            assert!((0.0..8.0).contains(&m));
            assert_eq!(m.fract(), 0.0);
        }
    }

    #[test]
    fn test_linear_range_restricted() {
        let spectrum = ramp(1024);
        let mut aggregator = BandAggregator::new(1).with_linear_range(11025.0, None);
        let result = aggregator.aggregate(&spectrum, snapshot(1, BandingMethod::Linear), 44100);
        // Upper half of the spectrum: bins 512..1024
        assert_relative_eq!(result.magnitudes[0], 767.5, epsilon = 1e-3);
    }

    #[test]
    fn test_linear_empty_range_does_not_panic() {
        let spectrum = ramp(16);
        let mut aggregator = BandAggregator::new(3).with_linear_range(30000.0, None);
        let result = aggregator.aggregate(&spectrum, snapshot(3, BandingMethod::Linear), 44100);
        assert!(result.magnitudes.iter().all(|&m| m == 15.0));
    }

    #[test]
    fn test_grouped_methods() {
        let spectrum: Vec<f32> = vec![1.0, 5.0, 3.0, 2.0, 8.0, 4.0, 6.0, 7.0];
        let mut aggregator = BandAggregator::new(2);

        let avg = aggregator
            .aggregate(&spectrum, snapshot(2, BandingMethod::Average), 44100)
            .magnitudes
            .to_vec();
        assert_eq!(avg, [2.75, 6.25]);

        let min = aggregator
            .aggregate(&spectrum, snapshot(2, BandingMethod::Min), 44100)
            .magnitudes
            .to_vec();
        assert_eq!(min, [1.0, 4.0]);

        let result = aggregator.aggregate(&spectrum, snapshot(2, BandingMethod::Max), 44100);
        assert_eq!(result.magnitudes, [5.0, 8.0]);
        assert!(result.frequencies.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_grouped_remainder_and_overflow() {
        let spectrum = ramp(10);
        let mut aggregator = BandAggregator::new(3);
        // factor 3: [0,1,2] [3,4,5] [6..10]
        let result = aggregator.aggregate(&spectrum, snapshot(3, BandingMethod::Max), 44100);
        assert_eq!(result.magnitudes, [2.0, 5.0, 9.0]);

        // More bands than bins: trailing groups are empty
        let result = aggregator.aggregate(&spectrum, snapshot(12, BandingMethod::Average), 44100);
        assert_eq!(result.magnitudes[9], 9.0);
        assert_eq!(result.magnitudes[10], 0.0);
        assert_eq!(result.magnitudes[11], 0.0);
    }

    #[test]
    fn test_smoothing_follows_generation() {
        let mut aggregator = BandAggregator::new(2).with_smoothing(Some(0.5));
        let loud = vec![4.0f32; 8];
        let quiet = vec![0.0f32; 8];
        let mut snap = snapshot(2, BandingMethod::Average);

        let first = aggregator.aggregate(&loud, snap, 44100).magnitudes.to_vec();
        assert_eq!(first, [4.0, 4.0]);
        let second = aggregator.aggregate(&quiet, snap, 44100).magnitudes.to_vec();
        assert_eq!(second, [2.0, 2.0]);

        // New generation with a different band count starts fresh
        snap = BandingSnapshot {
            config: BandingConfig::new(4, BandingMethod::Average).unwrap(),
            generation: 1,
        };
        let third = aggregator.aggregate(&quiet, snap, 44100).magnitudes.to_vec();
        assert_eq!(third, [0.0; 4]);

        // Same band count but new generation also resets
        snap.generation = 2;
        let fourth = aggregator.aggregate(&loud, snap, 44100).magnitudes.to_vec();
        assert_eq!(fourth, [4.0; 4]);
    }

    #[test]
    fn test_empty_spectrum_is_zeroed() {
        let mut aggregator = BandAggregator::new(3);
        let result = aggregator.aggregate(&[], snapshot(3, BandingMethod::Logarithmic), 44100);
        assert_eq!(result.magnitudes, [0.0; 3]);
        let result = aggregator.aggregate(&[1.0; 4], snapshot(3, BandingMethod::Linear), 0);
        assert_eq!(result.magnitudes, [0.0; 3]);
    }
}
