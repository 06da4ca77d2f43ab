//! Perceptual loudness of an analysis frame
//!
//! Two policies exist and they are not numerically interchangeable. A pipeline
//! picks one at construction and keeps it for its whole lifetime.
//! [`LoudnessPolicy::DbMapped`] is the default.

use serde::{Deserialize, Serialize};

/// Lower bound of the dB-mapped output range (silence)
pub const DB_MAPPED_FLOOR: f32 = 0.3;

/// Upper bound of the dB-mapped output range
pub const DB_MAPPED_CEILING: f32 = 0.6;

/// Width of the SPL-like window mapped onto the output range, in dB
const DB_WINDOW: f32 = 40.0;

/// Offset that moves dBFS into the 0..160 "SPL-like" range
const SPL_SHIFT: f32 = 160.0;

/// Bottom of the SPL-like window (160 - 40)
const SPL_WINDOW_FLOOR: f32 = 120.0;

/// How a frame is reduced to a loudness scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoudnessPolicy {
    /// Root mean square of the samples, roughly 0..1
    Rms,
    /// Mean square in dB, windowed to 120..160 and rescaled to 0.3..0.6
    #[default]
    DbMapped,
}

/// Loudness estimator bound to one policy
#[derive(Debug, Clone, Copy)]
pub struct LoudnessEstimator {
    policy: LoudnessPolicy,
}

impl LoudnessEstimator {
    /// Create an estimator for the given policy
    pub fn new(policy: LoudnessPolicy) -> Self {
        Self { policy }
    }

    /// Policy in use
    pub fn policy(&self) -> LoudnessPolicy {
        self.policy
    }

    /// Estimate the loudness of `frame`
    ///
    /// # Example
    /// ```
    /// use audiofft_core::audio::loudness::{LoudnessEstimator, LoudnessPolicy};
    ///
    /// let estimator = LoudnessEstimator::new(LoudnessPolicy::DbMapped);
    /// assert_eq!(estimator.estimate(&[0.0; 512]), 0.3);
    /// ```
    pub fn estimate(&self, frame: &[f32]) -> f32 {
        let mean_square = mean_square(frame);
        match self.policy {
            LoudnessPolicy::Rms => mean_square.sqrt(),
            LoudnessPolicy::DbMapped => db_mapped(mean_square),
        }
    }
}

/// Mean of squared samples, non-finite samples count as silence
fn mean_square(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f32 = frame
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| s * s)
        .sum();
    sum / frame.len() as f32
}

fn db_mapped(mean_square: f32) -> f32 {
    if mean_square <= 0.0 || !mean_square.is_finite() {
        return DB_MAPPED_FLOOR;
    }
    let db = 10.0 * mean_square.log10() + SPL_SHIFT - SPL_WINDOW_FLOOR;
    let range = DB_MAPPED_CEILING - DB_MAPPED_FLOOR;
    (DB_MAPPED_FLOOR + db * range / DB_WINDOW).clamp(DB_MAPPED_FLOOR, DB_MAPPED_CEILING)
}
