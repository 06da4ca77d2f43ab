//! Analyzer configuration
//!
//! Every knob of the analysis path lives in [`AnalyzerConfig`]. The struct is
//! serde-backed so a JSON file can override any subset of fields; missing
//! fields fall back to the defaults below.

use crate::audio::banding::{BandingConfig, BandingMethod};
use crate::audio::loudness::LoudnessPolicy;
use crate::audio::spectrum::{WindowFunction, MAX_WINDOW_SIZE, MIN_WINDOW_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Rejected configuration values
///
/// A rejected value never replaces the configuration that is already active.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Window size {0} must be a power of two between 16 and 65536")]
    InvalidWindowSize(usize),

    #[error("Band count {0} must be between 1 and 16384")]
    InvalidBandCount(usize),

    #[error("Unknown banding method: {0:?}")]
    UnknownBandingMethod(String),

    #[error("Buffer size must be greater than zero")]
    InvalidBufferSize,

    #[error("Smoothing factor {0} must be in (0, 1]")]
    InvalidSmoothing(f32),

    #[error("Magnitude scale {0} must be finite and positive")]
    InvalidMagnitudeScale(f32),

    #[error("Linear frequency range {min}..{max} Hz is empty or negative")]
    InvalidFrequencyRange { min: f64, max: f64 },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// How the render thread paces itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Sleep one buffer duration per rendered buffer
    #[default]
    RealTime,
    /// Render as fast as possible
    Freewheel,
}

fn default_window_size() -> usize {
    crate::DEFAULT_WINDOW_SIZE
}

fn default_buffer_size() -> usize {
    crate::DEFAULT_BUFFER_SIZE
}

fn default_skip_count() -> u32 {
    crate::DEFAULT_SKIP_COUNT
}

fn default_magnitude_scale() -> f32 {
    1.0
}

fn default_num_bands() -> usize {
    crate::DEFAULT_NUM_BANDS
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    64
}

/// Complete analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// FFT window size N (power of two)
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Samples rendered per buffer
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Buffers skipped between analyzed ones
    #[serde(default = "default_skip_count")]
    pub skip_count: u32,
    #[serde(default)]
    pub loudness: LoudnessPolicy,
    #[serde(default)]
    pub window_function: WindowFunction,
    /// Multiplier applied to every FFT magnitude
    #[serde(default = "default_magnitude_scale")]
    pub magnitude_scale: f32,
    /// Initial band count
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    /// Initial banding method
    #[serde(default)]
    pub banding_method: BandingMethod,
    /// Exponential smoothing factor, `None` disables smoothing
    #[serde(default)]
    pub smoothing: Option<f32>,
    /// Lower bound of linear banding in Hz
    #[serde(default)]
    pub linear_min_frequency: f64,
    /// Upper bound of linear banding in Hz (`None` = Nyquist)
    #[serde(default)]
    pub linear_max_frequency: Option<f64>,
    /// Progress event cadence in milliseconds
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Bounded event channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default)]
    pub pacing: Pacing,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            buffer_size: default_buffer_size(),
            skip_count: default_skip_count(),
            loudness: LoudnessPolicy::default(),
            window_function: WindowFunction::default(),
            magnitude_scale: default_magnitude_scale(),
            num_bands: default_num_bands(),
            banding_method: BandingMethod::default(),
            smoothing: None,
            linear_min_frequency: 0.0,
            linear_max_frequency: None,
            progress_interval_ms: default_progress_interval_ms(),
            event_capacity: default_event_capacity(),
            pacing: Pacing::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Check every field, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_size.is_power_of_two()
            || !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&self.window_size)
        {
            return Err(ConfigError::InvalidWindowSize(self.window_size));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }
        if !self.magnitude_scale.is_finite() || self.magnitude_scale <= 0.0 {
            return Err(ConfigError::InvalidMagnitudeScale(self.magnitude_scale));
        }
        self.banding()?;
        if let Some(alpha) = self.smoothing {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ConfigError::InvalidSmoothing(alpha));
            }
        }
        let min = self.linear_min_frequency;
        let max = self.linear_max_frequency.unwrap_or(f64::INFINITY);
        if !min.is_finite() || min < 0.0 || max.is_nan() || max <= min {
            return Err(ConfigError::InvalidFrequencyRange { min, max });
        }
        if self.progress_interval_ms == 0 {
            return Err(ConfigError::ZeroValue("progress_interval_ms"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroValue("event_capacity"));
        }
        Ok(())
    }

    /// Initial banding options as a validated [`BandingConfig`]
    pub fn banding(&self) -> Result<BandingConfig, ConfigError> {
        BandingConfig::new(self.num_bands, self.banding_method)
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "Loaded analyzer config");
                        config
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Invalid analyzer config, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse analyzer config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No analyzer config found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Analyzer config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.window_size, 2048);
        assert_eq!(config.buffer_size, 2048);
        assert!(config.buffer_size >= config.window_size);
        assert_eq!(config.skip_count, 2);
        assert_eq!(config.num_bands, 80);
        assert_eq!(config.banding_method, BandingMethod::Logarithmic);
        assert_eq!(config.loudness, LoudnessPolicy::DbMapped);
        assert_eq!(config.progress_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"num_bands": 32, "banding_method": "avg", "pacing": "freewheel"}"#;
        let config: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_bands, 32);
        assert_eq!(config.banding_method, BandingMethod::Average);
        assert_eq!(config.pacing, Pacing::Freewheel);
        assert_eq!(config.window_size, 2048);
    }

    #[test]
    fn test_round_trip() {
        let config = AnalyzerConfig {
            window_size: 4096,
            loudness: LoudnessPolicy::Rms,
            window_function: WindowFunction::Hann,
            smoothing: Some(0.9),
            linear_max_frequency: Some(8000.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = |f: fn(&mut AnalyzerConfig)| {
            let mut config = AnalyzerConfig::default();
            f(&mut config);
            config.validate().unwrap_err()
        };
        assert_eq!(bad(|c| c.window_size = 1000), ConfigError::InvalidWindowSize(1000));
        assert_eq!(bad(|c| c.num_bands = 0), ConfigError::InvalidBandCount(0));
        assert_eq!(bad(|c| c.buffer_size = 0), ConfigError::InvalidBufferSize);
        assert_eq!(bad(|c| c.smoothing = Some(0.0)), ConfigError::InvalidSmoothing(0.0));
        assert_eq!(bad(|c| c.smoothing = Some(1.5)), ConfigError::InvalidSmoothing(1.5));
        assert!(matches!(
            bad(|c| c.magnitude_scale = f32::NAN),
            ConfigError::InvalidMagnitudeScale(_)
        ));
        assert!(matches!(
            bad(|c| c.linear_max_frequency = Some(0.0)),
            ConfigError::InvalidFrequencyRange { .. }
        ));
        assert_eq!(
            bad(|c| c.event_capacity = 0),
            ConfigError::ZeroValue("event_capacity")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("analyzer.json");

        let config = AnalyzerConfig {
            num_bands: 48,
            banding_method: BandingMethod::Max,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = AnalyzerConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert_eq!(AnalyzerConfig::load_from(&missing), AnalyzerConfig::default());

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert_eq!(AnalyzerConfig::load_from(&garbage), AnalyzerConfig::default());

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"window_size": 3}"#).unwrap();
        assert_eq!(AnalyzerConfig::load_from(&invalid), AnalyzerConfig::default());
    }
}
