//! audiofft core - real-time spectral analysis of audio playback
//!
//! Turns the PCM a transport renders into a stream of FFT magnitudes,
//! display bands and a loudness value, together with a playback clock that
//! survives seeks and pauses.

pub mod audio;
pub mod config;
pub mod stats;

pub use audio::banding::{BandingConfig, BandingMethod};
pub use audio::engine::{AnalysisEngine, EngineError};
pub use audio::events::{AnalysisEvent, EventStream, PlayerEvent, ProgressEvent};
pub use audio::pipeline::{AnalysisPipeline, AnalysisResult};
pub use audio::transport::{MemoryLibrary, MemoryTransport, PcmBuffer, SourceMetadata};
pub use config::{AnalyzerConfig, ConfigError, Pacing};
pub use stats::{PipelineStats, StatsSnapshot};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Default FFT window size in samples
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// Default render buffer size in samples, one full analysis window
pub const DEFAULT_BUFFER_SIZE: usize = DEFAULT_WINDOW_SIZE;

/// Buffers skipped between analyzed ones (analyze 1 of 3)
pub const DEFAULT_SKIP_COUNT: u32 = 2;

/// Default number of display bands
pub const DEFAULT_NUM_BANDS: usize = 80;
