//! audiofft - real-time spectral visualization backend
//!
//! This library re-exports the analysis pipeline, playback clock, engine
//! and statistics from `audiofft-core`.

pub use audiofft_core::audio;
pub use audiofft_core::config;
pub use audiofft_core::stats;

pub use audiofft_core::{
    AnalysisEngine, AnalysisEvent, AnalysisPipeline, AnalysisResult, AnalyzerConfig,
    BandingConfig, BandingMethod, ConfigError, EngineError, EventStream, MemoryLibrary,
    MemoryTransport, Pacing, PcmBuffer, PipelineStats, PlayerEvent, ProgressEvent,
    SourceMetadata, StatsSnapshot,
};
pub use audiofft_core::{
    BUILD_DATE, DEFAULT_BUFFER_SIZE, DEFAULT_NUM_BANDS, DEFAULT_SKIP_COUNT, DEFAULT_WINDOW_SIZE,
    VERSION,
};
