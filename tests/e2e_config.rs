//! E2E tests for analyzer configuration
//!
//! Tests file round-trip, defaults, partial files, and that rejected
//! configuration never replaces what is active.

use audiofft::audio::loudness::LoudnessPolicy;
use audiofft::audio::spectrum::WindowFunction;
use audiofft::{
    AnalysisEngine, AnalysisPipeline, AnalyzerConfig, BandingConfig, BandingMethod, ConfigError,
    EngineError, MemoryLibrary, MemoryTransport,
};

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audiofft").join("config.json");

    let config = AnalyzerConfig {
        window_size: 4096,
        buffer_size: 512,
        skip_count: 0,
        loudness: LoudnessPolicy::Rms,
        window_function: WindowFunction::Hamming,
        num_bands: 64,
        banding_method: BandingMethod::Linear,
        smoothing: Some(0.5),
        linear_min_frequency: 50.0,
        linear_max_frequency: Some(12000.0),
        ..Default::default()
    };
    config.save(&path).unwrap();
    assert_eq!(AnalyzerConfig::load_from(&path), config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"banding_method": "min", "num_bands": 20}"#).unwrap();

    let config = AnalyzerConfig::load_from(&path);
    assert_eq!(config.banding_method, BandingMethod::Min);
    assert_eq!(config.num_bands, 20);
    assert_eq!(config.window_size, audiofft::DEFAULT_WINDOW_SIZE);
    assert_eq!(config.buffer_size, audiofft::DEFAULT_BUFFER_SIZE);
    assert_eq!(config.skip_count, audiofft::DEFAULT_SKIP_COUNT);
}

#[test]
fn test_invalid_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"num_bands": 0}"#).unwrap();
    assert_eq!(AnalyzerConfig::load_from(&path), AnalyzerConfig::default());
}

#[test]
fn test_config_json_field_names() {
    let json = serde_json::to_value(AnalyzerConfig::default()).unwrap();
    assert_eq!(json["window_size"], 2048);
    assert_eq!(json["banding_method"], "logarithmic");
    assert_eq!(json["loudness"], "db_mapped");
    assert_eq!(json["window_function"], "rectangular");
    assert_eq!(json["pacing"], "real_time");
}

#[test]
fn test_banding_method_names() {
    for (name, method) in [
        ("logarithmic", BandingMethod::Logarithmic),
        ("log", BandingMethod::Logarithmic),
        ("linear", BandingMethod::Linear),
        ("avg", BandingMethod::Average),
        ("average", BandingMethod::Average),
        ("min", BandingMethod::Min),
        ("MAX", BandingMethod::Max),
    ] {
        assert_eq!(name.parse::<BandingMethod>().unwrap(), method, "{}", name);
    }
    assert!(matches!(
        "spline".parse::<BandingMethod>(),
        Err(ConfigError::UnknownBandingMethod(_))
    ));
}

#[test]
fn test_rejected_banding_keeps_previous() {
    let mut pipeline = AnalysisPipeline::from_config(&AnalyzerConfig::default()).unwrap();
    let before = pipeline.banding().load();
    assert!(BandingConfig::new(0, BandingMethod::Linear).is_err());
    assert_eq!(pipeline.banding().load(), before);
    assert_eq!(pipeline.analyze(&[0.0; 64], 48000, 0.0).band_magnitudes.len(), 80);
}

#[test]
fn test_engine_rejects_bad_config() {
    let config = AnalyzerConfig {
        smoothing: Some(2.0),
        ..Default::default()
    };
    let result = AnalysisEngine::start(MemoryLibrary::new(), MemoryTransport::new(), config);
    assert!(matches!(
        result,
        Err(EngineError::Config(ConfigError::InvalidSmoothing(_)))
    ));
}
