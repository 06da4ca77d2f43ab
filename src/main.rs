//! audiofft - spectrum analyzer demo
//!
//! Plays a synthesized tone through the in-memory transport and prints the
//! analysis stream to the terminal.

use anyhow::{Context, Result};
use audiofft::{
    AnalysisEngine, AnalysisEvent, AnalyzerConfig, BandingMethod, MemoryLibrary,
    MemoryTransport, PcmBuffer, PlayerEvent,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const SOURCE_URI: &str = "mem://demo-tone";
const DEMO_SAMPLE_RATE: u32 = 44100;

/// Command line options
struct Options {
    config: Option<PathBuf>,
    frequency: f32,
    seconds: f64,
    num_bands: Option<usize>,
    method: Option<BandingMethod>,
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("audiofft=info".parse()?)
                .add_directive("audiofft_core=info".parse()?),
        )
        .init();

    let options = match parse_args()? {
        Some(options) => options,
        None => return Ok(()),
    };

    let mut config = match &options.config {
        Some(path) => AnalyzerConfig::load_from(path),
        None => AnalyzerConfig::default(),
    };
    if let Some(bands) = options.num_bands {
        config.num_bands = bands;
    }
    if let Some(method) = options.method {
        config.banding_method = method;
    }

    run(config, &options)
}

fn parse_args() -> Result<Option<Options>> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config: None,
        frequency: 440.0,
        seconds: 5.0,
        num_bands: None,
        method: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .with_context(|| format!("{} requires a value", args[i]))
        };
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("audiofft {} ({})", audiofft::VERSION, audiofft::BUILD_DATE);
                return Ok(None);
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--config" | "-c" => {
                options.config = Some(PathBuf::from(value(i)?));
                i += 1;
            }
            "--frequency" | "-f" => {
                options.frequency = value(i)?.parse().context("Invalid frequency")?;
                i += 1;
            }
            "--duration" | "-d" => {
                options.seconds = value(i)?.parse().context("Invalid duration")?;
                i += 1;
            }
            "--bands" | "-b" => {
                options.num_bands = Some(value(i)?.parse().context("Invalid band count")?);
                i += 1;
            }
            "--method" | "-m" => {
                options.method = Some(value(i)?.parse()?);
                i += 1;
            }
            "--json" => options.json = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return Ok(None);
            }
        }
        i += 1;
    }
    Ok(Some(options))
}

fn print_help() {
    println!("Usage: audiofft [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH       Load analyzer config from a JSON file");
    println!("  -f, --frequency HZ      Tone frequency (default: 440)");
    println!("  -d, --duration SECS     Tone length (default: 5)");
    println!("  -b, --bands N           Number of display bands");
    println!("  -m, --method NAME       logarithmic, linear, avg, min or max");
    println!("      --json              Print events as JSON lines");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
}

fn run(config: AnalyzerConfig, options: &Options) -> Result<()> {
    let tone = PcmBuffer::sine(options.frequency, 0.5, options.seconds, DEMO_SAMPLE_RATE);
    let library = MemoryLibrary::new().with_source(SOURCE_URI, tone);

    let (mut engine, stream) = AnalysisEngine::start(library, MemoryTransport::new(), config)?;
    let metadata = engine.load(SOURCE_URI)?;
    info!(
        "Playing {:.0} Hz tone for {:.1}s @ {} Hz",
        options.frequency, metadata.duration_seconds, metadata.sample_rate
    );
    engine.play()?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        error!("Failed to install Ctrl+C handler: {}", e);
    }

    while running.load(Ordering::SeqCst) {
        match stream.recv_timeout(Duration::from_millis(100)) {
            Ok(PlayerEvent::Analysis(event)) => {
                if options.json {
                    println!("{}", serde_json::to_string(&PlayerEvent::Analysis(event))?);
                } else {
                    print_analysis(&event);
                    stream.recycle(event);
                }
            }
            Ok(PlayerEvent::Progress(progress)) => {
                if options.json {
                    println!("{}", serde_json::to_string(&PlayerEvent::Progress(progress))?);
                } else {
                    println!("── {:>6.2}s / {:.2}s", progress.current_time, metadata.duration_seconds);
                }
            }
            Err(_) => {
                if !engine.is_playing() && engine.current_time() >= metadata.duration_seconds {
                    break;
                }
            }
        }
    }

    engine.stop()?;
    let stats = engine.stats();
    engine.shutdown();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// One line per event: time, loudness and the loudest band
fn print_analysis(event: &AnalysisEvent) {
    let (band, magnitude) = event
        .band_magnitudes
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0f32), |best, (i, m)| if m > best.1 { (i, m) } else { best });
    let frequency = event.band_frequencies.get(band).copied().unwrap_or(0.0);
    println!(
        "{:>6.2}s | loudness {:.3} | peak band {:>3} ({:>7.1} Hz) {:>8.2}",
        event.current_time, event.loudness, band, frequency, magnitude
    );
}
