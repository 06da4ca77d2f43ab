//! Playback and analysis engine
//!
//! Owns two worker threads:
//! - the render thread, which pulls buffers from the [`Transport`], keeps the
//!   [`PlaybackClock`] in sync and runs the [`AnalysisPipeline`] on them
//! - the progress thread, which publishes the playback position on a fixed
//!   wall-clock cadence
//!
//! Control calls are turned into [`Command`]s on a bounded crossbeam channel
//! and never wait for the render thread. Results come back through the
//! [`EventStream`] returned by [`AnalysisEngine::start`].

use super::banding::{BandingConfig, BandingMethod, SharedBandingConfig};
use super::clock::{PlaybackClock, TransportAction};
use super::events::{self, EventSink, EventStream, SessionCounter};
use super::pipeline::AnalysisPipeline;
use super::transport::{SourceLoader, SourceMetadata, Transport, TransportError};
use crate::config::{AnalyzerConfig, ConfigError, Pacing};
use crate::stats::{PipelineStats, StatsSnapshot};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Pending control commands before `Busy` is reported
const COMMAND_CAPACITY: usize = 64;

/// Errors returned by engine control calls
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] TransportError),

    #[error("Render thread is not running")]
    Disconnected,

    #[error("Command queue is full")]
    Busy,

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

/// Messages from the control side to the render thread
enum Command<S> {
    Load {
        source: S,
        metadata: SourceMetadata,
        session: u64,
    },
    Play,
    Pause,
    Seek(f64),
    Stop,
    Shutdown,
}

/// Playback position published by the render thread
#[derive(Debug, Default)]
struct Position {
    /// `f64` seconds stored as bits
    time_bits: AtomicU64,
    /// Session the time belongs to
    session: AtomicU64,
    playing: AtomicBool,
}

impl Position {
    fn time(&self) -> f64 {
        f64::from_bits(self.time_bits.load(Ordering::Relaxed))
    }

    fn set_time(&self, seconds: f64) {
        self.time_bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    /// Switch to `session`, resetting the time first so readers that see the
    /// new session never see the old time
    fn begin_session(&self, session: u64) {
        self.set_time(0.0);
        self.playing.store(false, Ordering::Relaxed);
        self.session.store(session, Ordering::Release);
    }

    /// Position for `session`, `None` if the render thread has not switched to it
    fn read(&self, session: u64) -> Option<f64> {
        (self.session.load(Ordering::Acquire) == session).then(|| self.time())
    }
}

/// Handle to a running engine
///
/// Dropping the handle shuts both worker threads down.
pub struct AnalysisEngine<L: SourceLoader> {
    loader: L,
    commands: Sender<Command<L::Source>>,
    banding: SharedBandingConfig,
    session: SessionCounter,
    stats: Arc<PipelineStats>,
    position: Arc<Position>,
    /// Control-side view of the loaded source, used to answer `seek`
    metadata: Option<SourceMetadata>,
    render_thread: Option<JoinHandle<()>>,
    progress_thread: Option<JoinHandle<()>>,
    progress_shutdown: Option<Sender<()>>,
}

impl<L: SourceLoader> AnalysisEngine<L> {
    /// Validate `config` and start the worker threads
    ///
    /// # Arguments
    /// * `loader` - Resolves URIs passed to [`Self::load`]
    /// * `transport` - Moved to the render thread
    /// * `config` - Analyzer configuration
    ///
    /// # Returns
    /// The engine handle and the stream its events are delivered on
    pub fn start<T>(
        loader: L,
        transport: T,
        config: AnalyzerConfig,
    ) -> Result<(Self, EventStream), EngineError>
    where
        T: Transport<Source = L::Source>,
    {
        config.validate()?;

        let banding = SharedBandingConfig::new(config.banding()?);
        let stats = Arc::new(PipelineStats::new());
        let session = SessionCounter::new();
        let position = Arc::new(Position::default());
        let pipeline = AnalysisPipeline::new(&config, banding.clone(), Arc::clone(&stats))?;
        let (sink, stream) = events::channel(config.event_capacity, session.clone(), Arc::clone(&stats));
        let (command_tx, command_rx) = crossbeam_channel::bounded(COMMAND_CAPACITY);

        let render = RenderLoop {
            transport,
            clock: PlaybackClock::new(),
            pipeline,
            sink: sink.clone(),
            commands: command_rx,
            position: Arc::clone(&position),
            stats: Arc::clone(&stats),
            buffer: vec![0.0; config.buffer_size],
            session: 0,
            pacing: config.pacing,
            next_deadline: None,
        };
        let render_thread = std::thread::Builder::new()
            .name("audiofft-render".into())
            .spawn(move || render.run())
            .map_err(|source| EngineError::Spawn {
                name: "render",
                source,
            })?;

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let interval = Duration::from_millis(config.progress_interval_ms);
        let ticker_position = Arc::clone(&position);
        let ticker_session = session.clone();
        let progress_thread = std::thread::Builder::new()
            .name("audiofft-progress".into())
            .spawn(move || run_progress(interval, sink, ticker_session, ticker_position, shutdown_rx));
        let progress_thread = match progress_thread {
            Ok(handle) => handle,
            Err(source) => {
                let _ = command_tx.send(Command::Shutdown);
                let _ = render_thread.join();
                return Err(EngineError::Spawn {
                    name: "progress",
                    source,
                });
            }
        };

        tracing::info!(
            window_size = config.window_size,
            buffer_size = config.buffer_size,
            skip_count = config.skip_count,
            num_bands = config.num_bands,
            method = %config.banding_method,
            "Analysis engine started"
        );

        let engine = Self {
            loader,
            commands: command_tx,
            banding,
            session,
            stats,
            position,
            metadata: None,
            render_thread: Some(render_thread),
            progress_thread: Some(progress_thread),
            progress_shutdown: Some(shutdown_tx),
        };
        Ok((engine, stream))
    }

    /// Open `uri` and make it the current source
    ///
    /// On failure nothing changes: the previous source, if any, keeps playing.
    pub fn load(&mut self, uri: &str) -> Result<SourceMetadata, EngineError> {
        let (metadata, source) = self.loader.open(uri).map_err(|e| {
            tracing::warn!(uri, error = %e, "Failed to open source");
            e
        })?;

        // Commit to the new session only once the command is queued
        let session = self.session.current() + 1;
        self.send(Command::Load {
            source,
            metadata,
            session,
        })?;
        self.session.advance();
        self.metadata = Some(metadata);

        tracing::info!(
            uri,
            duration = metadata.duration_seconds,
            sample_rate = metadata.sample_rate,
            channels = metadata.channel_count,
            session,
            "Source loaded"
        );
        Ok(metadata)
    }

    /// Start or resume playback, a no-op before a source is loaded
    pub fn play(&self) -> Result<(), EngineError> {
        if self.metadata.is_none() {
            tracing::debug!("play ignored, no source loaded");
            return Ok(());
        }
        self.send(Command::Play)
    }

    /// Pause playback, a no-op before a source is loaded
    pub fn pause(&self) -> Result<(), EngineError> {
        if self.metadata.is_none() {
            tracing::debug!("pause ignored, no source loaded");
            return Ok(());
        }
        self.send(Command::Pause)
    }

    /// Move playback to `seconds`
    ///
    /// # Returns
    /// The accepted target clamped to `[0, duration]`, or `None` when no
    /// source is loaded or `seconds` is not a number
    pub fn seek(&self, seconds: f64) -> Option<f64> {
        let metadata = self.metadata?;
        if !seconds.is_finite() {
            tracing::warn!(seconds, "Rejected seek target");
            return None;
        }
        let target = seconds.clamp(0.0, metadata.duration_seconds);
        match self.send(Command::Seek(target)) {
            Ok(()) => Some(target),
            Err(e) => {
                tracing::warn!(error = %e, "Seek not delivered");
                None
            }
        }
    }

    /// Stop playback and release the source
    ///
    /// No event of the stopped source is observable on the stream once this
    /// returns `Ok`. On failure the source keeps playing.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.send(Command::Stop)?;
        // Queued events of the old session are filtered by the stream from here on
        self.session.advance();
        self.metadata = None;
        Ok(())
    }

    /// Replace the banding options, effective from the next analyzed buffer
    pub fn set_banding_options(
        &self,
        num_bands: usize,
        method: BandingMethod,
    ) -> Result<(), ConfigError> {
        let config = BandingConfig::new(num_bands, method).map_err(|e| {
            tracing::warn!(num_bands, %method, error = %e, "Rejected banding options");
            e
        })?;
        self.banding.store(config);
        tracing::info!(num_bands, %method, "Banding options updated");
        Ok(())
    }

    /// [`Self::set_banding_options`] with the method given by name
    ///
    /// Accepts "logarithmic", "linear", "avg"/"average", "min" and "max".
    pub fn set_banding_options_str(&self, num_bands: usize, method: &str) -> Result<(), ConfigError> {
        let method = method.parse::<BandingMethod>().map_err(|e| {
            tracing::warn!(method, error = %e, "Rejected banding method");
            e
        })?;
        self.set_banding_options(num_bands, method)
    }

    /// Banding options currently in effect
    pub fn banding(&self) -> BandingConfig {
        self.banding.load().config
    }

    /// Metadata of the loaded source
    pub fn metadata(&self) -> Option<SourceMetadata> {
        self.metadata
    }

    /// Playback position as of the last rendered buffer, 0 when nothing is loaded
    pub fn current_time(&self) -> f64 {
        self.position.read(self.session.current()).unwrap_or(0.0)
    }

    /// Whether the render thread is currently producing audio
    pub fn is_playing(&self) -> bool {
        self.position.read(self.session.current()).is_some()
            && self.position.playing.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop both worker threads and wait for them
    pub fn shutdown(&mut self) {
        if self.render_thread.is_none() && self.progress_thread.is_none() {
            return;
        }
        self.session.advance();
        let _ = self.commands.send(Command::Shutdown);
        self.progress_shutdown.take();

        for handle in [self.render_thread.take(), self.progress_thread.take()]
            .into_iter()
            .flatten()
        {
            if handle.join().is_err() {
                tracing::error!("Engine worker thread panicked");
            }
        }
        tracing::info!("Analysis engine stopped");
    }

    fn send(&self, command: Command<L::Source>) -> Result<(), EngineError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::Busy,
            TrySendError::Disconnected(_) => EngineError::Disconnected,
        })
    }
}

impl<L: SourceLoader> Drop for AnalysisEngine<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State owned by the render thread
struct RenderLoop<T: Transport> {
    transport: T,
    clock: PlaybackClock,
    pipeline: AnalysisPipeline,
    sink: EventSink,
    commands: Receiver<Command<T::Source>>,
    position: Arc<Position>,
    stats: Arc<PipelineStats>,
    /// Render target, one buffer long
    buffer: Vec<f32>,
    /// Session of the loaded source
    session: u64,
    pacing: Pacing,
    next_deadline: Option<Instant>,
}

impl<T: Transport> RenderLoop<T> {
    fn run(mut self) {
        tracing::debug!("Render thread started");
        loop {
            // Apply everything queued since the last buffer
            loop {
                match self.commands.try_recv() {
                    Ok(command) => {
                        if !self.apply(command) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            if !self.transport.is_rendering() {
                self.next_deadline = None;
                match self.commands.recv() {
                    Ok(command) => {
                        if !self.apply(command) {
                            return;
                        }
                    }
                    Err(_) => return,
                }
                continue;
            }

            self.render_buffer();
            self.pace();
        }
    }

    fn render_buffer(&mut self) {
        let written = self.transport.render(&mut self.buffer);
        self.stats.record_rendered();

        let action = self.clock.observe(self.transport.sample_time());
        let current_time = self.clock.current_time();
        self.position.set_time(current_time);

        if written > 0 {
            let sample_rate = self.clock.metadata().map_or(0, |m| m.sample_rate);
            if let Some(result) =
                self.pipeline
                    .process(&self.buffer[..written], sample_rate, current_time)
            {
                self.sink.emit_analysis(&result, self.session);
            }
        }

        if let Some(action) = action {
            tracing::debug!(current_time, "Reached end of source");
            self.perform(action);
        }
    }

    /// Sleep until the next buffer is due in real-time mode
    fn pace(&mut self) {
        if self.pacing == Pacing::Freewheel {
            return;
        }
        let sample_rate = self.clock.metadata().map_or(0, |m| m.sample_rate);
        if sample_rate == 0 {
            return;
        }
        let period = Duration::from_secs_f64(self.buffer.len() as f64 / sample_rate as f64);
        let now = Instant::now();
        let deadline = self.next_deadline.map_or(now + period, |d| d + period);
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_deadline = Some(deadline);
        } else {
            // Fell behind, do not try to catch up
            self.next_deadline = Some(now);
        }
    }

    /// Apply one command, returning `false` when the thread should exit
    fn apply(&mut self, command: Command<T::Source>) -> bool {
        match command {
            Command::Load {
                source,
                metadata,
                session,
            } => {
                self.transport.load(source);
                self.clock.load(metadata);
                self.session = session;
                self.pipeline.reset();
                self.position.begin_session(session);
            }
            Command::Play => match self.clock.play() {
                Some(action) => self.perform(action),
                None => tracing::debug!(state = ?self.clock.state(), "play ignored"),
            },
            Command::Pause => match self.clock.pause() {
                Some(action) => self.perform(action),
                None => tracing::debug!(state = ?self.clock.state(), "pause ignored"),
            },
            Command::Seek(target) => match self.clock.seek(target) {
                Some(outcome) => {
                    self.position.set_time(outcome.target);
                    self.pipeline.reset();
                    if let Some(action) = outcome.action {
                        self.perform(action);
                    }
                }
                None => tracing::debug!(target, "seek ignored"),
            },
            Command::Stop => {
                if let Some(action) = self.clock.stop() {
                    self.perform(action);
                }
                self.position.set_time(0.0);
            }
            Command::Shutdown => {
                self.transport.stop();
                tracing::debug!("Render thread exiting");
                return false;
            }
        }
        true
    }

    fn perform(&mut self, action: TransportAction) {
        match action {
            TransportAction::Resume => self.transport.play(),
            TransportAction::RestartAt(frame) => {
                self.transport.schedule_from(frame);
                self.transport.play();
            }
            TransportAction::Pause => self.transport.pause(),
            TransportAction::Stop => self.transport.stop(),
        }
        self.position
            .playing
            .store(self.clock.is_playing(), Ordering::Relaxed);
    }
}

/// Progress thread body: one event per tick while playing
///
/// Ticks while paused, stopped or before a load emit nothing.
fn run_progress(
    interval: Duration,
    sink: EventSink,
    session: SessionCounter,
    position: Arc<Position>,
    shutdown: Receiver<()>,
) {
    let ticker = crossbeam_channel::tick(interval);
    loop {
        crossbeam_channel::select! {
            recv(ticker) -> _ => {
                let current = session.current();
                if let Some(time) = position.read(current) {
                    if position.playing.load(Ordering::Relaxed) {
                        sink.emit_progress(time, current);
                    }
                }
            }
            recv(shutdown) -> _ => break,
        }
    }
    tracing::debug!("Progress thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::events::PlayerEvent;
    use crate::audio::transport::{MemoryLibrary, MemoryTransport, PcmBuffer};

    fn freewheel() -> AnalyzerConfig {
        AnalyzerConfig {
            pacing: Pacing::Freewheel,
            progress_interval_ms: 20,
            ..Default::default()
        }
    }

    fn library() -> MemoryLibrary {
        MemoryLibrary::new().with_source("mem://tone", PcmBuffer::sine(440.0, 0.5, 1.0, 44100))
    }

    /// Memory transport whose `render` blocks until the test releases it
    struct GatedTransport {
        inner: MemoryTransport,
        gate: Receiver<()>,
        entered: Sender<()>,
    }

    impl Transport for GatedTransport {
        type Source = Arc<PcmBuffer>;

        fn load(&mut self, source: Arc<PcmBuffer>) {
            self.inner.load(source);
        }

        fn play(&mut self) {
            self.inner.play();
        }

        fn pause(&mut self) {
            self.inner.pause();
        }

        fn stop(&mut self) {
            self.inner.stop();
        }

        fn schedule_from(&mut self, start_frame: u64) {
            self.inner.schedule_from(start_frame);
        }

        fn sample_time(&self) -> Option<u64> {
            self.inner.sample_time()
        }

        fn is_rendering(&self) -> bool {
            self.inner.is_rendering()
        }

        fn render(&mut self, out: &mut [f32]) -> usize {
            let _ = self.entered.try_send(());
            // Disconnected once the test drops the sender
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            self.inner.render(out)
        }
    }

    /// Engine with a render thread parked inside `render` and a full command queue
    fn stalled_engine() -> (AnalysisEngine<MemoryLibrary>, EventStream, Sender<()>) {
        let (gate_tx, gate_rx) = crossbeam_channel::bounded(0);
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let transport = GatedTransport {
            inner: MemoryTransport::new(),
            gate: gate_rx,
            entered: entered_tx,
        };
        let library = library().with_source("mem://long", PcmBuffer::sine(1000.0, 0.5, 60.0, 44100));
        let (mut engine, stream) = AnalysisEngine::start(library, transport, freewheel()).unwrap();
        engine.load("mem://long").unwrap();
        engine.play().unwrap();
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let mut queued = 0;
        while engine.seek(1.0).is_some() {
            queued += 1;
            assert!(queued <= COMMAND_CAPACITY, "command queue never filled");
        }
        assert!(matches!(engine.play(), Err(EngineError::Busy)));
        (engine, stream, gate_tx)
    }

    #[test]
    fn test_busy_load_keeps_current_source() {
        let (mut engine, stream, gate) = stalled_engine();
        let before = engine.metadata();

        assert!(matches!(engine.load("mem://tone"), Err(EngineError::Busy)));
        assert_eq!(engine.metadata(), before);
        assert!(matches!(engine.stop(), Err(EngineError::Busy)));
        assert_eq!(engine.metadata(), before);

        // Once the render thread catches up the old source is still live and
        // the queued seeks land on it
        drop(gate);
        let event = loop {
            match stream.recv_timeout(Duration::from_secs(5)).unwrap() {
                PlayerEvent::Analysis(event) if event.current_time >= 1.0 => break event,
                _ => continue,
            }
        };
        assert!(event.current_time < 60.0);
        assert!(engine.current_time() >= 1.0);
        assert_eq!(engine.stats().stale_events, 0);

        engine.load("mem://tone").unwrap();
        assert_eq!(engine.metadata().map(|m| m.total_samples), Some(44100));
    }

    #[test]
    fn test_stop_after_busy_silences_stream() {
        let (mut engine, stream, gate) = stalled_engine();
        drop(gate);
        assert!(stream.recv_timeout(Duration::from_secs(5)).is_ok());

        let deadline = Instant::now() + Duration::from_secs(5);
        while let Err(EngineError::Busy) = engine.stop() {
            assert!(Instant::now() < deadline, "stop never accepted");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(engine.metadata().is_none());
        assert!(stream.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_controls_after_shutdown_report_disconnected() {
        let (mut engine, _stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        let metadata = engine.load("mem://tone").unwrap();
        engine.shutdown();

        assert!(matches!(engine.play(), Err(EngineError::Disconnected)));
        assert!(matches!(engine.stop(), Err(EngineError::Disconnected)));
        assert!(matches!(engine.load("mem://tone"), Err(EngineError::Disconnected)));
        assert_eq!(engine.seek(0.5), None);
        assert_eq!(engine.metadata(), Some(metadata));
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let config = AnalyzerConfig {
            num_bands: 0,
            ..Default::default()
        };
        let result = AnalysisEngine::start(library(), MemoryTransport::new(), config);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::InvalidBandCount(0)))
        ));
    }

    #[test]
    fn test_controls_before_load_are_no_ops() {
        let (engine, stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        assert!(engine.play().is_ok());
        assert!(engine.pause().is_ok());
        assert_eq!(engine.seek(1.0), None);
        assert_eq!(engine.current_time(), 0.0);
        assert!(engine.metadata().is_none());
        assert!(stream.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_load_unknown_source() {
        let (mut engine, _stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        let err = engine.load("mem://missing").unwrap_err();
        assert!(matches!(err, EngineError::Source(TransportError::SourceUnavailable { .. })));
        assert!(engine.metadata().is_none());
    }

    #[test]
    fn test_load_reports_metadata_and_clamps_seek() {
        let (mut engine, _stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        let metadata = engine.load("mem://tone").unwrap();
        assert_eq!(metadata.sample_rate, 44100);
        assert_eq!(metadata.total_samples, 44100);
        assert_eq!(engine.seek(0.25), Some(0.25));
        assert_eq!(engine.seek(5.0), Some(1.0));
        assert_eq!(engine.seek(-1.0), Some(0.0));
        assert_eq!(engine.seek(f64::NAN), None);
    }

    #[test]
    fn test_play_produces_analysis_events() {
        let (mut engine, stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        engine.load("mem://tone").unwrap();
        engine.play().unwrap();

        let event = loop {
            match stream.recv_timeout(Duration::from_secs(5)).unwrap() {
                PlayerEvent::Analysis(event) => break event,
                PlayerEvent::Progress(_) => continue,
            }
        };
        assert_eq!(event.raw_magnitudes.len(), 1024);
        assert_eq!(event.band_magnitudes.len(), 80);
        assert!(event.current_time > 0.0);
        engine.shutdown();
        assert!(engine.stats().buffers_analyzed > 0);
    }

    #[test]
    fn test_banding_options() {
        let (engine, _stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        engine.set_banding_options_str(24, "avg").unwrap();
        assert_eq!(engine.banding(), BandingConfig::new(24, BandingMethod::Average).unwrap());

        assert!(engine.set_banding_options(0, BandingMethod::Linear).is_err());
        assert!(engine.set_banding_options_str(16, "cubic").is_err());
        assert_eq!(engine.banding().num_bands, 24);
        assert_eq!(engine.banding().method, BandingMethod::Average);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut engine, stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        engine.shutdown();
        engine.shutdown();
        assert!(matches!(engine.play(), Ok(())));
        drop(engine);
        assert!(stream.recv().is_err());
    }

    #[test]
    fn test_no_progress_while_paused() {
        let (mut engine, stream) =
            AnalysisEngine::start(library(), MemoryTransport::new(), freewheel()).unwrap();
        engine.load("mem://tone").unwrap();
        engine.play().unwrap();
        while !matches!(
            stream.recv_timeout(Duration::from_secs(5)).unwrap(),
            PlayerEvent::Analysis(_)
        ) {}
        engine.pause().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.is_playing() {
            assert!(Instant::now() < deadline, "pause never applied");
            std::thread::sleep(Duration::from_millis(5));
        }
        // Let a tick that read the old state finish
        std::thread::sleep(Duration::from_millis(30));
        stream.drain();

        // Several 20 ms ticks pass without a progress event
        std::thread::sleep(Duration::from_millis(120));
        assert!(stream
            .drain()
            .iter()
            .all(|event| !matches!(event, PlayerEvent::Progress(_))));
    }

    #[test]
    fn test_position_session_guard() {
        let position = Position::default();
        position.begin_session(3);
        position.set_time(1.5);
        assert_eq!(position.read(3), Some(1.5));
        assert_eq!(position.read(4), None);
    }
}
