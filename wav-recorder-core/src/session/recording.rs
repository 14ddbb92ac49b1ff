use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::RecorderConfig;
use crate::models::diagnostics::{DiagnosticCounters, SessionDiagnostics};
use crate::models::error::CaptureError;
use crate::models::format::PcmFormat;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecordingState;
use crate::processing::amplitude_meter::AmplitudeMeter;
use crate::session::destination::Destination;
use crate::session::streaming_loop::{LoopControl, LoopStatus, StreamSlot, StreamingLoop};
use crate::storage::encoder::{FinalizedStream, StreamingEncoder};
use crate::storage::metadata;
use crate::traits::capture_provider::{CaptureProvider, CaptureStream};
use crate::traits::recording_delegate::RecordingDelegate;
use crate::traits::sound_recorder::SoundRecorder;

/// File extension of recordings produced by [`RecordingSession`].
pub const FILE_EXTENSION: &str = "wav";

/// MIME type of recordings produced by [`RecordingSession`].
pub const MIME_TYPE: &str = "audio/wav";

/// Resources of a live (recording or paused) session.
struct ActiveRecording {
    stream: StreamSlot,
    control: Arc<LoopControl>,
    worker: thread::JoinHandle<StreamingEncoder>,
    file_path: Option<PathBuf>,
}

impl ActiveRecording {
    fn stream(&self) -> Option<Arc<dyn CaptureStream>> {
        self.stream.lock().clone()
    }
}

/// Caller-side session state, protected by `parking_lot::Mutex`.
struct SessionInner {
    state: RecordingState,
    active: Option<ActiveRecording>,
    last_result: Option<RecordingResult>,
}

/// Records one capture stream into one WAV destination at a time.
///
/// Data flow:
/// ```text
/// [CaptureStream] → streaming loop ─┬→ [AmplitudeMeter]   (side channel)
///                                   └→ [StreamingEncoder] → [AudioSink]
/// ```
///
/// The streaming loop runs on its own thread. `stop_recording` joins it
/// before finalizing, so the encoder is never touched by two threads.
pub struct RecordingSession<P: CaptureProvider> {
    provider: P,
    config: RecorderConfig,
    format: PcmFormat,
    meter: Arc<AmplitudeMeter>,
    counters: Arc<DiagnosticCounters>,
    inner: Mutex<SessionInner>,
    delegate: Option<Arc<dyn RecordingDelegate>>,
}

impl<P: CaptureProvider> RecordingSession<P> {
    pub fn new(provider: P, config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate()?;
        let format = config.pcm_format()?;
        Ok(Self::from_parts(provider, config, format))
    }

    /// Session recording 44.1 kHz stereo with default settings.
    pub fn with_defaults(provider: P) -> Self {
        Self::from_parts(provider, RecorderConfig::default(), PcmFormat::default())
    }

    fn from_parts(provider: P, config: RecorderConfig, format: PcmFormat) -> Self {
        Self {
            provider,
            config,
            format,
            meter: Arc::new(AmplitudeMeter::new()),
            counters: Arc::new(DiagnosticCounters::default()),
            inner: Mutex::new(SessionInner {
                state: RecordingState::Idle,
                active: None,
                last_result: None,
            }),
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecordingDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecordingState {
        self.inner.lock().state
    }

    /// Whether the streaming loop is still consuming capture data.
    ///
    /// Turns false while the session is still recording or paused if the loop
    /// hit an unrecoverable read or write error. `stop_recording` still
    /// finalizes whatever was captured.
    pub fn is_streaming(&self) -> bool {
        self.inner
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| !matches!(active.control.status(), LoopStatus::Stopped))
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.counters.snapshot()
    }

    /// Result of the most recent successfully finalized recording.
    pub fn take_last_result(&self) -> Option<RecordingResult> {
        self.inner.lock().last_result.take()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn format(&self) -> &PcmFormat {
        &self.format
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // --- Internal helpers ---

    fn notify_state(&self, state: RecordingState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }

    /// Open capture, encoder and worker. Releases everything acquired on failure.
    fn launch(&self, destination: Destination) -> Result<ActiveRecording, CaptureError> {
        if !self.provider.check_permission()? {
            return Err(CaptureError::PermissionDenied);
        }

        let stream = self.provider.open(&self.format)?;

        let (sink, file_path) = match destination.open() {
            Ok(opened) => opened,
            Err(e) => {
                stream.release();
                return Err(e);
            }
        };

        let mut encoder = StreamingEncoder::new(self.format, self.config.buffering);
        if let Err(e) = encoder.open(sink) {
            stream.release();
            discard_partial_file(file_path.as_deref());
            return Err(e);
        }

        if let Err(e) = stream.start() {
            log::error!("Failed to start capture: {}", e);
            stream.release();
            drop(encoder);
            discard_partial_file(file_path.as_deref());
            return Err(match e {
                e @ CaptureError::DeviceUnavailable(_) => e,
                other => CaptureError::DeviceUnavailable(other.to_string()),
            });
        }

        self.meter.reset();
        self.counters.reset();

        let slot: StreamSlot = Arc::new(Mutex::new(Some(Arc::clone(&stream))));
        let control = Arc::new(LoopControl::new());
        let pump = StreamingLoop {
            stream: Arc::clone(&slot),
            control: Arc::clone(&control),
            meter: Arc::clone(&self.meter),
            counters: Arc::clone(&self.counters),
            encoder,
            buffer_size: self.config.read_buffer_size(&self.format),
        };

        let worker = thread::Builder::new()
            .name("wav-streaming-loop".into())
            .spawn(move || pump.run());

        match worker {
            Ok(worker) => Ok(ActiveRecording {
                stream: slot,
                control,
                worker,
                file_path,
            }),
            Err(e) => {
                if let Err(stop_err) = stream.stop() {
                    log::warn!("Failed to stop capture: {}", stop_err);
                }
                stream.release();
                discard_partial_file(file_path.as_deref());
                Err(CaptureError::Unknown(format!("failed to spawn streaming thread: {}", e)))
            }
        }
    }

    /// Finalize the encoder handed back by the loop and build the result.
    fn finish(&self, mut encoder: StreamingEncoder, file_path: Option<PathBuf>) -> Option<RecordingResult> {
        let finalized = match encoder.finalize() {
            Ok(Some(finalized)) => finalized,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Failed to finalize recording: {}", e);
                return None;
            }
        };
        Some(self.build_result(finalized, file_path))
    }

    fn build_result(&self, finalized: FinalizedStream, file_path: Option<PathBuf>) -> RecordingResult {
        let checksum = match (&file_path, self.config.compute_checksum) {
            (Some(path), true) => match metadata::sha256_file(path) {
                Ok(checksum) => Some(checksum),
                Err(e) => {
                    log::warn!("Checksum unavailable: {}", e);
                    None
                }
            },
            _ => None,
        };

        let path_string = file_path.as_ref().map(|p| p.to_string_lossy().into_owned());
        let metadata = RecordingMetadata::new(
            &finalized.format,
            finalized.data_bytes,
            path_string.as_deref(),
            checksum.as_deref(),
            MIME_TYPE,
        );

        if let (Some(path), true) = (&file_path, self.config.write_metadata) {
            if let Err(e) = metadata::write_metadata(&metadata, path) {
                log::warn!("Failed to write metadata sidecar: {}", e);
            }
        }

        RecordingResult {
            file_path,
            format: finalized.format,
            data_bytes: finalized.data_bytes,
            duration_secs: metadata.duration_secs,
            checksum,
            metadata,
        }
    }
}

impl<P: CaptureProvider> SoundRecorder for RecordingSession<P> {
    fn start_recording(&self, destination: Destination) -> Result<(), CaptureError> {
        {
            let mut inner = self.inner.lock();
            if !inner.state.can_start() {
                return Err(CaptureError::InvalidState(format!(
                    "cannot start while {:?}",
                    inner.state
                )));
            }

            let active = self.launch(destination)?;
            log::info!(
                "Recording started: {} Hz, {} ch, destination {:?}",
                self.format.sample_rate(),
                self.format.channels(),
                active.file_path
            );
            inner.active = Some(active);
            inner.state = RecordingState::Recording;
        }
        self.notify_state(RecordingState::Recording);
        Ok(())
    }

    fn stop_recording(&self) -> bool {
        let result = {
            let mut inner = self.inner.lock();
            let Some(active) = inner.active.take() else {
                return false;
            };

            active.control.request_stop();
            active.worker.thread().unpark();
            let encoder = match active.worker.join() {
                Ok(encoder) => Some(encoder),
                Err(_) => {
                    log::error!("Streaming loop panicked; recording left unfinalized");
                    None
                }
            };

            if let Some(stream) = active.stream.lock().take() {
                if let Err(e) = stream.stop() {
                    log::warn!("Failed to stop capture: {}", e);
                }
                stream.release();
            }

            let result = encoder.and_then(|encoder| self.finish(encoder, active.file_path));
            inner.state = RecordingState::Stopped;
            inner.last_result = result.clone();
            result
        };

        log::info!("Recording stopped");
        self.notify_state(RecordingState::Stopped);
        if let (Some(delegate), Some(result)) = (&self.delegate, &result) {
            delegate.on_recording_finished(result);
        }
        true
    }

    fn pause_recording(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.is_recording() {
                return false;
            }
            let Some(active) = inner.active.as_ref() else {
                return false;
            };

            // Pause the loop before stopping the device so an in-flight read
            // failing on the stopped stream is not taken as fatal.
            if !active.control.pause() {
                log::warn!("Streaming loop has exited; nothing to pause");
                return false;
            }
            if let Some(stream) = active.stream() {
                if let Err(e) = stream.stop() {
                    log::warn!("Failed to stop capture on pause: {}", e);
                }
            }
            inner.state = RecordingState::Paused;
        }
        log::info!("Recording paused");
        self.notify_state(RecordingState::Paused);
        true
    }

    fn resume_recording(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.is_paused() {
                return false;
            }
            let Some(active) = inner.active.as_ref() else {
                return false;
            };

            if active.control.status() != LoopStatus::Paused {
                log::warn!("Streaming loop has exited; not restarting capture");
                return false;
            }

            let stream = active.stream();
            if let Some(ref stream) = stream {
                if let Err(e) = stream.start() {
                    log::error!("Failed to restart capture: {}", e);
                    return false;
                }
            }
            if !active.control.resume() {
                if let Some(stream) = stream {
                    if let Err(e) = stream.stop() {
                        log::warn!("Failed to stop capture: {}", e);
                    }
                }
                return false;
            }
            active.worker.thread().unpark();
            inner.state = RecordingState::Recording;
        }
        log::info!("Recording resumed");
        self.notify_state(RecordingState::Recording);
        true
    }

    fn current_amplitude(&self) -> u32 {
        self.meter.read_and_reset()
    }

    fn file_extension(&self) -> &'static str {
        FILE_EXTENSION
    }

    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }
}

impl<P: CaptureProvider> Drop for RecordingSession<P> {
    fn drop(&mut self) {
        if self.inner.get_mut().active.is_some() {
            log::warn!("Recording session dropped while active; finalizing");
            self.stop_recording();
        }
    }
}

/// Remove a file holding nothing but a placeholder header.
fn discard_partial_file(path: Option<&Path>) {
    if let Some(path) = path {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove partial recording {:?}: {}", path, e);
        }
    }
}
