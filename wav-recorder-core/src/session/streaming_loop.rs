use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::diagnostics::DiagnosticCounters;
use crate::models::error::CaptureError;
use crate::processing::amplitude_meter::AmplitudeMeter;
use crate::storage::encoder::StreamingEncoder;
use crate::traits::capture_provider::{CaptureStream, ReadOutcome};

/// Upper bound on how long a paused loop sleeps between status checks.
/// Resume and stop unpark the loop immediately.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared slot holding the capture stream. Emptied on teardown.
pub(crate) type StreamSlot = Arc<Mutex<Option<Arc<dyn CaptureStream>>>>;

/// Streaming-loop status, shared between the caller thread and the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum LoopStatus {
    Running = 0,
    Paused = 1,
    StopRequested = 2,
    /// The loop has exited, either on request or after a fatal error.
    Stopped = 3,
}

impl LoopStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Paused,
            2 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LoopControl {
    status: AtomicU8,
    /// Bumped on every successful pause.
    pauses: AtomicU32,
}

impl LoopControl {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicU8::new(LoopStatus::Running as u8),
            pauses: AtomicU32::new(0),
        }
    }

    pub(crate) fn status(&self) -> LoopStatus {
        LoopStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Running → Paused. A loop that already exited stays stopped.
    pub(crate) fn pause(&self) -> bool {
        let paused = self.transition(LoopStatus::Running, LoopStatus::Paused);
        if paused {
            self.pauses.fetch_add(1, Ordering::AcqRel);
        }
        paused
    }

    fn pause_generation(&self) -> u32 {
        self.pauses.load(Ordering::Acquire)
    }

    /// Paused → Running.
    pub(crate) fn resume(&self) -> bool {
        self.transition(LoopStatus::Paused, LoopStatus::Running)
    }

    pub(crate) fn request_stop(&self) {
        let _ = self
            .status
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != LoopStatus::Stopped as u8).then_some(LoopStatus::StopRequested as u8)
            });
    }

    fn mark_stopped(&self) {
        self.status.store(LoopStatus::Stopped as u8, Ordering::Release);
    }

    fn transition(&self, from: LoopStatus, to: LoopStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Capture → meter → encoder pump, run on a dedicated thread per session.
///
/// Owns the encoder for its whole lifetime and hands it back on exit, so
/// finalize can only happen after the thread is joined.
pub(crate) struct StreamingLoop {
    pub(crate) stream: StreamSlot,
    pub(crate) control: Arc<LoopControl>,
    pub(crate) meter: Arc<AmplitudeMeter>,
    pub(crate) counters: Arc<DiagnosticCounters>,
    pub(crate) encoder: StreamingEncoder,
    pub(crate) buffer_size: usize,
}

impl StreamingLoop {
    pub(crate) fn run(mut self) -> StreamingEncoder {
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            match self.control.status() {
                LoopStatus::Running => {}
                LoopStatus::Paused => {
                    thread::park_timeout(PAUSE_POLL_INTERVAL);
                    continue;
                }
                LoopStatus::StopRequested | LoopStatus::Stopped => break,
            }

            let Some(stream) = self.stream.lock().clone() else {
                log::error!("Capture stream released while streaming; stopping");
                break;
            };

            let generation = self.control.pause_generation();
            match stream.read(&mut buffer) {
                ReadOutcome::Data(0) => self.counters.record_empty_read(),
                ReadOutcome::Data(len) => {
                    if len > buffer.len() {
                        log::warn!("Capture reported {} bytes for a {}-byte buffer", len, buffer.len());
                    }
                    let pcm = &buffer[..len.min(buffer.len())];
                    self.meter.observe(pcm);
                    if let Err(e) = self.encoder.write_samples(pcm) {
                        log::error!("Failed to write audio stream: {}", e);
                        break;
                    }
                    self.counters.record_buffer(pcm.len());
                }
                ReadOutcome::Recoverable(reason) => {
                    log::debug!("{}; retrying", CaptureError::RecoverableRead(reason));
                    self.counters.record_recoverable_error();
                }
                ReadOutcome::Unrecoverable(reason) => {
                    // A stream stopped by pause/stop may fail its in-flight read,
                    // even if a resume already followed.
                    if self.control.status() != LoopStatus::Running
                        || self.control.pause_generation() != generation
                    {
                        log::debug!("Ignoring read failure after pause: {}", reason);
                        continue;
                    }
                    log::error!("Streaming loop stopping: {}", CaptureError::UnrecoverableRead(reason));
                    break;
                }
            }
        }

        self.control.mark_stopped();
        log::debug!("Streaming loop exited after {} bytes", self.encoder.bytes_written());
        self.encoder
    }
}
