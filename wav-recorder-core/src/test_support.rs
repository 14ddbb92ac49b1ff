//! Scripted capture backend for driving sessions deterministically in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::format::PcmFormat;
use crate::traits::capture_provider::{CaptureProvider, CaptureStream, ReadOutcome};

const IDLE_READ_DELAY: Duration = Duration::from_millis(1);

/// Encode samples as 16-bit little-endian PCM.
pub(crate) fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

pub(crate) enum Step {
    Data(Vec<u8>),
    Recoverable,
    Unrecoverable,
}

/// Capture stream that replays queued steps while started.
///
/// A stopped stream, or one with an empty queue, behaves like a device with
/// no samples ready: each read waits briefly and returns `Data(0)`.
#[derive(Default)]
pub(crate) struct ScriptedStream {
    steps: Mutex<VecDeque<Step>>,
    running: AtomicBool,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    released: AtomicBool,
}

impl ScriptedStream {
    pub(crate) fn push(&self, step: Step) {
        self.steps.lock().push_back(step);
    }

    pub(crate) fn push_samples(&self, samples: &[i16]) {
        self.push(Step::Data(pcm(samples)));
    }

    pub(crate) fn remaining(&self) -> usize {
        self.steps.lock().len()
    }

    pub(crate) fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl CaptureStream for ScriptedStream {
    fn start(&self) -> Result<(), CaptureError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable("scripted start failure".into()));
        }
        self.released.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self, buffer: &mut [u8]) -> ReadOutcome {
        let step = if self.is_running() {
            self.steps.lock().pop_front()
        } else {
            None
        };

        match step {
            None => {
                thread::sleep(IDLE_READ_DELAY);
                ReadOutcome::Data(0)
            }
            Some(Step::Data(bytes)) => {
                let len = bytes.len().min(buffer.len());
                buffer[..len].copy_from_slice(&bytes[..len]);
                ReadOutcome::Data(len)
            }
            Some(Step::Recoverable) => ReadOutcome::Recoverable("scripted hiccup".into()),
            Some(Step::Unrecoverable) => ReadOutcome::Unrecoverable("scripted device loss".into()),
        }
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Provider handing out a single shared [`ScriptedStream`].
pub(crate) struct ScriptedProvider {
    stream: Arc<ScriptedStream>,
    permission: bool,
    available: bool,
    opens: AtomicUsize,
    last_format: Mutex<Option<PcmFormat>>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            stream: Arc::new(ScriptedStream::default()),
            permission: true,
            available: true,
            opens: AtomicUsize::new(0),
            last_format: Mutex::new(None),
        }
    }

    pub(crate) fn without_permission() -> Self {
        Self {
            permission: false,
            ..Self::new()
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub(crate) fn stream(&self) -> Arc<ScriptedStream> {
        Arc::clone(&self.stream)
    }

    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn last_format(&self) -> Option<PcmFormat> {
        *self.last_format.lock()
    }
}

impl CaptureProvider for ScriptedProvider {
    fn check_permission(&self) -> Result<bool, CaptureError> {
        Ok(self.permission)
    }

    fn open(&self, format: &PcmFormat) -> Result<Arc<dyn CaptureStream>, CaptureError> {
        if !self.available {
            return Err(CaptureError::DeviceUnavailable("no scripted device".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_format.lock() = Some(*format);
        Ok(Arc::clone(&self.stream) as Arc<dyn CaptureStream>)
    }
}
