use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::format::PcmFormat;

/// Result of one blocking read from a capture stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes of interleaved 16-bit LE PCM were placed at the front of the buffer.
    /// `0` means nothing was available yet.
    Data(usize),
    /// Transient device hiccup; the caller retries.
    Recoverable(String),
    /// The device is gone or the read was invalid; the caller must stop.
    Unrecoverable(String),
}

/// Platform audio capture source.
///
/// Implemented by platform backends; the session only sees this interface.
pub trait CaptureProvider: Send + Sync {
    /// Whether audio-capture authorization has been granted.
    fn check_permission(&self) -> Result<bool, CaptureError>;

    /// Open a capture stream delivering `format`.
    ///
    /// Fails with `CaptureError::DeviceUnavailable` if the device cannot be opened.
    fn open(&self, format: &PcmFormat) -> Result<Arc<dyn CaptureStream>, CaptureError>;
}

/// An opened capture stream.
///
/// Shared between the caller thread (`start`/`stop`) and the streaming loop
/// (`read`), so every method takes `&self`.
pub trait CaptureStream: Send + Sync {
    /// Start (or restart after `stop`) delivering samples.
    fn start(&self) -> Result<(), CaptureError>;

    /// Stop delivering samples and release the hardware. The stream may be restarted.
    fn stop(&self) -> Result<(), CaptureError>;

    /// Block until samples or a status are available.
    ///
    /// Must return promptly; the streaming loop imposes no timeout.
    fn read(&self, buffer: &mut [u8]) -> ReadOutcome;

    /// Release the stream for good. Called once, after the loop has exited.
    fn release(&self) {}
}
