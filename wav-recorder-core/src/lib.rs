//! # wav-recorder-core
//!
//! Streaming PCM-to-WAV recorder core.
//!
//! Turns an unbounded sequence of 16-bit PCM buffers from a capture device
//! into a valid WAV file, patching the header lengths once recording ends,
//! while exposing a lock-free peak amplitude for VU-meter style UIs.
//! Platform backends implement `CaptureProvider` and plug into the generic
//! `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! wav-recorder-core (this crate)
//! ├── traits/       ← CaptureProvider, CaptureStream, SoundRecorder, RecordingDelegate
//! ├── models/       ← CaptureError, PcmFormat, RecorderConfig, RecordingState, etc.
//! ├── processing/   ← WAV header codec, AmplitudeMeter
//! ├── session/      ← RecordingSession (state machine + streaming loop), Destination
//! └── storage/      ← AudioSink implementations, StreamingEncoder, metadata
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::{BufferingPolicy, RecorderConfig};
pub use models::diagnostics::SessionDiagnostics;
pub use models::error::CaptureError;
pub use models::format::PcmFormat;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::RecordingState;
pub use processing::amplitude_meter::AmplitudeMeter;
pub use processing::wav_format::{WavHeader, WAV_HEADER_SIZE};
pub use session::destination::Destination;
pub use session::recording::{RecordingSession, FILE_EXTENSION, MIME_TYPE};
pub use storage::encoder::{FinalizedStream, StreamingEncoder};
pub use storage::sink::{AudioSink, BufferedSink, FileSink, MemorySink, MemorySinkHandle, StreamSink};
pub use traits::capture_provider::{CaptureProvider, CaptureStream, ReadOutcome};
pub use traits::recording_delegate::RecordingDelegate;
pub use traits::sound_recorder::SoundRecorder;
