use crate::models::error::CaptureError;
use crate::session::destination::Destination;

/// Public recorder surface.
///
/// Operations take `&self`: a recorder is shared between a UI thread that
/// drives it and polls the amplitude, and its own streaming worker.
pub trait SoundRecorder: Send + Sync {
    /// Start recording into `destination`. Transitions: idle/stopped → recording.
    fn start_recording(&self, destination: Destination) -> Result<(), CaptureError>;

    /// Stop and finalize. Returns `false` if no recording was active.
    fn stop_recording(&self) -> bool;

    /// Transitions: recording → paused. Returns `false` otherwise.
    fn pause_recording(&self) -> bool;

    /// Transitions: paused → recording. Returns `false` otherwise.
    fn resume_recording(&self) -> bool;

    /// Peak sample magnitude (0..=32767) since the previous call.
    fn current_amplitude(&self) -> u32;

    fn file_extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}
