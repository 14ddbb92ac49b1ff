use crate::models::recording_result::RecordingResult;
use crate::models::state::RecordingState;

/// Event delegate for recording session notifications.
///
/// Called on the thread that invoked the session operation, never from the
/// streaming loop. Implementations should marshal to the UI thread if needed.
pub trait RecordingDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: RecordingState);

    /// Called when a recording has been finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
