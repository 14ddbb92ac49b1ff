/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ↔ paused
///            ↓         ↓
///          stopped ←───┘
/// ```
///
/// A stopped session accepts a new `start_recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether a session is live (recording or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    /// Whether `start_recording` may be called.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }
}
