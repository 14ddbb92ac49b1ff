use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::PcmFormat;

/// Outcome of a finished recording, available after `stop_recording`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    /// `None` when the destination was a caller-supplied sink.
    pub file_path: Option<PathBuf>,
    pub format: PcmFormat,
    /// PCM payload bytes (excludes the 44-byte header).
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: Option<String>,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
///
/// Serializable as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: Option<String>,
    pub mime_type: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: Option<String>,
}

impl RecordingMetadata {
    pub fn new(
        format: &PcmFormat,
        data_bytes: u64,
        file_path: Option<&str>,
        checksum: Option<&str>,
        mime_type: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.map(str::to_string),
            mime_type: mime_type.to_string(),
            sample_rate: format.sample_rate(),
            channels: format.channels(),
            bits_per_sample: format.bits_per_sample(),
            data_bytes,
            duration_secs: format.duration_secs(data_bytes),
            checksum: checksum.map(str::to_string),
        }
    }
}
