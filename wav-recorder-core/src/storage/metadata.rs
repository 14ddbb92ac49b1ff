use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `{recording}.metadata.json` next to it.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

/// SHA-256 hex digest of a finished file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::PcmFormat;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wav_recorder_metadata_test_{}", name))
    }

    #[test]
    fn sidecar_sits_next_to_recording() {
        let path = Path::new("/tmp/take_01.wav");
        assert_eq!(metadata_path(path), PathBuf::from("/tmp/take_01.metadata.json"));
    }

    #[test]
    fn metadata_round_trip() {
        let recording = temp_file_path("roundtrip.wav");
        let metadata = RecordingMetadata::new(
            &PcmFormat::CD_QUALITY,
            176_400,
            Some(&recording.to_string_lossy()),
            Some("abc123"),
            "audio/wav",
        );

        let written = write_metadata(&metadata, &recording).unwrap();
        let loaded = read_metadata(&recording).unwrap();
        assert_eq!(loaded, metadata);
        assert_eq!(loaded.sample_rate, 44_100);
        assert_eq!(loaded.bits_per_sample, 16);
        approx::assert_relative_eq!(loaded.duration_secs, 1.0);

        fs::remove_file(written).ok();
    }

    #[test]
    fn missing_sidecar_is_storage_error() {
        let err = read_metadata(&temp_file_path("does_not_exist.wav")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
    }

    #[test]
    fn checksum_of_known_content() {
        let path = temp_file_path("checksum.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        fs::remove_file(&path).ok();
    }
}
