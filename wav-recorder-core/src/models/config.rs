use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::format::PcmFormat;

/// Default write buffer for [`BufferingPolicy::Buffered`].
pub const DEFAULT_WRITE_BUFFER_CAPACITY: usize = 64 * 1024;

/// How the encoder pushes PCM bytes into its sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BufferingPolicy {
    /// Every capture buffer goes straight to the sink.
    Direct,
    /// Capture buffers are coalesced in memory and flushed in `capacity`-sized writes.
    Buffered { capacity: usize },
}

impl Default for BufferingPolicy {
    fn default() -> Self {
        Self::Buffered {
            capacity: DEFAULT_WRITE_BUFFER_CAPACITY,
        }
    }
}

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of interleaved channels (default: 2). Valid values: 1, 2.
    pub channels: u16,

    /// Bytes requested from the capture stream per read.
    ///
    /// `None` picks twice a 20 ms block at the configured format.
    pub buffer_size_bytes: Option<usize>,

    /// Direct or buffered writes into the sink (default: buffered, 64 KiB).
    pub buffering: BufferingPolicy,

    /// Write `<recording>.metadata.json` next to file recordings.
    pub write_metadata: bool,

    /// Compute a SHA-256 checksum of finished file recordings.
    pub compute_checksum: bool,
}

impl RecorderConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidFormat(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        let format = self.pcm_format()?;
        if let Some(size) = self.buffer_size_bytes {
            let block_align = usize::from(format.block_align());
            if size == 0 || size % block_align != 0 {
                return Err(CaptureError::InvalidFormat(format!(
                    "buffer size {} is not a positive multiple of the {}-byte frame",
                    size, block_align
                )));
            }
        }
        if let BufferingPolicy::Buffered { capacity: 0 } = self.buffering {
            return Err(CaptureError::InvalidFormat("write buffer capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn pcm_format(&self) -> Result<PcmFormat, CaptureError> {
        PcmFormat::new(self.sample_rate, self.channels)
    }

    /// Effective read size for the capture stream.
    pub fn read_buffer_size(&self, format: &PcmFormat) -> usize {
        self.buffer_size_bytes.unwrap_or_else(|| {
            // 20 ms worth of frames, doubled
            let frames = (format.sample_rate() as usize / 50).max(1);
            2 * frames * usize::from(format.block_align())
        })
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let format = PcmFormat::default();
        Self {
            sample_rate: format.sample_rate(),
            channels: format.channels(),
            buffer_size_bytes: None,
            buffering: BufferingPolicy::default(),
            write_metadata: false,
            compute_checksum: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_cd_quality() {
        let config = RecorderConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pcm_format().unwrap(), PcmFormat::CD_QUALITY);
    }

    #[test]
    fn default_read_size_is_two_20ms_blocks() {
        let config = RecorderConfig::default();
        let format = config.pcm_format().unwrap();
        // 882 frames * 4 bytes * 2
        assert_eq!(config.read_buffer_size(&format), 7056);
    }

    #[test]
    fn explicit_read_size_must_be_frame_aligned() {
        let config = RecorderConfig {
            buffer_size_bytes: Some(4098),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CaptureError::InvalidFormat(_))));

        let config = RecorderConfig {
            buffer_size_bytes: Some(4096),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn zero_write_buffer_rejected() {
        let config = RecorderConfig {
            buffering: BufferingPolicy::Buffered { capacity: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_json() {
        let config = RecorderConfig::from_json(
            r#"{ "sample_rate": 48000, "channels": 1, "buffering": { "mode": "direct" } }"#,
        )
        .unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.buffering, BufferingPolicy::Direct);
        assert!(config.compute_checksum);
        assert!(!config.write_metadata);
    }

    #[test]
    fn json_with_bad_channels_fails_validation() {
        let err = RecorderConfig::from_json(r#"{ "channels": 6 }"#).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidFormat(_)));
    }
}
