use serde::Serialize;

use super::error::CaptureError;

/// The only sample width this recorder encodes.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Immutable description of the PCM stream for one session.
///
/// Always signed 16-bit little-endian, interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PcmFormat {
    sample_rate: u32,
    channels: u16,
}

impl PcmFormat {
    /// 44.1 kHz stereo, the reference recording format.
    pub const CD_QUALITY: PcmFormat = PcmFormat {
        sample_rate: 44_100,
        channels: 2,
    };

    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, CaptureError> {
        if sample_rate == 0 {
            return Err(CaptureError::InvalidFormat("sample rate must be positive".into()));
        }
        if ![1, 2].contains(&channels) {
            return Err(CaptureError::InvalidFormat(format!(
                "unsupported channel count: {}",
                channels
            )));
        }
        // byte_rate must fit the 32-bit header field
        if u64::from(sample_rate) * u64::from(channels) * 2 > u64::from(u32::MAX) {
            return Err(CaptureError::InvalidFormat(format!(
                "sample rate too high: {}",
                sample_rate
            )));
        }
        Ok(Self { sample_rate, channels })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    /// Bytes per multi-channel frame.
    pub fn block_align(&self) -> u16 {
        self.channels * (BITS_PER_SAMPLE / 8)
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    /// Playback duration of `data_bytes` of PCM payload.
    pub fn duration_secs(&self, data_bytes: u64) -> f64 {
        data_bytes as f64 / f64::from(self.byte_rate())
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::CD_QUALITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_fields_for_cd_quality() {
        let format = PcmFormat::CD_QUALITY;
        assert_eq!(format.block_align(), 4);
        assert_eq!(format.byte_rate(), 176_400);
        assert_eq!(format.bits_per_sample(), 16);
    }

    #[test]
    fn derived_fields_for_mono() {
        let format = PcmFormat::new(16_000, 1).unwrap();
        assert_eq!(format.block_align(), 2);
        assert_eq!(format.byte_rate(), 32_000);
    }

    #[test]
    fn rejects_bad_channel_counts() {
        assert!(matches!(PcmFormat::new(44_100, 0), Err(CaptureError::InvalidFormat(_))));
        assert!(matches!(PcmFormat::new(44_100, 3), Err(CaptureError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(PcmFormat::new(0, 2).is_err());
    }

    #[test]
    fn duration_from_payload() {
        let format = PcmFormat::CD_QUALITY;
        assert_relative_eq!(format.duration_secs(176_400), 1.0);
        assert_relative_eq!(format.duration_secs(44_100), 0.25);
        assert_relative_eq!(format.duration_secs(0), 0.0);
    }
}
