/// WAV header codec.
///
/// Builds the canonical 44-byte PCM RIFF header with zeroed length fields and
/// patches those fields in place once the final stream size is known.
use crate::models::error::CaptureError;
use crate::models::format::{PcmFormat, BITS_PER_SAMPLE};
use crate::storage::sink::AudioSink;

/// Size of the canonical WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size (file size - 8).
pub const RIFF_CHUNK_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size.
pub const DATA_CHUNK_SIZE_OFFSET: u64 = 40;

/// Bytes counted by the RIFF chunk size ahead of the payload.
const RIFF_OVERHEAD: u32 = 36;

const PCM_FORMAT_TAG: u16 = 1;
const PCM_FMT_CHUNK_SIZE: u32 = 16;

/// Decoded view of a canonical 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: PcmFormat,
    pub riff_chunk_size: u32,
    pub data_chunk_size: u32,
}

impl WavHeader {
    /// Header with placeholder (zero) length fields.
    pub fn placeholder(format: PcmFormat) -> Self {
        Self {
            format,
            riff_chunk_size: 0,
            data_chunk_size: 0,
        }
    }

    /// Header describing a finished stream of `data_chunk_size` payload bytes.
    pub fn for_payload(format: PcmFormat, data_chunk_size: u32) -> Self {
        Self {
            format,
            riff_chunk_size: data_chunk_size.saturating_add(RIFF_OVERHEAD),
            data_chunk_size,
        }
    }

    /// Encode the header.
    ///
    /// Layout (little-endian):
    /// ```text
    /// [0-3]    "RIFF"
    /// [4-7]    riff chunk size = file size - 8
    /// [8-11]   "WAVE"
    /// [12-15]  "fmt "
    /// [16-19]  16 (PCM format chunk size)
    /// [20-21]  1 (PCM format code)
    /// [22-23]  channels
    /// [24-27]  sample_rate
    /// [28-31]  byte_rate = sample_rate * channels * 2
    /// [32-33]  block_align = channels * 2
    /// [34-35]  16 (bits per sample)
    /// [36-39]  "data"
    /// [40-43]  data chunk size
    /// ```
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let format = &self.format;
        let mut header = [0u8; WAV_HEADER_SIZE];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.riff_chunk_size.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&PCM_FMT_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
        header[22..24].copy_from_slice(&format.channels().to_le_bytes());
        header[24..28].copy_from_slice(&format.sample_rate().to_le_bytes());
        header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&format.bits_per_sample().to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_chunk_size.to_le_bytes());

        header
    }

    /// Decode a canonical PCM header from the first 44 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(CaptureError::InvalidFormat(format!(
                "header needs {} bytes, got {}",
                WAV_HEADER_SIZE,
                bytes.len()
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(CaptureError::InvalidFormat("missing RIFF/WAVE magic".into()));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(CaptureError::InvalidFormat("not a canonical 44-byte PCM header".into()));
        }
        if read_u32(bytes, 16) != PCM_FMT_CHUNK_SIZE || read_u16(bytes, 20) != PCM_FORMAT_TAG {
            return Err(CaptureError::InvalidFormat("not PCM".into()));
        }
        let bits = read_u16(bytes, 34);
        if bits != BITS_PER_SAMPLE {
            return Err(CaptureError::InvalidFormat(format!("unsupported bit depth: {}", bits)));
        }

        let format = PcmFormat::new(read_u32(bytes, 24), read_u16(bytes, 22))?;
        if read_u32(bytes, 28) != format.byte_rate() || read_u16(bytes, 32) != format.block_align() {
            return Err(CaptureError::InvalidFormat("byte rate / block align mismatch".into()));
        }

        Ok(Self {
            format,
            riff_chunk_size: read_u32(bytes, 4),
            data_chunk_size: read_u32(bytes, 40),
        })
    }
}

/// Placeholder header for `format`, written at stream start.
pub fn build_header(format: &PcmFormat) -> [u8; WAV_HEADER_SIZE] {
    WavHeader::placeholder(*format).to_bytes()
}

/// Overwrite the RIFF (offset 4) and data (offset 40) size fields in `sink`.
///
/// `total_file_size` includes the header. Sizes beyond the 32-bit RIFF limit
/// are clamped to `u32::MAX`.
pub fn patch_lengths(sink: &mut dyn AudioSink, total_file_size: u64) -> Result<(), CaptureError> {
    let data_size = total_file_size.saturating_sub(WAV_HEADER_SIZE as u64);
    let data_size = u32::try_from(data_size).unwrap_or_else(|_| {
        log::warn!("WAV payload of {} bytes exceeds the RIFF size limit", data_size);
        u32::MAX
    });
    let riff_size = data_size.saturating_add(RIFF_OVERHEAD);

    sink.seek_write(RIFF_CHUNK_SIZE_OFFSET, &riff_size.to_le_bytes())
        .map_err(CaptureError::header_patch)?;
    sink.seek_write(DATA_CHUNK_SIZE_OFFSET, &data_size.to_le_bytes())
        .map_err(CaptureError::header_patch)?;
    Ok(())
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
