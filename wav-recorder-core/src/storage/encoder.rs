use std::mem;

use crate::models::config::BufferingPolicy;
use crate::models::error::CaptureError;
use crate::models::format::PcmFormat;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::storage::sink::{AudioSink, BufferedSink};

enum EncoderState {
    NotStarted,
    Streaming(Box<dyn AudioSink>),
    Closed,
}

/// Summary of a finalized WAV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedStream {
    pub format: PcmFormat,
    /// PCM payload bytes.
    pub data_bytes: u64,
    /// Header plus payload.
    pub total_bytes: u64,
}

/// Streaming WAV writer.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, lengths zeroed until finalize]
/// [raw interleaved 16-bit LE PCM, passed through verbatim...]
/// ```
///
/// Lifecycle: `new` → `open` → `write_samples`* → `finalize`.
pub struct StreamingEncoder {
    format: PcmFormat,
    buffering: BufferingPolicy,
    state: EncoderState,
    bytes_written: u64,
}

impl StreamingEncoder {
    pub fn new(format: PcmFormat, buffering: BufferingPolicy) -> Self {
        Self {
            format,
            buffering,
            state: EncoderState::NotStarted,
            bytes_written: 0,
        }
    }

    /// Take ownership of `sink` and write the placeholder header.
    pub fn open(&mut self, sink: Box<dyn AudioSink>) -> Result<(), CaptureError> {
        match self.state {
            EncoderState::NotStarted => {}
            EncoderState::Streaming(_) => {
                return Err(CaptureError::InvalidState("encoder is already open".into()))
            }
            EncoderState::Closed => return Err(CaptureError::EncoderClosed),
        }

        let mut sink: Box<dyn AudioSink> = match self.buffering {
            BufferingPolicy::Direct => sink,
            BufferingPolicy::Buffered { capacity } => Box::new(BufferedSink::new(sink, capacity)),
        };

        sink.append(&wav_format::build_header(&self.format))
            .map_err(CaptureError::sink_write)?;
        self.state = EncoderState::Streaming(sink);
        log::debug!(
            "WAV encoder opened: {} Hz, {} ch, {:?}",
            self.format.sample_rate(),
            self.format.channels(),
            self.buffering
        );
        Ok(())
    }

    /// Append PCM bytes verbatim.
    pub fn write_samples(&mut self, samples: &[u8]) -> Result<(), CaptureError> {
        let sink = match &mut self.state {
            EncoderState::Streaming(sink) => sink,
            EncoderState::NotStarted => return Err(CaptureError::EncoderNotOpen),
            EncoderState::Closed => return Err(CaptureError::EncoderClosed),
        };
        if samples.is_empty() {
            return Ok(());
        }

        sink.append(samples).map_err(CaptureError::sink_write)?;
        self.bytes_written += samples.len() as u64;
        Ok(())
    }

    /// Patch the header lengths and close the sink.
    ///
    /// Returns `Ok(None)` without touching anything if the encoder was never
    /// opened or is already closed. On a patch failure the sink is still
    /// flushed and closed, leaving the zeroed placeholder lengths in place.
    pub fn finalize(&mut self) -> Result<Option<FinalizedStream>, CaptureError> {
        let mut sink = match mem::replace(&mut self.state, EncoderState::Closed) {
            EncoderState::Streaming(sink) => sink,
            previous => {
                self.state = previous;
                log::warn!("Finalize called on an encoder that is not streaming");
                return Ok(None);
            }
        };

        let total_bytes = WAV_HEADER_SIZE as u64 + self.bytes_written;
        match sink.len() {
            Ok(len) if len != total_bytes => {
                log::warn!("Sink holds {} bytes, encoder wrote {}", len, total_bytes)
            }
            Ok(_) => {}
            Err(e) => log::debug!("Sink length unavailable: {}", e),
        }

        let patched = wav_format::patch_lengths(&mut *sink, total_bytes);
        let flushed = sink
            .flush()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e)));
        drop(sink);

        patched?;
        flushed?;

        log::info!(
            "WAV finalized: {} data bytes ({:.2}s)",
            self.bytes_written,
            self.format.duration_secs(self.bytes_written)
        );
        Ok(Some(FinalizedStream {
            format: self.format,
            data_bytes: self.bytes_written,
            total_bytes,
        }))
    }

    /// PCM payload bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn format(&self) -> &PcmFormat {
        &self.format
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EncoderState::Streaming(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, EncoderState::Closed)
    }
}
