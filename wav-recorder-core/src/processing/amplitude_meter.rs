use std::sync::atomic::{AtomicU32, Ordering};

/// Largest magnitude a signed 16-bit sample reports.
pub const MAX_AMPLITUDE: u32 = i16::MAX as u32;

/// Peak-since-last-read meter for 16-bit little-endian PCM.
///
/// Written by the streaming loop, drained by a UI poller. Both sides are
/// lock-free; a sample landing exactly on a read boundary may be attributed
/// to either window.
#[derive(Debug, Default)]
pub struct AmplitudeMeter {
    peak: AtomicU32,
}

impl AmplitudeMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a buffer of interleaved signed 16-bit LE samples into the peak.
    ///
    /// A trailing odd byte is ignored.
    pub fn observe(&self, pcm: &[u8]) {
        let batch_peak = pcm
            .chunks_exact(2)
            .map(|pair| sample_magnitude(i16::from_le_bytes([pair[0], pair[1]])))
            .max()
            .unwrap_or(0);

        if batch_peak > 0 {
            self.peak.fetch_max(batch_peak, Ordering::Relaxed);
        }
    }

    /// Peak since the previous call, then reset to 0.
    pub fn read_and_reset(&self) -> u32 {
        self.peak.swap(0, Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.peak.store(0, Ordering::Relaxed);
    }
}

/// `|sample|`, with `i16::MIN` clamped into the [0, 32767] range.
fn sample_magnitude(sample: i16) -> u32 {
    u32::from(sample.unsigned_abs()).min(MAX_AMPLITUDE)
}
