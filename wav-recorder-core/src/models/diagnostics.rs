use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of streaming-loop counters, for debugging sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub buffers_read: u64,
    pub bytes_written: u64,
    pub empty_reads: u64,
    pub recoverable_errors: u64,
}

/// Lock-free counters written by the streaming loop.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCounters {
    buffers_read: AtomicU64,
    bytes_written: AtomicU64,
    empty_reads: AtomicU64,
    recoverable_errors: AtomicU64,
}

impl DiagnosticCounters {
    pub(crate) fn record_buffer(&self, bytes: usize) {
        self.buffers_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_read(&self) {
        self.empty_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recoverable_error(&self) {
        self.recoverable_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.buffers_read.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.empty_reads.store(0, Ordering::Relaxed);
        self.recoverable_errors.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionDiagnostics {
        SessionDiagnostics {
            buffers_read: self.buffers_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            recoverable_errors: self.recoverable_errors.load(Ordering::Relaxed),
        }
    }
}
