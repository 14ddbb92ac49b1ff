//! Output sinks for the streaming encoder.
//!
//! The encoder appends sequentially and, once at the end, seeks back to patch
//! the WAV header. Sinks that cannot seek report `io::ErrorKind::Unsupported`.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;

/// Append-then-patch byte sink.
pub trait AudioSink: Send {
    /// Append `bytes` at the current end of the sink.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Overwrite `bytes` at absolute `offset`; later appends still go to the end.
    fn seek_write(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;

    /// Total bytes in the sink, including anything still buffered.
    fn len(&self) -> io::Result<u64>;

    /// Push buffered bytes to the underlying storage.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).append(bytes)
    }

    fn seek_write(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        (**self).seek_write(offset, bytes)
    }

    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// File-backed sink.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }
        let file = File::create(&path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)
    }

    fn seek_write(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.seek(SeekFrom::End(0))?;
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

/// In-memory sink. Contents stay reachable through [`MemorySinkHandle`]
/// after the sink itself has been moved into an encoder.
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Arc<Mutex<Vec<u8>>>,
}

/// Read-only view of a [`MemorySink`]'s bytes.
#[derive(Debug, Clone)]
pub struct MemorySinkHandle {
    data: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemorySinkHandle {
        MemorySinkHandle {
            data: Arc::clone(&self.data),
        }
    }
}

impl MemorySinkHandle {
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl AudioSink for MemorySink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.data.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn seek_write(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start + bytes.len();
        let mut data = self.data.lock();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.data.lock().len() as u64)
    }
}

/// Append-only sink over any writer (pipes, sockets, stdout).
///
/// Header patching fails with `Unsupported`, leaving the zeroed placeholders.
#[derive(Debug)]
pub struct StreamSink<W: Write + Send> {
    writer: W,
    written: u64,
}

impl<W: Write + Send> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> AudioSink for StreamSink<W> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn seek_write(&mut self, _offset: u64, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "stream sink cannot seek"))
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Coalesces small appends into `capacity`-sized writes on the inner sink.
///
/// Pending bytes are flushed before any seek-write so header patches land
/// after the payload they describe.
pub struct BufferedSink<S: AudioSink> {
    inner: S,
    buffer: Vec<u8>,
    capacity: usize,
}

impl<S: AudioSink> BufferedSink<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.inner.append(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}

impl<S: AudioSink> AudioSink for BufferedSink<S> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.buffer.len() + bytes.len() > self.capacity {
            self.flush_buffer()?;
        }
        if bytes.len() >= self.capacity {
            self.inner.append(bytes)
        } else {
            self.buffer.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn seek_write(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.seek_write(offset, bytes)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.inner.len()? + self.buffer.len() as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.flush()
    }
}

impl<S: AudioSink> Drop for BufferedSink<S> {
    fn drop(&mut self) {
        if let Err(e) = self.flush_buffer() {
            log::warn!("Dropped {} buffered bytes: {}", self.buffer.len(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wav_recorder_sink_test_{}", name))
    }

    #[test]
    fn memory_sink_append_and_patch() {
        let mut sink = MemorySink::new();
        let handle = sink.handle();
        sink.append(b"hello world").unwrap();
        sink.seek_write(0, b"J").unwrap();
        sink.append(b"!").unwrap();

        assert_eq!(handle.contents(), b"Jello world!");
        assert_eq!(sink.len().unwrap(), 12);
    }

    #[test]
    fn memory_sink_patch_past_end_extends() {
        let mut sink = MemorySink::new();
        let handle = sink.handle();
        sink.seek_write(2, b"ab").unwrap();
        assert_eq!(handle.contents(), vec![0, 0, b'a', b'b']);
    }

    #[test]
    fn file_sink_patch_keeps_appending_at_end() {
        let path = temp_file_path("file_sink.bin");
        let mut sink = FileSink::create(&path).unwrap();
        sink.append(b"0123456789").unwrap();
        sink.seek_write(4, b"xy").unwrap();
        sink.append(b"AB").unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.len().unwrap(), 12);
        assert_eq!(fs::read(&path).unwrap(), b"0123xy6789AB");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn file_sink_creates_parent_directories() {
        let dir = temp_file_path("nested_dir");
        let path = dir.join("a").join("b.wav");
        let sink = FileSink::create(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stream_sink_cannot_seek() {
        let mut sink = StreamSink::new(Vec::new());
        sink.append(b"abc").unwrap();
        let err = sink.seek_write(0, b"z").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(sink.len().unwrap(), 3);
        assert_eq!(sink.into_inner(), b"abc");
    }

    #[test]
    fn buffered_sink_coalesces_until_capacity() {
        let inner = MemorySink::new();
        let handle = inner.handle();
        let mut sink = BufferedSink::new(inner, 8);

        sink.append(b"abc").unwrap();
        sink.append(b"def").unwrap();
        assert!(handle.is_empty());
        assert_eq!(sink.pending(), 6);
        assert_eq!(sink.len().unwrap(), 6);

        sink.append(b"ghi").unwrap();
        assert_eq!(handle.contents(), b"abcdef");
        assert_eq!(sink.pending(), 3);

        sink.flush().unwrap();
        assert_eq!(handle.contents(), b"abcdefghi");
    }

    #[test]
    fn buffered_sink_large_write_bypasses_buffer() {
        let inner = MemorySink::new();
        let handle = inner.handle();
        let mut sink = BufferedSink::new(inner, 4);

        sink.append(b"ab").unwrap();
        sink.append(b"0123456789").unwrap();
        assert_eq!(handle.contents(), b"ab0123456789");
        assert_eq!(sink.pending(), 0);
    }

    #[test]
    fn buffered_sink_flushes_before_seek_write() {
        let inner = MemorySink::new();
        let handle = inner.handle();
        let mut sink = BufferedSink::new(inner, 64);

        sink.append(b"RIFF----").unwrap();
        sink.seek_write(4, b"1234").unwrap();
        assert_eq!(handle.contents(), b"RIFF1234");
    }

    #[test]
    fn buffered_sink_flushes_on_drop() {
        let inner = MemorySink::new();
        let handle = inner.handle();
        {
            let mut sink = BufferedSink::new(inner, 64);
            sink.append(b"tail").unwrap();
        }
        assert_eq!(handle.contents(), b"tail");
    }
}
