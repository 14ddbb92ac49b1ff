use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::storage::sink::{AudioSink, FileSink};

/// Where a recording is written.
pub enum Destination {
    /// A file, created (or truncated) when recording starts.
    File(PathBuf),
    /// A caller-supplied sink. It must support seek-write for the header to be patched.
    Sink(Box<dyn AudioSink>),
}

impl Destination {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn sink(sink: impl AudioSink + 'static) -> Self {
        Self::Sink(Box::new(sink))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Sink(_) => None,
        }
    }

    /// Materialize the sink. Returns the file path for file destinations.
    pub(crate) fn open(self) -> Result<(Box<dyn AudioSink>, Option<PathBuf>), CaptureError> {
        match self {
            Self::File(path) => {
                let sink = FileSink::create(&path)?;
                Ok((Box::new(sink), Some(path)))
            }
            Self::Sink(sink) => Ok((sink, None)),
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Sink(_) => f.write_str("Sink(..)"),
        }
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}
