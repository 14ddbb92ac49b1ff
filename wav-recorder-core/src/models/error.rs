use std::io;

use thiserror::Error;

/// Errors that can occur while recording a WAV stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Audio-capture authorization is missing. Raised before any resource is acquired.
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    /// Transient device status. Retried inside the streaming loop, never surfaced.
    #[error("recoverable read error: {0}")]
    RecoverableRead(String),

    #[error("unrecoverable read error: {0}")]
    UnrecoverableRead(String),

    #[error("sink write failed: {0}")]
    SinkWrite(String),

    /// The sink cannot seek back to patch the header length fields.
    #[error("sink does not support seeking; WAV header left unpatched")]
    UnseekableSink,

    #[error("encoder is closed")]
    EncoderClosed,

    #[error("encoder was never opened")]
    EncoderNotOpen,

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Map an I/O failure raised while appending audio data.
    pub(crate) fn sink_write(e: io::Error) -> Self {
        Self::SinkWrite(e.to_string())
    }

    /// Map an I/O failure raised while patching the header.
    ///
    /// `Unsupported` means the sink has no random access.
    pub(crate) fn header_patch(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::Unsupported {
            Self::UnseekableSink
        } else {
            Self::StorageError(format!("header patch failed: {}", e))
        }
    }
}
