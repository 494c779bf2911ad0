//! Error types for the stream module.

use provenant_core::ErrorKind;
use thiserror::Error;

use crate::traits::SeekMode;

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The backend does not implement this operation.
    #[error("{op} is not supported by {backend} streams")]
    Unsupported {
        op: &'static str,
        backend: &'static str,
    },

    /// The stream has been closed.
    #[error("{backend} stream is closed")]
    Closed { backend: &'static str },

    /// A seek would leave the stream's valid range.
    #[error("seek to {offset} from {mode:?} leaves [0, {len}]")]
    InvalidSeek {
        offset: i64,
        mode: SeekMode,
        len: u64,
    },

    /// I/O error from the backing store or a caller-supplied callback.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::Unsupported { .. } => ErrorKind::UnsupportedOperation,
            StreamError::Closed { .. } => ErrorKind::ResourceState,
            StreamError::InvalidSeek { .. } => ErrorKind::InvalidInput,
            StreamError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;
