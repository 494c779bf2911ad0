//! Error types for the unified API.

use provenant_core::{CoreError, ErrorKind};
use provenant_signer::SignerError;
use provenant_stream::StreamError;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Core computation error (digests, envelopes, normalization).
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Signer error.
    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    /// Invalid configuration or settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A session step was called out of order or repeated.
    #[error("invalid session state: {0}")]
    State(String),

    /// Caller arguments do not fit the reservation or the asset.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(e) => e.kind(),
            Error::Stream(e) => e.kind(),
            Error::Signer(e) => e.kind(),
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::State(_) => ErrorKind::ResourceState,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, Error>;
