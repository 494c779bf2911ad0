//! Error types for the signer module.

use provenant_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Errors that can occur while building or using a signer.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Key material, certificates or algorithm choice are unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote signer could not be reached or answered with a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The sign-function failed.
    #[error("signing failed: {0:#}")]
    SignFailed(#[source] anyhow::Error),

    /// The signature is longer than the signer's declared capacity.
    #[error("signature of {actual} bytes exceeds capacity of {capacity} bytes")]
    Capacity { actual: usize, capacity: usize },

    /// The signer has been closed.
    #[error("signer is closed")]
    Closed,

    /// Normalization or encoding failure from core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SignerError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignerError::Configuration(_) => ErrorKind::Configuration,
            SignerError::Transport(_) => ErrorKind::Transport,
            SignerError::SignFailed(_) => ErrorKind::Signing,
            SignerError::Capacity { .. } => ErrorKind::Capacity,
            SignerError::Closed => ErrorKind::ResourceState,
            SignerError::Core(e) => e.kind(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SignerError::Configuration(msg.into())
    }
}

/// Result type for signer operations.
pub type Result<T> = std::result::Result<T, SignerError>;
