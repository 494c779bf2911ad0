//! Error types for Provenant Core.
//!
//! [`ErrorKind`] is the stable discriminant shared by every crate in the
//! workspace. Each crate has its own error enum, and each of them maps onto
//! one of these kinds through a `kind()` method.

use std::fmt;

use thiserror::Error;

/// Stable, programmatic classification of every failure the library reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing key material, or an algorithm the chosen backend
    /// cannot serve. Raised at construction time, never retried.
    Configuration,
    /// Network failure or non-success response from a remote signer.
    Transport,
    /// A reserved region is too small for what has to be written into it.
    Capacity,
    /// The operation is not implemented by this stream backend.
    UnsupportedOperation,
    /// The resource has been closed, or a protocol step is out of order.
    ResourceState,
    /// The sign-function itself failed.
    Signing,
    /// The caller passed arguments that cannot be honoured.
    InvalidInput,
    /// The underlying byte store failed.
    Io,
}

impl ErrorKind {
    /// Short, stable name for logs and foreign bindings.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::Capacity => "capacity",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::ResourceState => "resource_state",
            ErrorKind::Signing => "signing",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the pure computations in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown signing algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),

    #[error("malformed DER signature: {0}")]
    MalformedDer(String),

    #[error("signature length {actual} does not match expected {expected} for {algorithm}")]
    SignatureLength {
        algorithm: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid exclusion ranges: {0}")]
    InvalidExclusions(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("envelope of {required} bytes does not fit in {available} reserved bytes")]
    Capacity { required: usize, available: usize },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("invalid mime type: {0}")]
    InvalidMimeType(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl CoreError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::UnknownAlgorithm(_) | CoreError::UnknownHashAlgorithm(_) => {
                ErrorKind::Configuration
            }
            CoreError::MalformedDer(_) | CoreError::SignatureLength { .. } => ErrorKind::Signing,
            CoreError::Capacity { .. } => ErrorKind::Capacity,
            CoreError::InvalidExclusions(_)
            | CoreError::InvalidDigest(_)
            | CoreError::MalformedEnvelope(_)
            | CoreError::InvalidMimeType(_)
            | CoreError::EncodingError(_)
            | CoreError::DecodingError(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
