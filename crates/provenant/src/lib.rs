//! # Provenant
//!
//! The unified API for Provenant: signed provenance manifests embedded into
//! media assets through byte streams.
//!
//! ## Overview
//!
//! Provenant provides a portable, host-agnostic library for:
//!
//! - **Streams**: Every asset byte moves through the [`Stream`] contract,
//!   backed by memory, files, or caller closures
//! - **Signers**: Keys, callbacks, remote services, and hardware key stores
//!   behind one [`Signer`] type with a known worst-case signature size
//! - **Embedding**: Single-pass signing, or the two-phase reserve/finalize
//!   protocol for callers that write the asset themselves
//!
//! ## Key Concepts
//!
//! - **Placeholder**: Inert envelope occupying a reserved region of an asset
//! - **Exclusion**: Byte range left out of the asset digest, usually the
//!   placeholder region
//! - **Raw signature**: ECDSA `r || s`, each left-padded to the curve width
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provenant::{init, EmbedConfig, Signer, SigningAlgorithm};
//! use provenant::stream::{MemoryStream, ReadOnlyMemoryStream};
//!
//! fn example(cert_pem: &str, key_pem: &str, photo: Vec<u8>) -> provenant::Result<()> {
//!     let mut signer = Signer::from_keys(SigningAlgorithm::Es256, cert_pem, key_pem, None)?;
//!     let mut session = init().session(EmbedConfig::default())?;
//!
//!     let mut source = ReadOnlyMemoryStream::new(photo);
//!     let mut dest = MemoryStream::new();
//!     let result = session.sign(&mut signer, "image/jpeg", &mut source, &mut dest)?;
//!     println!("wrote {} bytes", result.total_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `provenant::core` - Algorithms, digests, normalization, envelopes
//! - `provenant::stream` - The stream contract and its backends
//! - `provenant::signer` - Signer backends and certificate handling

pub mod config;
pub mod error;
pub mod file;
pub mod hash;
pub mod library;
pub mod session;

// Re-export component crates
pub use provenant_core as core;
pub use provenant_signer as signer;
pub use provenant_stream as stream;

// Re-export main types for convenience
pub use config::EmbedConfig;
pub use error::{Error, Result};
pub use file::{hash_file, sign_file};
pub use hash::hash_stream;
pub use library::{init, Capabilities, Provenant};
pub use session::{EmbedSession, SignResult};

// Re-export commonly used component types
pub use provenant_core::{
    decode_envelope, DigestDescriptor, Envelope, ErrorKind, ExclusionRange, HashAlgorithm,
    SignatureFormat, SigningAlgorithm,
};
pub use provenant_signer::{KeyStore, MemoryKeyStore, RemoteSignerConfig, Signer};
pub use provenant_stream::{
    CallbackStream, FileStream, MemoryStream, ReadOnlyMemoryStream, SeekMode, Stream,
};
