//! # Provenant Signer
//!
//! One signing contract over four structurally different backends: local key
//! material, a caller callback, a remote web service, and a hardware keystore.
//!
//! ## Key Types
//!
//! - [`Signer`] - Capacity query plus sign, whatever the backend
//! - [`RemoteSignerConfig`] - Endpoint, credentials and timeouts for the remote backend
//! - [`KeyStore`] - The platform boundary for hardware-resident keys
//! - [`MemoryKeyStore`] - Software keystore with platform-like DER output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provenant_core::SigningAlgorithm;
//! use provenant_signer::Signer;
//!
//! # fn example(cert_pem: &str, key_pem: &str) -> provenant_signer::Result<()> {
//! let mut signer = Signer::from_keys(SigningAlgorithm::Es256, cert_pem, key_pem, None)?;
//! let reserve = signer.reserve_size()?;
//! let signature = signer.sign(b"claim bytes")?;
//! assert!(signature.len() <= reserve);
//! signer.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - **Raw on the way out**: ECDSA signatures are always returned as fixed-width
//!   `r || s`, whatever encoding the backend produced
//! - **Fail early**: unusable keys, mismatched certificates and algorithms a
//!   backend cannot serve are rejected at construction
//! - **Capacity is enforced**: a signature longer than the declared bound is an
//!   error, never silently embedded

pub mod certs;
pub mod error;
pub mod hardware;
pub mod key;
pub mod remote;
pub mod signer;

pub use certs::CertificateChain;
pub use error::{Result, SignerError};
pub use hardware::{KeyStore, MemoryKeyStore};
pub use key::{ed25519_sign, PrivateKey};
pub use remote::{RemoteConfiguration, RemoteSignerConfig};
pub use signer::{BackendKind, SignFn, Signer};

pub use provenant_core::{SignatureFormat, SigningAlgorithm};
