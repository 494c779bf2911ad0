//! # Provenant Testkit
//!
//! Testing utilities for Provenant.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Certificates and keys for every algorithm, plus signer
//!   builders for each backend
//! - **Verification**: An independent signature check against a leaf
//!   certificate
//! - **Golden vectors**: DER to raw normalization cases every implementation
//!   must agree on
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use provenant_core::SigningAlgorithm;
//! use provenant_testkit::{key_signer, verify_signature};
//!
//! let mut signer = key_signer(SigningAlgorithm::Es256);
//! let sig = signer.sign(b"claim").unwrap();
//! assert!(verify_signature(SigningAlgorithm::Es256, &signer.certificates()[0], b"claim", &sig));
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use provenant_core::der_to_raw;
//! use provenant_testkit::vectors::der_vectors;
//!
//! for v in der_vectors() {
//!     let width = v.algorithm.coordinate_width().unwrap();
//!     assert_eq!(der_to_raw(&v.der_bytes(), width).ok(), v.raw_bytes(), "{}", v.name);
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    callback_signer, credentials, der_callback_signer, failing_signer, hardware_signer,
    key_signer, signer_for, stub_signer, verify_signature, Credentials, EC_ALGORITHMS,
};
