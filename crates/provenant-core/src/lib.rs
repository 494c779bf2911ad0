//! # Provenant Core
//!
//! Pure primitives for Provenant: algorithm identifiers, content digests,
//! signature normalization, and manifest envelopes.
//!
//! This crate contains no I/O and no networking. Everything here is a
//! computation over bytes that the other crates compose.
//!
//! ## Key Types
//!
//! - [`SigningAlgorithm`] - Supported signature schemes and their widths
//! - [`DigestDescriptor`] - Hash of an asset with excluded byte ranges
//! - [`SignatureFormat`] - Raw vs DER output of a signing backend
//! - [`Envelope`] - Placeholder or signed manifest as embedded in an asset
//! - [`ErrorKind`] - Stable error classification shared by all crates
//!
//! ## Canonicalization
//!
//! Claims and envelope bodies use deterministic CBOR. See [`canonical`].

pub mod algorithm;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod normalize;

pub use algorithm::{HashAlgorithm, Hasher, SigningAlgorithm, MAX_RSA_SIGNATURE_LEN};
pub use digest::{normalize_exclusions, DigestDescriptor, ExclusionRange, MAX_EXCLUSIONS};
pub use error::{CoreError, ErrorKind};
pub use manifest::{
    decode_envelope, encode_placeholder, encode_signed, validate_mime_type, Claim, Envelope,
    Placeholder, SignedManifest, ENVELOPE_OVERHEAD, MAX_MIME_LEN, MAX_TSA_URL_LEN,
    PER_CERTIFICATE_OVERHEAD,
};
pub use normalize::{der_to_raw, normalize_signature, raw_to_der, SignatureFormat};
