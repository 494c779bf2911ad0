//! Manifest envelopes.
//!
//! An envelope is what gets embedded in an asset: a fixed header followed by a
//! canonical CBOR body and zero padding up to the space reserved for it.
//!
//! ```text
//! +-------+---------+------+-------------+-------------+---------+
//! | PVNT  | version | kind | body_len BE | CBOR body   | 0x00... |
//! | 4     | 1       | 1    | 4           | body_len    | padding |
//! +-------+---------+------+-------------+-------------+---------+
//! ```
//!
//! ## Key Types
//!
//! - [`Claim`]: the statement that gets signed (mime, algorithms, digest)
//! - [`Placeholder`]: a cryptographically inert stand-in of a reserved size
//! - [`SignedManifest`]: claim bytes, signature and certificate chain
//! - [`Envelope`]: either of the above, as decoded from bytes

use ciborium::value::Value;

use crate::algorithm::{HashAlgorithm, SigningAlgorithm};
use crate::canonical::{as_u64, from_canonical_bytes, get, key, to_canonical_bytes};
use crate::digest::{DigestDescriptor, ExclusionRange};
use crate::error::{CoreError, Result};

/// Envelope magic.
pub const MAGIC: [u8; 4] = *b"PVNT";

/// Envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the fixed header preceding the CBOR body.
pub const HEADER_LEN: usize = 10;

/// Longest accepted MIME type.
pub const MAX_MIME_LEN: usize = 255;

/// Longest accepted timestamp authority URL.
pub const MAX_TSA_URL_LEN: usize = 255;

/// Upper bound on every envelope byte that is neither signature nor
/// certificate, for claims within [`MAX_MIME_LEN`], [`MAX_TSA_URL_LEN`] and
/// [`MAX_EXCLUSIONS`](crate::digest::MAX_EXCLUSIONS).
pub const ENVELOPE_OVERHEAD: usize = 1024;

/// CBOR bytes each certificate adds on top of its DER length.
pub const PER_CERTIFICATE_OVERHEAD: usize = 5;

const KIND_PLACEHOLDER: u8 = 0;
const KIND_SIGNED: u8 = 1;

mod keys {
    pub const MIME: u64 = 0;
    pub const ALG: u64 = 1;
    pub const HASH_ALG: u64 = 2;
    pub const EXCLUSIONS: u64 = 3;
    pub const DIGEST: u64 = 4;
    pub const TSA_URL: u64 = 5;

    pub const RESERVED_SIZE: u64 = 1;

    pub const CLAIM: u64 = 0;
    pub const SIGNATURE: u64 = 1;
    pub const CERTIFICATES: u64 = 2;
}

/// Check a MIME type is plausible: `type/subtype`, printable ASCII, bounded.
pub fn validate_mime_type(mime: &str) -> Result<()> {
    let valid = !mime.is_empty()
        && mime.len() <= MAX_MIME_LEN
        && mime.bytes().all(|b| b.is_ascii_graphic())
        && matches!(mime.split_once('/'), Some((t, s)) if !t.is_empty() && !s.is_empty());
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidMimeType(mime.to_string()))
    }
}

/// The signed statement about an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Media type of the asset, `type/subtype`.
    pub mime_type: String,
    /// Algorithm the claim is signed with.
    pub algorithm: SigningAlgorithm,
    /// Digest of the asset outside the excluded ranges.
    pub digest: DigestDescriptor,
    /// Timestamp authority to consult, if any.
    pub tsa_url: Option<String>,
}

impl Claim {
    pub fn new(
        mime_type: impl Into<String>,
        algorithm: SigningAlgorithm,
        digest: DigestDescriptor,
        tsa_url: Option<String>,
    ) -> Result<Self> {
        let mime_type = mime_type.into();
        validate_mime_type(&mime_type)?;
        if let Some(url) = &tsa_url {
            if url.len() > MAX_TSA_URL_LEN {
                return Err(CoreError::EncodingError(format!(
                    "timestamp authority URL longer than {MAX_TSA_URL_LEN} bytes"
                )));
            }
        }
        Ok(Self {
            mime_type,
            algorithm,
            digest,
            tsa_url,
        })
    }

    /// Canonical bytes; these are what the signer signs.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let exclusions = self
            .digest
            .exclusions
            .iter()
            .map(|r| {
                Value::Array(vec![
                    Value::Integer(r.start.into()),
                    Value::Integer(r.length.into()),
                ])
            })
            .collect();
        let tsa = match &self.tsa_url {
            Some(url) => Value::Text(url.clone()),
            None => Value::Null,
        };

        let value = Value::Map(vec![
            (key(keys::MIME), Value::Text(self.mime_type.clone())),
            (key(keys::ALG), Value::Text(self.algorithm.as_str().into())),
            (key(keys::HASH_ALG), Value::Text(self.digest.alg.as_str().into())),
            (key(keys::EXCLUSIONS), Value::Array(exclusions)),
            (key(keys::DIGEST), Value::Bytes(self.digest.value.clone())),
            (key(keys::TSA_URL), tsa),
        ]);
        to_canonical_bytes(&value)
    }

    /// Parse canonical claim bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = from_canonical_bytes(bytes)?;
        let map = expect_map(&value, "claim")?;

        let mime_type = match get(map, keys::MIME) {
            Some(Value::Text(s)) => s.clone(),
            _ => return Err(malformed("claim missing mime type")),
        };
        let algorithm: SigningAlgorithm = match get(map, keys::ALG) {
            Some(Value::Text(s)) => s.parse()?,
            _ => return Err(malformed("claim missing algorithm")),
        };
        let hash_alg: HashAlgorithm = match get(map, keys::HASH_ALG) {
            Some(Value::Text(s)) => s.parse()?,
            _ => return Err(malformed("claim missing hash algorithm")),
        };

        let exclusions = match get(map, keys::EXCLUSIONS) {
            Some(Value::Array(items)) => {
                let mut ranges = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(pair) if pair.len() == 2 => {
                            let start = as_u64(&pair[0]);
                            let length = as_u64(&pair[1]);
                            match (start, length) {
                                (Some(s), Some(l)) => ranges.push(ExclusionRange::new(s, l)),
                                _ => return Err(malformed("invalid exclusion range")),
                            }
                        }
                        _ => return Err(malformed("invalid exclusion range")),
                    }
                }
                ranges
            }
            _ => return Err(malformed("claim missing exclusions")),
        };

        let digest_value = match get(map, keys::DIGEST) {
            Some(Value::Bytes(b)) => b.clone(),
            _ => return Err(malformed("claim missing digest")),
        };
        let tsa_url = match get(map, keys::TSA_URL) {
            Some(Value::Text(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            _ => return Err(malformed("invalid timestamp authority URL")),
        };

        let digest = DigestDescriptor::new(hash_alg, &exclusions, digest_value)?;
        Claim::new(mime_type, algorithm, digest, tsa_url)
    }
}

/// Inert stand-in occupying a reserved region until finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub mime_type: String,
    pub reserved_size: u64,
}

/// A claim with its signature and certificate chain (leaf first, DER).
#[derive(Clone, PartialEq, Eq)]
pub struct SignedManifest {
    pub claim_bytes: Vec<u8>,
    pub signature: Vec<u8>,
    pub certificates: Vec<Vec<u8>>,
}

impl SignedManifest {
    /// Parse the embedded claim.
    pub fn claim(&self) -> Result<Claim> {
        Claim::from_bytes(&self.claim_bytes)
    }
}

impl std::fmt::Debug for SignedManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedManifest")
            .field("claim_len", &self.claim_bytes.len())
            .field("signature", &hex::encode(&self.signature))
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Placeholder(Placeholder),
    Signed(SignedManifest),
}

/// Encode a placeholder envelope of exactly `reserved_size` bytes.
pub fn encode_placeholder(mime_type: &str, reserved_size: usize) -> Result<Vec<u8>> {
    validate_mime_type(mime_type)?;
    let body = to_canonical_bytes(&Value::Map(vec![
        (key(keys::MIME), Value::Text(mime_type.to_string())),
        (key(keys::RESERVED_SIZE), Value::Integer((reserved_size as u64).into())),
    ]))?;
    frame(KIND_PLACEHOLDER, &body, Some(reserved_size))
}

/// Encode a signed envelope, zero-padded to `pad_to` bytes when given.
///
/// Fails with [`CoreError::Capacity`] when the envelope does not fit.
pub fn encode_signed(manifest: &SignedManifest, pad_to: Option<usize>) -> Result<Vec<u8>> {
    let certs = manifest
        .certificates
        .iter()
        .map(|der| Value::Bytes(der.clone()))
        .collect();
    let body = to_canonical_bytes(&Value::Map(vec![
        (key(keys::CLAIM), Value::Bytes(manifest.claim_bytes.clone())),
        (key(keys::SIGNATURE), Value::Bytes(manifest.signature.clone())),
        (key(keys::CERTIFICATES), Value::Array(certs)),
    ]))?;
    frame(KIND_SIGNED, &body, pad_to)
}

/// Decode an envelope, ignoring zero padding after the body.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    if bytes.len() < HEADER_LEN {
        return Err(malformed("shorter than header"));
    }
    if bytes[..4] != MAGIC {
        return Err(malformed("bad magic"));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(malformed(&format!("unsupported version {}", bytes[4])));
    }
    let kind = bytes[5];
    let body_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let rest = &bytes[HEADER_LEN..];
    if rest.len() < body_len {
        return Err(malformed("truncated body"));
    }
    let (body, padding) = rest.split_at(body_len);
    if padding.iter().any(|&b| b != 0) {
        return Err(malformed("non-zero padding"));
    }

    let value = from_canonical_bytes(body)?;
    let map = expect_map(&value, "envelope body")?;

    match kind {
        KIND_PLACEHOLDER => {
            let mime_type = match get(map, keys::MIME) {
                Some(Value::Text(s)) => s.clone(),
                _ => return Err(malformed("placeholder missing mime type")),
            };
            let reserved_size = get(map, keys::RESERVED_SIZE)
                .and_then(as_u64)
                .ok_or_else(|| malformed("placeholder missing reserved size"))?;
            Ok(Envelope::Placeholder(Placeholder {
                mime_type,
                reserved_size,
            }))
        }
        KIND_SIGNED => {
            let claim_bytes = match get(map, keys::CLAIM) {
                Some(Value::Bytes(b)) => b.clone(),
                _ => return Err(malformed("signed envelope missing claim")),
            };
            let signature = match get(map, keys::SIGNATURE) {
                Some(Value::Bytes(b)) => b.clone(),
                _ => return Err(malformed("signed envelope missing signature")),
            };
            let certificates = match get(map, keys::CERTIFICATES) {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::Bytes(b) => Ok(b.clone()),
                        _ => Err(malformed("invalid certificate entry")),
                    })
                    .collect::<Result<Vec<_>>>()?,
                _ => return Err(malformed("signed envelope missing certificates")),
            };
            Ok(Envelope::Signed(SignedManifest {
                claim_bytes,
                signature,
                certificates,
            }))
        }
        other => Err(malformed(&format!("unknown envelope kind {other}"))),
    }
}

fn frame(kind: u8, body: &[u8], pad_to: Option<usize>) -> Result<Vec<u8>> {
    let body_len = u32::try_from(body.len())
        .map_err(|_| CoreError::EncodingError("envelope body exceeds 4 GiB".into()))?;
    let required = HEADER_LEN + body.len();
    let total = match pad_to {
        Some(target) if required > target => {
            return Err(CoreError::Capacity {
                required,
                available: target,
            })
        }
        Some(target) => target,
        None => required,
    };

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(kind);
    out.extend_from_slice(&body_len.to_be_bytes());
    out.extend_from_slice(body);
    out.resize(total, 0);
    Ok(out)
}

fn expect_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(m) => Ok(m),
        _ => Err(malformed(&format!("{what} is not a map"))),
    }
}

fn malformed(msg: &str) -> CoreError {
    CoreError::MalformedEnvelope(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::MAX_EXCLUSIONS;

    fn sample_claim(exclusions: &[ExclusionRange], tsa: Option<String>) -> Claim {
        let digest =
            DigestDescriptor::compute(&[9u8; 500], HashAlgorithm::Sha256, exclusions).unwrap();
        Claim::new("image/jpeg", SigningAlgorithm::Es256, digest, tsa).unwrap()
    }

    #[test]
    fn test_placeholder_has_exact_size() {
        let bytes = encode_placeholder("image/jpeg", 4096).unwrap();
        assert_eq!(bytes.len(), 4096);
        assert_eq!(&bytes[..4], b"PVNT");

        match decode_envelope(&bytes).unwrap() {
            Envelope::Placeholder(p) => {
                assert_eq!(p.mime_type, "image/jpeg");
                assert_eq!(p.reserved_size, 4096);
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
    }

    #[test]
    fn test_placeholder_too_small() {
        let err = encode_placeholder("image/jpeg", 12).unwrap_err();
        assert!(matches!(err, CoreError::Capacity { available: 12, .. }));
    }

    #[test]
    fn test_signed_envelope_roundtrip() {
        let claim = sample_claim(&[ExclusionRange::new(100, 50)], Some("http://tsa.test".into()));
        let manifest = SignedManifest {
            claim_bytes: claim.to_bytes().unwrap(),
            signature: vec![0xaa; 64],
            certificates: vec![vec![0x30; 300], vec![0x30; 280]],
        };
        let bytes = encode_signed(&manifest, Some(2048)).unwrap();
        assert_eq!(bytes.len(), 2048);

        match decode_envelope(&bytes).unwrap() {
            Envelope::Signed(decoded) => {
                assert_eq!(decoded, manifest);
                assert_eq!(decoded.claim().unwrap(), claim);
            }
            other => panic!("expected signed, got {other:?}"),
        }
    }

    #[test]
    fn test_signed_envelope_capacity() {
        let claim = sample_claim(&[], None);
        let manifest = SignedManifest {
            claim_bytes: claim.to_bytes().unwrap(),
            signature: vec![0xaa; 512],
            certificates: vec![],
        };
        let err = encode_signed(&manifest, Some(256)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Capacity);
    }

    #[test]
    fn test_worst_case_claim_within_overhead() {
        let exclusions: Vec<_> = (0..MAX_EXCLUSIONS as u64)
            .map(|i| ExclusionRange::new(u64::MAX / 32 * i, u64::MAX / 64))
            .collect();
        let digest = DigestDescriptor::new(HashAlgorithm::Sha512, &exclusions, vec![0; 64]).unwrap();
        let mime = format!("a/{}", "b".repeat(MAX_MIME_LEN - 2));
        let claim = Claim::new(
            mime,
            SigningAlgorithm::Ed25519,
            digest,
            Some("u".repeat(MAX_TSA_URL_LEN)),
        )
        .unwrap();
        let manifest = SignedManifest {
            claim_bytes: claim.to_bytes().unwrap(),
            signature: vec![],
            certificates: vec![],
        };
        let bytes = encode_signed(&manifest, None).unwrap();
        assert!(bytes.len() <= ENVELOPE_OVERHEAD, "{} bytes", bytes.len());
    }

    #[test]
    fn test_claim_bytes_deterministic() {
        let a = sample_claim(&[ExclusionRange::new(1, 2)], None);
        let b = sample_claim(&[ExclusionRange::new(1, 2)], None);
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_envelope(b"short").is_err());
        assert!(decode_envelope(b"XXXX\x01\x00\x00\x00\x00\x00").is_err());

        let mut bytes = encode_placeholder("image/png", 512).unwrap();
        bytes[511] = 1;
        assert!(decode_envelope(&bytes).is_err());
    }

    #[test]
    fn test_mime_validation() {
        assert!(validate_mime_type("image/jpeg").is_ok());
        assert!(validate_mime_type("video/mp4").is_ok());
        assert!(validate_mime_type("jpeg").is_err());
        assert!(validate_mime_type("image/").is_err());
        assert!(validate_mime_type("image /jpeg").is_err());
        assert!(validate_mime_type("").is_err());
    }
}
