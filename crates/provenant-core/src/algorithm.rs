//! Signing and hashing algorithm identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Largest RSA modulus (in bytes) assumed when a backend cannot report its key
/// size. Corresponds to RSA-4096.
pub const MAX_RSA_SIGNATURE_LEN: usize = 512;

/// A signing algorithm: digest, key family and expected signature width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    Es256,
    /// ECDSA over P-384 with SHA-384.
    Es384,
    /// ECDSA over P-521 with SHA-512.
    Es512,
    /// RSASSA-PSS with SHA-256.
    Ps256,
    /// RSASSA-PSS with SHA-384.
    Ps384,
    /// RSASSA-PSS with SHA-512.
    Ps512,
    /// Pure Ed25519.
    Ed25519,
}

impl SigningAlgorithm {
    /// Every supported algorithm, in declaration order.
    pub const ALL: [SigningAlgorithm; 7] = [
        SigningAlgorithm::Es256,
        SigningAlgorithm::Es384,
        SigningAlgorithm::Es512,
        SigningAlgorithm::Ps256,
        SigningAlgorithm::Ps384,
        SigningAlgorithm::Ps512,
        SigningAlgorithm::Ed25519,
    ];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            SigningAlgorithm::Es256 => "es256",
            SigningAlgorithm::Es384 => "es384",
            SigningAlgorithm::Es512 => "es512",
            SigningAlgorithm::Ps256 => "ps256",
            SigningAlgorithm::Ps384 => "ps384",
            SigningAlgorithm::Ps512 => "ps512",
            SigningAlgorithm::Ed25519 => "ed25519",
        }
    }

    /// True for the ECDSA family.
    pub fn is_ec(self) -> bool {
        self.coordinate_width().is_some()
    }

    /// True for the RSASSA-PSS family.
    pub fn is_rsa_pss(self) -> bool {
        matches!(
            self,
            SigningAlgorithm::Ps256 | SigningAlgorithm::Ps384 | SigningAlgorithm::Ps512
        )
    }

    /// Byte width of one curve coordinate (r or s) for ECDSA algorithms.
    pub fn coordinate_width(self) -> Option<usize> {
        match self {
            SigningAlgorithm::Es256 => Some(32),
            SigningAlgorithm::Es384 => Some(48),
            SigningAlgorithm::Es512 => Some(66),
            _ => None,
        }
    }

    /// Exact length of a raw signature, when the algorithm fixes it.
    ///
    /// RSA-PSS signatures are as wide as the modulus, so this is `None`.
    pub fn raw_signature_len(self) -> Option<usize> {
        match self {
            SigningAlgorithm::Ed25519 => Some(64),
            other => other.coordinate_width().map(|w| w * 2),
        }
    }

    /// Digest bound to this algorithm.
    pub fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            SigningAlgorithm::Es256 | SigningAlgorithm::Ps256 => HashAlgorithm::Sha256,
            SigningAlgorithm::Es384 | SigningAlgorithm::Ps384 => HashAlgorithm::Sha384,
            SigningAlgorithm::Es512 | SigningAlgorithm::Ps512 | SigningAlgorithm::Ed25519 => {
                HashAlgorithm::Sha512
            }
        }
    }

    /// Whether platform key stores can hold keys for this algorithm.
    pub fn supports_hardware_keystore(self) -> bool {
        !matches!(self, SigningAlgorithm::Ed25519)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SigningAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownAlgorithm(s.to_string()))
    }
}

/// A hash algorithm usable for content digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Hash `data` in one shot.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Start an incremental hash.
    pub fn hasher(self) -> Hasher {
        match self {
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Hasher::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(CoreError::UnknownHashAlgorithm(s.to_string())),
        }
    }
}

/// Incremental hasher over one of the supported digests.
#[derive(Clone)]
pub enum Hasher {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    /// Consume the hasher and return the digest.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha384(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hasher::Sha256(_) => "sha256",
            Hasher::Sha384(_) => "sha384",
            Hasher::Sha512(_) => "sha512",
        };
        write!(f, "Hasher({name})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_name_roundtrip() {
        for alg in SigningAlgorithm::ALL {
            let parsed: SigningAlgorithm = alg.as_str().parse().unwrap();
            assert_eq!(parsed, alg);
        }
        assert_eq!("ES384".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Es384);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!("rs256".parse::<SigningAlgorithm>().is_err());
    }

    #[test]
    fn test_raw_widths() {
        assert_eq!(SigningAlgorithm::Es256.raw_signature_len(), Some(64));
        assert_eq!(SigningAlgorithm::Es384.raw_signature_len(), Some(96));
        assert_eq!(SigningAlgorithm::Es512.raw_signature_len(), Some(132));
        assert_eq!(SigningAlgorithm::Ed25519.raw_signature_len(), Some(64));
        assert_eq!(SigningAlgorithm::Ps256.raw_signature_len(), None);
    }

    #[test]
    fn test_only_ed25519_lacks_hardware_support() {
        let unsupported: Vec<_> = SigningAlgorithm::ALL
            .into_iter()
            .filter(|alg| !alg.supports_hardware_keystore())
            .collect();
        assert_eq!(unsupported, vec![SigningAlgorithm::Ed25519]);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        for alg in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
            let mut hasher = alg.hasher();
            hasher.update(b"hello ");
            hasher.update(b"world");
            let digest = hasher.finalize();
            assert_eq!(digest, alg.digest(b"hello world"));
            assert_eq!(digest.len(), alg.output_len());
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SigningAlgorithm::Ps384).unwrap();
        assert_eq!(json, "\"ps384\"");
        let alg: HashAlgorithm = serde_json::from_str("\"sha512\"").unwrap();
        assert_eq!(alg, HashAlgorithm::Sha512);
    }
}
