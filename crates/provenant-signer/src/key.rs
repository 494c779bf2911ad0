//! Private key material for the direct-key and software keystore backends.
//!
//! Keys are parsed from PEM (PKCS#8, SEC1 for EC, PKCS#1 for RSA) according
//! to the bound algorithm. The key family has to agree with the algorithm.

use std::fmt;

use provenant_core::SigningAlgorithm;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer as _};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Result, SignerError};

macro_rules! parse_ec_key {
    ($curve:ident, $pem:expr) => {{
        use $curve::elliptic_curve::sec1::ToEncodedPoint;
        use $curve::pkcs8::DecodePrivateKey;

        let secret = $curve::SecretKey::from_pkcs8_pem($pem)
            .ok()
            .or_else(|| $curve::SecretKey::from_sec1_pem($pem).ok())
            .ok_or_else(|| {
                SignerError::config(concat!("invalid ", stringify!($curve), " private key"))
            })?;
        let public = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
        let signing = $curve::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| SignerError::config(format!("unusable EC key: {e}")))?;
        (signing, public)
    }};
}

enum KeyMaterial {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
    Rsa(RsaPrivateKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// A private key bound to one signing algorithm.
pub struct PrivateKey {
    algorithm: SigningAlgorithm,
    material: KeyMaterial,
    public_key: Vec<u8>,
}

impl PrivateKey {
    /// Parse a PEM private key for `algorithm`.
    pub fn from_pem(algorithm: SigningAlgorithm, pem: &str) -> Result<Self> {
        let (material, public_key) = match algorithm {
            SigningAlgorithm::Es256 => {
                let (k, p) = parse_ec_key!(p256, pem);
                (KeyMaterial::P256(k), p)
            }
            SigningAlgorithm::Es384 => {
                let (k, p) = parse_ec_key!(p384, pem);
                (KeyMaterial::P384(k), p)
            }
            SigningAlgorithm::Es512 => {
                let (k, p) = parse_ec_key!(p521, pem);
                (KeyMaterial::P521(k), p)
            }
            SigningAlgorithm::Ps256 | SigningAlgorithm::Ps384 | SigningAlgorithm::Ps512 => {
                let key = RsaPrivateKey::from_pkcs8_pem(pem)
                    .ok()
                    .or_else(|| RsaPrivateKey::from_pkcs1_pem(pem).ok())
                    .ok_or_else(|| SignerError::config("invalid RSA private key"))?;
                let public = key
                    .to_public_key()
                    .to_pkcs1_der()
                    .map_err(|e| SignerError::config(format!("cannot encode RSA key: {e}")))?
                    .as_bytes()
                    .to_vec();
                (KeyMaterial::Rsa(key), public)
            }
            SigningAlgorithm::Ed25519 => {
                let key = ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                    .map_err(|e| SignerError::config(format!("invalid Ed25519 private key: {e}")))?;
                let public = key.verifying_key().to_bytes().to_vec();
                (KeyMaterial::Ed25519(key), public)
            }
        };

        Ok(Self {
            algorithm,
            material,
            public_key,
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Public key in the form certificates carry it in `subjectPublicKey`.
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key
    }

    /// Largest signature this key can produce.
    pub fn max_signature_len(&self) -> usize {
        match &self.material {
            KeyMaterial::Rsa(key) => key.size(),
            _ => self.algorithm.raw_signature_len().unwrap_or(0),
        }
    }

    /// Sign `data`. EC signatures come out raw (`r || s`).
    pub fn sign(&self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        let signature = match &self.material {
            KeyMaterial::P256(key) => {
                let sig: p256::ecdsa::Signature = key.try_sign(data)?;
                sig.to_bytes().to_vec()
            }
            KeyMaterial::P384(key) => {
                let sig: p384::ecdsa::Signature = key.try_sign(data)?;
                sig.to_bytes().to_vec()
            }
            KeyMaterial::P521(key) => {
                let sig: p521::ecdsa::Signature = key.try_sign(data)?;
                sig.to_bytes().to_vec()
            }
            KeyMaterial::Rsa(key) => sign_pss(self.algorithm, key, data)?,
            KeyMaterial::Ed25519(key) => key.try_sign(data)?.to_bytes().to_vec(),
        };
        Ok(signature)
    }
}

fn sign_pss(algorithm: SigningAlgorithm, key: &RsaPrivateKey, data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut rng = rand::thread_rng();
    let signature = match algorithm {
        SigningAlgorithm::Ps256 => rsa::pss::SigningKey::<Sha256>::new(key.clone())
            .try_sign_with_rng(&mut rng, data)?
            .to_vec(),
        SigningAlgorithm::Ps384 => rsa::pss::SigningKey::<Sha384>::new(key.clone())
            .try_sign_with_rng(&mut rng, data)?
            .to_vec(),
        SigningAlgorithm::Ps512 => rsa::pss::SigningKey::<Sha512>::new(key.clone())
            .try_sign_with_rng(&mut rng, data)?
            .to_vec(),
        other => anyhow::bail!("{other} is not an RSA-PSS algorithm"),
    };
    Ok(signature)
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Sign `data` with an Ed25519 PKCS#8 PEM key. Always 64 bytes.
pub fn ed25519_sign(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>> {
    let key = PrivateKey::from_pem(SigningAlgorithm::Ed25519, private_key_pem)?;
    key.sign(data).map_err(SignerError::SignFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ES256_KEY: &str = include_str!("../../provenant-testkit/fixtures/es256.key");
    const ES512_KEY: &str = include_str!("../../provenant-testkit/fixtures/es512.key");
    const PS256_KEY: &str = include_str!("../../provenant-testkit/fixtures/ps256.key");
    const ED25519_KEY: &str = include_str!("../../provenant-testkit/fixtures/ed25519.key");

    #[test]
    fn test_ec_signature_is_raw() {
        let key = PrivateKey::from_pem(SigningAlgorithm::Es256, ES256_KEY).unwrap();
        assert_eq!(key.sign(b"claim").unwrap().len(), 64);
        assert_eq!(key.public_key_bytes().len(), 65);

        let key = PrivateKey::from_pem(SigningAlgorithm::Es512, ES512_KEY).unwrap();
        assert_eq!(key.sign(b"claim").unwrap().len(), 132);
    }

    #[test]
    fn test_rsa_signature_matches_modulus() {
        let key = PrivateKey::from_pem(SigningAlgorithm::Ps256, PS256_KEY).unwrap();
        assert_eq!(key.max_signature_len(), 256);
        assert_eq!(key.sign(b"claim").unwrap().len(), 256);
    }

    #[test]
    fn test_wrong_family_rejected() {
        let err = PrivateKey::from_pem(SigningAlgorithm::Es384, ES256_KEY).unwrap_err();
        assert_eq!(err.kind(), provenant_core::ErrorKind::Configuration);
        assert!(PrivateKey::from_pem(SigningAlgorithm::Ps256, ES256_KEY).is_err());
    }

    #[test]
    fn test_ed25519_sign_helper() {
        let sig = ed25519_sign(b"hello", ED25519_KEY).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(ed25519_sign(b"hello", ES256_KEY).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = PrivateKey::from_pem(SigningAlgorithm::Ed25519, ED25519_KEY).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
    }
}
