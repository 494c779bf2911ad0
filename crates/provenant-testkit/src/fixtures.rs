//! Test fixtures and helpers.
//!
//! Credentials for every algorithm, signer builders for every backend, and an
//! independent signature verifier.

use std::sync::Arc;

use provenant_core::{raw_to_der, SignatureFormat, SigningAlgorithm};
use provenant_signer::{BackendKind, MemoryKeyStore, PrivateKey, Signer, SignerError};
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// A certificate and its private key, both PEM.
#[derive(Debug, Clone, Copy)]
pub struct Credentials {
    pub algorithm: SigningAlgorithm,
    pub cert_pem: &'static str,
    pub key_pem: &'static str,
}

const ES256: (&str, &str) = (
    include_str!("../fixtures/es256.pub"),
    include_str!("../fixtures/es256.key"),
);
const ES384: (&str, &str) = (
    include_str!("../fixtures/es384.pub"),
    include_str!("../fixtures/es384.key"),
);
const ES512: (&str, &str) = (
    include_str!("../fixtures/es512.pub"),
    include_str!("../fixtures/es512.key"),
);
const PS: (&str, &str) = (
    include_str!("../fixtures/ps256.pub"),
    include_str!("../fixtures/ps256.key"),
);
const ED25519: (&str, &str) = (
    include_str!("../fixtures/ed25519.pub"),
    include_str!("../fixtures/ed25519.key"),
);

/// Fixture credentials for `algorithm`. The PS* algorithms share one RSA key.
pub fn credentials(algorithm: SigningAlgorithm) -> Credentials {
    let (cert_pem, key_pem) = match algorithm {
        SigningAlgorithm::Es256 => ES256,
        SigningAlgorithm::Es384 => ES384,
        SigningAlgorithm::Es512 => ES512,
        SigningAlgorithm::Ps256 | SigningAlgorithm::Ps384 | SigningAlgorithm::Ps512 => PS,
        SigningAlgorithm::Ed25519 => ED25519,
    };
    Credentials {
        algorithm,
        cert_pem,
        key_pem,
    }
}

/// ECDSA algorithms.
pub const EC_ALGORITHMS: [SigningAlgorithm; 3] = [
    SigningAlgorithm::Es256,
    SigningAlgorithm::Es384,
    SigningAlgorithm::Es512,
];

// ─────────────────────────────────────────────────────────────────────────────
// Signers
// ─────────────────────────────────────────────────────────────────────────────

/// Signer over the fixture key.
pub fn key_signer(algorithm: SigningAlgorithm) -> Signer {
    let c = credentials(algorithm);
    Signer::from_keys(algorithm, c.cert_pem, c.key_pem, None).expect("fixture key signer")
}

/// Callback signer returning raw signatures from the fixture key.
pub fn callback_signer(algorithm: SigningAlgorithm) -> Signer {
    let c = credentials(algorithm);
    let key = PrivateKey::from_pem(algorithm, c.key_pem).expect("fixture key");
    Signer::from_callback(algorithm, c.cert_pem, None, move |data| key.sign(data))
        .expect("fixture callback signer")
}

/// Callback signer whose ECDSA output is DER, declared as such.
pub fn der_callback_signer(algorithm: SigningAlgorithm) -> Signer {
    let c = credentials(algorithm);
    let key = PrivateKey::from_pem(algorithm, c.key_pem).expect("fixture key");
    Signer::from_callback(algorithm, c.cert_pem, None, move |data| {
        let raw = key.sign(data)?;
        if algorithm.is_ec() {
            Ok(raw_to_der(&raw)?)
        } else {
            Ok(raw)
        }
    })
    .expect("fixture callback signer")
    .with_signature_format(SignatureFormat::Der)
}

/// Hardware signer backed by a [`MemoryKeyStore`] holding the fixture key.
pub fn hardware_signer(algorithm: SigningAlgorithm) -> Signer {
    let c = credentials(algorithm);
    let store = MemoryKeyStore::new();
    store
        .import_pem("fixture", algorithm, c.key_pem)
        .expect("fixture key import");
    Signer::hardware(Arc::new(store), "fixture", algorithm, c.cert_pem, None)
        .expect("fixture hardware signer")
}

/// Signer for `algorithm` over the given backend. Remote is not available
/// without a server; see the integration tests for that backend.
pub fn signer_for(backend: BackendKind, algorithm: SigningAlgorithm) -> Signer {
    match backend {
        BackendKind::Key => key_signer(algorithm),
        BackendKind::Callback => callback_signer(algorithm),
        BackendKind::Hardware => hardware_signer(algorithm),
        BackendKind::Remote => panic!("remote signers need a server"),
    }
}

/// Callback signer that returns a constant signature of the algorithm's
/// width (256 bytes for RSA-PSS). Cheap and deterministic.
pub fn stub_signer(algorithm: SigningAlgorithm) -> Signer {
    let len = algorithm.raw_signature_len().unwrap_or(256);
    let c = credentials(algorithm);
    Signer::from_callback(algorithm, c.cert_pem, None, move |_| Ok(vec![0xA5; len]))
        .expect("fixture stub signer")
}

/// Callback signer whose every call fails with `reason`.
pub fn failing_signer(algorithm: SigningAlgorithm, reason: &'static str) -> Signer {
    let c = credentials(algorithm);
    Signer::from_callback(algorithm, c.cert_pem, None, move |_| {
        Err(SignerError::Transport(reason.to_string()).into())
    })
    .expect("fixture failing signer")
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

/// Verify an embedded-form signature against the public key in `cert_der`.
///
/// ECDSA signatures must be raw `r || s`.
pub fn verify_signature(
    algorithm: SigningAlgorithm,
    cert_der: &[u8],
    data: &[u8],
    signature: &[u8],
) -> bool {
    let Ok(cert) = Certificate::from_der(cert_der) else {
        return false;
    };
    let public = cert
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes()
        .to_vec();
    verify_with_public_key(algorithm, &public, data, signature)
}

fn verify_with_public_key(
    algorithm: SigningAlgorithm,
    public: &[u8],
    data: &[u8],
    signature: &[u8],
) -> bool {
    use rsa::signature::Verifier;

    match algorithm {
        SigningAlgorithm::Es256 => {
            let (Ok(key), Ok(sig)) = (
                p256::ecdsa::VerifyingKey::from_sec1_bytes(public),
                p256::ecdsa::Signature::from_slice(signature),
            ) else {
                return false;
            };
            key.verify(data, &sig).is_ok()
        }
        SigningAlgorithm::Es384 => {
            let (Ok(key), Ok(sig)) = (
                p384::ecdsa::VerifyingKey::from_sec1_bytes(public),
                p384::ecdsa::Signature::from_slice(signature),
            ) else {
                return false;
            };
            key.verify(data, &sig).is_ok()
        }
        SigningAlgorithm::Es512 => {
            let (Ok(key), Ok(sig)) = (
                p521::ecdsa::VerifyingKey::from_sec1_bytes(public),
                p521::ecdsa::Signature::from_slice(signature),
            ) else {
                return false;
            };
            key.verify(data, &sig).is_ok()
        }
        SigningAlgorithm::Ps256 | SigningAlgorithm::Ps384 | SigningAlgorithm::Ps512 => {
            verify_pss(algorithm, public, data, signature)
        }
        SigningAlgorithm::Ed25519 => {
            let Ok(bytes) = <[u8; 32]>::try_from(public) else {
                return false;
            };
            let (Ok(key), Ok(sig)) = (
                ed25519_dalek::VerifyingKey::from_bytes(&bytes),
                ed25519_dalek::Signature::from_slice(signature),
            ) else {
                return false;
            };
            key.verify(data, &sig).is_ok()
        }
    }
}

fn verify_pss(algorithm: SigningAlgorithm, public: &[u8], data: &[u8], signature: &[u8]) -> bool {
    use rsa::pkcs1::DecodeRsaPublicKey;
    use rsa::signature::Verifier;
    use sha2::{Sha256, Sha384, Sha512};

    let Ok(key) = rsa::RsaPublicKey::from_pkcs1_der(public) else {
        return false;
    };
    let Ok(sig) = rsa::pss::Signature::try_from(signature) else {
        return false;
    };
    match algorithm {
        SigningAlgorithm::Ps256 => rsa::pss::VerifyingKey::<Sha256>::new(key)
            .verify(data, &sig)
            .is_ok(),
        SigningAlgorithm::Ps384 => rsa::pss::VerifyingKey::<Sha384>::new(key)
            .verify(data, &sig)
            .is_ok(),
        SigningAlgorithm::Ps512 => rsa::pss::VerifyingKey::<Sha512>::new(key)
            .verify(data, &sig)
            .is_ok(),
        _ => false,
    }
}
