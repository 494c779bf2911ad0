//! Hardware-resident keys.
//!
//! [`KeyStore`] is the platform boundary: key bytes never cross it, only
//! sign requests and signatures do. Platform keystores emit DER for ECDSA,
//! so hardware signers normalize by default.
//!
//! [`MemoryKeyStore`] is a software stand-in with the same observable
//! behaviour, for tests and for hosts without a secure element.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use provenant_core::{raw_to_der, SignatureFormat, SigningAlgorithm};

use crate::certs::CertificateChain;
use crate::error::{Result, SignerError};
use crate::key::PrivateKey;
use crate::signer::{default_max_signature_len, BackendKind, Signer};

/// A platform key store that signs with keys it never releases.
pub trait KeyStore: Send + Sync {
    /// Whether a key exists under `alias`.
    fn contains(&self, alias: &str) -> bool;

    /// Whether this store can hold keys for `algorithm` at all.
    fn supports(&self, algorithm: SigningAlgorithm) -> bool {
        algorithm.supports_hardware_keystore()
    }

    /// Sign `data` with the key under `alias`.
    fn sign(&self, alias: &str, algorithm: SigningAlgorithm, data: &[u8])
        -> anyhow::Result<Vec<u8>>;

    /// Encoding of the signatures [`KeyStore::sign`] returns.
    fn signature_format(&self) -> SignatureFormat {
        SignatureFormat::Der
    }

    /// Largest signature the key under `alias` can produce, when known.
    fn max_signature_len(&self, _alias: &str) -> Option<usize> {
        None
    }
}

impl Signer {
    /// Build a signer over a key held in `keystore`.
    ///
    /// Fails immediately when the algorithm cannot live in a hardware
    /// keystore, the store does not support it, or the alias is unknown.
    pub fn hardware(
        keystore: Arc<dyn KeyStore>,
        alias: &str,
        algorithm: SigningAlgorithm,
        cert_pem: &str,
        tsa_url: Option<String>,
    ) -> Result<Self> {
        if !algorithm.supports_hardware_keystore() || !keystore.supports(algorithm) {
            return Err(SignerError::config(format!(
                "{algorithm} is not supported by hardware keystores"
            )));
        }
        if !keystore.contains(alias) {
            return Err(SignerError::config(format!(
                "no key with alias {alias:?} in keystore"
            )));
        }
        let chain = CertificateChain::from_pem(cert_pem)?;

        let max = keystore
            .max_signature_len(alias)
            .unwrap_or_else(|| default_max_signature_len(algorithm));
        let format = keystore.signature_format();
        let alias = alias.to_string();
        let sign_fn = move |data: &[u8]| keystore.sign(&alias, algorithm, data);

        Self::from_parts(
            algorithm,
            chain,
            tsa_url,
            format,
            max,
            BackendKind::Hardware,
            Box::new(sign_fn),
        )
    }
}

/// Software keystore that behaves like a platform one: ECDSA output is DER.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, PrivateKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a PEM private key under `alias`, replacing any previous key.
    pub fn import_pem(&self, alias: &str, algorithm: SigningAlgorithm, pem: &str) -> Result<()> {
        if !algorithm.supports_hardware_keystore() {
            return Err(SignerError::config(format!(
                "{algorithm} keys cannot be stored in a keystore"
            )));
        }
        let key = PrivateKey::from_pem(algorithm, pem)?;
        self.keys
            .write()
            .map_err(|_| SignerError::config("keystore lock poisoned"))?
            .insert(alias.to_string(), key);
        tracing::debug!(alias, %algorithm, "imported key into memory keystore");
        Ok(())
    }

    /// Public key for `alias`, in certificate `subjectPublicKey` form.
    pub fn public_key(&self, alias: &str) -> Option<Vec<u8>> {
        let keys = self.keys.read().ok()?;
        keys.get(alias).map(|k| k.public_key_bytes().to_vec())
    }

    pub fn remove(&self, alias: &str) -> bool {
        self.keys
            .write()
            .map(|mut keys| keys.remove(alias).is_some())
            .unwrap_or(false)
    }
}

impl KeyStore for MemoryKeyStore {
    fn contains(&self, alias: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(alias))
            .unwrap_or(false)
    }

    fn sign(
        &self,
        alias: &str,
        algorithm: SigningAlgorithm,
        data: &[u8],
    ) -> anyhow::Result<Vec<u8>> {
        let keys = self
            .keys
            .read()
            .map_err(|_| anyhow::anyhow!("keystore lock poisoned"))?;
        let key = keys
            .get(alias)
            .ok_or_else(|| anyhow::anyhow!("key {alias:?} was removed"))?;
        if key.algorithm() != algorithm {
            anyhow::bail!("key {alias:?} is {}, not {algorithm}", key.algorithm());
        }

        let signature = key.sign(data)?;
        if algorithm.is_ec() {
            Ok(raw_to_der(&signature)?)
        } else {
            Ok(signature)
        }
    }

    fn max_signature_len(&self, alias: &str) -> Option<usize> {
        let keys = self.keys.read().ok()?;
        keys.get(alias).map(PrivateKey::max_signature_len)
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let aliases: Vec<String> = self
            .keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("MemoryKeyStore")
            .field("aliases", &aliases)
            .finish()
    }
}
