//! The signer: one contract over every signing backend.
//!
//! Every backend reduces to the same state: an algorithm, a certificate
//! chain, a capacity bound, and a sign closure capturing whatever the backend
//! needs (a key, a caller function, an HTTP agent, a keystore handle).

use std::fmt;

use provenant_core::{
    normalize_signature, SignatureFormat, SigningAlgorithm, ENVELOPE_OVERHEAD,
    MAX_RSA_SIGNATURE_LEN, MAX_TSA_URL_LEN, PER_CERTIFICATE_OVERHEAD,
};

use crate::certs::CertificateChain;
use crate::error::{Result, SignerError};
use crate::key::PrivateKey;

/// The sign closure every backend is reduced to.
pub type SignFn = Box<dyn FnMut(&[u8]) -> anyhow::Result<Vec<u8>> + Send>;

/// Which backend produced a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Key,
    Callback,
    Remote,
    Hardware,
}

/// A signing capability bound to an algorithm and a certificate chain.
///
/// A signer is open until [`Signer::close`] is called or it is dropped.
/// Every operation on a closed signer fails with [`SignerError::Closed`].
pub struct Signer {
    algorithm: SigningAlgorithm,
    certificates: Vec<Vec<u8>>,
    tsa_url: Option<String>,
    format: SignatureFormat,
    max_signature_len: usize,
    backend: BackendKind,
    sign_fn: Option<SignFn>,
}

impl Signer {
    pub(crate) fn from_parts(
        algorithm: SigningAlgorithm,
        chain: CertificateChain,
        tsa_url: Option<String>,
        format: SignatureFormat,
        max_signature_len: usize,
        backend: BackendKind,
        sign_fn: SignFn,
    ) -> Result<Self> {
        if let Some(url) = &tsa_url {
            if url.len() > MAX_TSA_URL_LEN {
                return Err(SignerError::config(format!(
                    "timestamp authority URL longer than {MAX_TSA_URL_LEN} bytes"
                )));
            }
        }
        tracing::debug!(%algorithm, ?backend, certs = chain.len(), "signer created");
        Ok(Self {
            algorithm,
            certificates: chain.into_der(),
            tsa_url,
            format,
            max_signature_len,
            backend,
            sign_fn: Some(sign_fn),
        })
    }

    /// Sign with local key material.
    ///
    /// The leaf certificate must carry the public half of `key_pem`.
    pub fn from_keys(
        algorithm: SigningAlgorithm,
        cert_pem: &str,
        key_pem: &str,
        tsa_url: Option<String>,
    ) -> Result<Self> {
        let chain = CertificateChain::from_pem(cert_pem)?;
        let key = PrivateKey::from_pem(algorithm, key_pem)?;
        if chain.leaf_public_key() != key.public_key_bytes() {
            return Err(SignerError::config(
                "private key does not match the leaf certificate",
            ));
        }

        let max = key.max_signature_len();
        Self::from_parts(
            algorithm,
            chain,
            tsa_url,
            SignatureFormat::Raw,
            max,
            BackendKind::Key,
            Box::new(move |data| key.sign(data)),
        )
    }

    /// Sign through a caller-supplied function.
    ///
    /// The function is assumed to return raw signatures; use
    /// [`Signer::with_signature_format`] when it returns DER. RSA-PSS signers
    /// default to a 512-byte bound, see [`Signer::with_max_signature_len`].
    pub fn from_callback<F>(
        algorithm: SigningAlgorithm,
        cert_pem: &str,
        tsa_url: Option<String>,
        f: F,
    ) -> Result<Self>
    where
        F: FnMut(&[u8]) -> anyhow::Result<Vec<u8>> + Send + 'static,
    {
        let chain = CertificateChain::from_pem(cert_pem)?;
        Self::from_parts(
            algorithm,
            chain,
            tsa_url,
            SignatureFormat::Raw,
            default_max_signature_len(algorithm),
            BackendKind::Callback,
            Box::new(f),
        )
    }

    /// Declare the encoding the sign function produces.
    pub fn with_signature_format(mut self, format: SignatureFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the capacity bound on produced signatures.
    ///
    /// For fixed-width algorithms the bound may not be below the raw width.
    pub fn with_max_signature_len(mut self, len: usize) -> Result<Self> {
        if let Some(fixed) = self.algorithm.raw_signature_len() {
            if len < fixed {
                return Err(SignerError::config(format!(
                    "{} signatures are {fixed} bytes, bound of {len} is too small",
                    self.algorithm
                )));
            }
        }
        self.max_signature_len = len;
        Ok(self)
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Certificate chain as DER, leaf first.
    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    pub fn tsa_url(&self) -> Option<&str> {
        self.tsa_url.as_deref()
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn signature_format(&self) -> SignatureFormat {
        self.format
    }

    /// Upper bound on the length of any signature [`Signer::sign`] returns.
    pub fn max_signature_len(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.max_signature_len)
    }

    /// Upper bound on the envelope this signer can produce.
    pub fn reserve_size(&self) -> Result<usize> {
        self.check_open()?;
        let certs: usize = self
            .certificates
            .iter()
            .map(|c| c.len() + PER_CERTIFICATE_OVERHEAD)
            .sum();
        Ok(self.max_signature_len + certs + ENVELOPE_OVERHEAD)
    }

    /// Sign `data` and return the signature in embedded form.
    pub fn sign(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let sign_fn = self.sign_fn.as_mut().ok_or(SignerError::Closed)?;
        let raw = sign_fn(data).map_err(into_signer_error)?;
        let signature = normalize_signature(self.algorithm, raw, self.format)?;

        if signature.len() > self.max_signature_len {
            return Err(SignerError::Capacity {
                actual: signature.len(),
                capacity: self.max_signature_len,
            });
        }
        tracing::debug!(
            algorithm = %self.algorithm,
            backend = ?self.backend,
            len = signature.len(),
            "signed"
        );
        Ok(signature)
    }

    /// Release the backend. Idempotent.
    pub fn close(&mut self) {
        if self.sign_fn.take().is_some() {
            tracing::debug!(algorithm = %self.algorithm, backend = ?self.backend, "signer closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sign_fn.is_none()
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SignerError::Closed);
        }
        Ok(())
    }
}

impl Drop for Signer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm)
            .field("backend", &self.backend)
            .field("certificates", &self.certificates.len())
            .field("tsa_url", &self.tsa_url)
            .field("format", &self.format)
            .field("max_signature_len", &self.max_signature_len)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Capacity bound when the backend cannot report one.
pub(crate) fn default_max_signature_len(algorithm: SigningAlgorithm) -> usize {
    algorithm
        .raw_signature_len()
        .unwrap_or(MAX_RSA_SIGNATURE_LEN)
}

/// Backends may return a typed [`SignerError`] through `anyhow`; keep its kind.
fn into_signer_error(err: anyhow::Error) -> SignerError {
    match err.downcast::<SignerError>() {
        Ok(e) => e,
        Err(e) => SignerError::SignFailed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenant_core::{raw_to_der, ErrorKind};

    const ES256_CERT: &str = include_str!("../../provenant-testkit/fixtures/es256.pub");
    const ES256_KEY: &str = include_str!("../../provenant-testkit/fixtures/es256.key");
    const ES384_CERT: &str = include_str!("../../provenant-testkit/fixtures/es384.pub");
    const PS256_CERT: &str = include_str!("../../provenant-testkit/fixtures/ps256.pub");
    const PS256_KEY: &str = include_str!("../../provenant-testkit/fixtures/ps256.key");

    #[test]
    fn test_from_keys_signs_raw() {
        let mut signer =
            Signer::from_keys(SigningAlgorithm::Es256, ES256_CERT, ES256_KEY, None).unwrap();
        assert_eq!(signer.backend(), BackendKind::Key);
        let sig = signer.sign(b"claim").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(signer.reserve_size().unwrap() >= sig.len());
    }

    #[test]
    fn test_key_certificate_mismatch_rejected() {
        let err =
            Signer::from_keys(SigningAlgorithm::Es384, ES384_CERT, ES256_KEY, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err =
            Signer::from_keys(SigningAlgorithm::Es256, ES384_CERT, ES256_KEY, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_rsa_key_capacity_is_modulus() {
        let mut signer =
            Signer::from_keys(SigningAlgorithm::Ps256, PS256_CERT, PS256_KEY, None).unwrap();
        assert_eq!(signer.max_signature_len().unwrap(), 256);
        assert_eq!(signer.sign(b"claim").unwrap().len(), 256);
    }

    #[test]
    fn test_callback_der_is_normalized() {
        let raw = vec![0x42u8; 96];
        let der = raw_to_der(&raw).unwrap();
        let mut signer = Signer::from_callback(SigningAlgorithm::Es384, ES384_CERT, None, move |_| {
            Ok(der.clone())
        })
        .unwrap()
        .with_signature_format(SignatureFormat::Der);

        assert_eq!(signer.sign(b"claim").unwrap(), raw);
    }

    #[test]
    fn test_callback_failure_is_signing_error() {
        let mut signer = Signer::from_callback(SigningAlgorithm::Es256, ES256_CERT, None, |_| {
            anyhow::bail!("device unavailable")
        })
        .unwrap();
        let err = signer.sign(b"claim").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(err.to_string().contains("device unavailable"));
    }

    #[test]
    fn test_callback_over_capacity_rejected() {
        let mut signer =
            Signer::from_callback(SigningAlgorithm::Ps256, PS256_CERT, None, |_| Ok(vec![1u8; 300]))
                .unwrap()
                .with_max_signature_len(256)
                .unwrap();
        let err = signer.sign(b"claim").unwrap_err();
        assert!(matches!(
            err,
            SignerError::Capacity {
                actual: 300,
                capacity: 256
            }
        ));
    }

    #[test]
    fn test_callback_wrong_raw_width_rejected() {
        let mut signer =
            Signer::from_callback(SigningAlgorithm::Es256, ES256_CERT, None, |_| Ok(vec![0u8; 70]))
                .unwrap();
        assert_eq!(signer.sign(b"claim").unwrap_err().kind(), ErrorKind::Signing);
    }

    #[test]
    fn test_bound_below_raw_width_rejected() {
        let result = Signer::from_callback(SigningAlgorithm::Es256, ES256_CERT, None, |_| {
            Ok(vec![0u8; 64])
        })
        .unwrap()
        .with_max_signature_len(63);
        assert!(result.is_err());
    }

    #[test]
    fn test_rsa_callback_default_bound() {
        let signer =
            Signer::from_callback(SigningAlgorithm::Ps512, PS256_CERT, None, |_| Ok(vec![]))
                .unwrap();
        assert_eq!(signer.max_signature_len().unwrap(), MAX_RSA_SIGNATURE_LEN);
    }

    #[test]
    fn test_closed_signer_rejects_everything() {
        let mut signer =
            Signer::from_keys(SigningAlgorithm::Es256, ES256_CERT, ES256_KEY, None).unwrap();
        signer.close();
        signer.close();
        assert!(signer.is_closed());
        assert_eq!(signer.sign(b"x").unwrap_err().kind(), ErrorKind::ResourceState);
        assert_eq!(signer.reserve_size().unwrap_err().kind(), ErrorKind::ResourceState);
    }

    #[test]
    fn test_reserve_size_counts_certificates() {
        let signer =
            Signer::from_keys(SigningAlgorithm::Es256, ES256_CERT, ES256_KEY, None).unwrap();
        let cert_len = signer.certificates()[0].len();
        assert_eq!(
            signer.reserve_size().unwrap(),
            64 + cert_len + PER_CERTIFICATE_OVERHEAD + ENVELOPE_OVERHEAD
        );
    }

    #[test]
    fn test_overlong_tsa_url_rejected() {
        let url = format!("https://{}", "t".repeat(MAX_TSA_URL_LEN));
        let err = Signer::from_keys(SigningAlgorithm::Es256, ES256_CERT, ES256_KEY, Some(url))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
