//! Certificate chain handling.
//!
//! Chains arrive as PEM and are carried as DER, leaf first. No trust
//! evaluation happens here; the leaf is only inspected for its public key.

use x509_cert::der::Encode;
use x509_cert::Certificate;

use crate::error::{Result, SignerError};

/// A parsed certificate chain.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
    der: Vec<Vec<u8>>,
}

impl CertificateChain {
    /// Parse one or more concatenated PEM certificates.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let certs = Certificate::load_pem_chain(pem.as_bytes())
            .map_err(|e| SignerError::config(format!("invalid certificate chain: {e}")))?;
        if certs.is_empty() {
            return Err(SignerError::config("certificate chain is empty"));
        }
        let der = certs
            .iter()
            .map(|c| c.to_der())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SignerError::config(format!("cannot encode certificate: {e}")))?;
        Ok(Self { certs, der })
    }

    /// Contents of the leaf's `subjectPublicKey` bit string.
    ///
    /// For EC keys this is the SEC1 point, for RSA the PKCS#1 public key, and
    /// for Ed25519 the 32 raw bytes.
    pub fn leaf_public_key(&self) -> &[u8] {
        self.certs[0]
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes()
    }

    /// DER encodings, leaf first.
    pub fn der(&self) -> &[Vec<u8>] {
        &self.der
    }

    pub fn into_der(self) -> Vec<Vec<u8>> {
        self.der
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ES256_CERT: &str = include_str!("../../provenant-testkit/fixtures/es256.pub");
    const PS256_CERT: &str = include_str!("../../provenant-testkit/fixtures/ps256.pub");

    #[test]
    fn test_parse_single_cert() {
        let chain = CertificateChain::from_pem(ES256_CERT).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.der()[0][0], 0x30);
        // Uncompressed P-256 point.
        assert_eq!(chain.leaf_public_key().len(), 65);
        assert_eq!(chain.leaf_public_key()[0], 0x04);
    }

    #[test]
    fn test_parse_concatenated_chain() {
        let pem = format!("{ES256_CERT}{PS256_CERT}");
        let chain = CertificateChain::from_pem(&pem).unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_garbage_rejected() {
        let err = CertificateChain::from_pem("not a certificate").unwrap_err();
        assert_eq!(err.kind(), provenant_core::ErrorKind::Configuration);
    }
}
