//! Signature normalization.
//!
//! Platform ECDSA primitives emit ASN.1 DER `SEQUENCE { INTEGER r, INTEGER s }`
//! of variable length. Embedded manifests carry the fixed-width raw form
//! `r || s`, each component left-zero-padded to the curve coordinate width.

use serde::{Deserialize, Serialize};

use crate::algorithm::SigningAlgorithm;
use crate::error::{CoreError, Result};

/// Encoding a signing backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureFormat {
    /// Already in the embedded form (raw `r || s` for ECDSA).
    #[default]
    Raw,
    /// ASN.1 DER, as emitted by most platform ECDSA primitives.
    Der,
}

/// Bring a backend signature into the embedded form for `alg`.
///
/// ECDSA signatures in DER are converted to raw; raw ECDSA and Ed25519
/// signatures are length-checked; RSA-PSS signatures pass through unchanged.
pub fn normalize_signature(
    alg: SigningAlgorithm,
    signature: Vec<u8>,
    format: SignatureFormat,
) -> Result<Vec<u8>> {
    if alg.is_rsa_pss() {
        return Ok(signature);
    }

    if let (Some(width), SignatureFormat::Der) = (alg.coordinate_width(), format) {
        return der_to_raw(&signature, width);
    }

    match alg.raw_signature_len() {
        Some(expected) if signature.len() != expected => Err(CoreError::SignatureLength {
            algorithm: alg.to_string(),
            expected,
            actual: signature.len(),
        }),
        _ => Ok(signature),
    }
}

/// Convert a DER ECDSA signature to `r || s` with each half `width` bytes.
///
/// `width` selects the curve: 32 for P-256, 48 for P-384, 66 for P-521.
pub fn der_to_raw(der: &[u8], width: usize) -> Result<Vec<u8>> {
    let raw = match width {
        32 => p256::ecdsa::Signature::from_der(der).map(|sig| sig.to_bytes().to_vec()),
        48 => p384::ecdsa::Signature::from_der(der).map(|sig| sig.to_bytes().to_vec()),
        66 => p521::ecdsa::Signature::from_der(der).map(|sig| sig.to_bytes().to_vec()),
        _ => return Err(unknown_width(width)),
    };
    raw.map_err(|e| CoreError::MalformedDer(format!("invalid DER signature: {e}")))
}

/// Convert a raw `r || s` signature to DER. The curve follows from the length.
pub fn raw_to_der(raw: &[u8]) -> Result<Vec<u8>> {
    let der = match raw.len() {
        64 => p256::ecdsa::Signature::from_slice(raw).map(|sig| sig.to_der().as_bytes().to_vec()),
        96 => p384::ecdsa::Signature::from_slice(raw).map(|sig| sig.to_der().as_bytes().to_vec()),
        132 => {
            p521::ecdsa::Signature::from_slice(raw).map(|sig| sig.to_der().as_bytes().to_vec())
        }
        len if len % 2 == 0 => return Err(unknown_width(len / 2)),
        len => {
            return Err(CoreError::MalformedDer(format!(
                "raw signature length {len} is not even"
            )))
        }
    };
    der.map_err(|e| CoreError::MalformedDer(format!("invalid raw signature: {e}")))
}

fn unknown_width(width: usize) -> CoreError {
    CoreError::MalformedDer(format!("no curve has coordinate width {width}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAG_SEQUENCE: u8 = 0x30;
    const TAG_INTEGER: u8 = 0x02;

    fn der_from_parts(r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut body = vec![TAG_INTEGER, r.len() as u8];
        body.extend_from_slice(r);
        body.push(TAG_INTEGER);
        body.push(s.len() as u8);
        body.extend_from_slice(s);
        let mut der = vec![TAG_SEQUENCE, body.len() as u8];
        der.extend_from_slice(&body);
        der
    }

    #[test]
    fn test_70_byte_p256_signature_becomes_64_bytes() {
        let r = [0x11u8; 32];
        let s = [0x22u8; 32];
        let der = der_from_parts(&r, &s);
        assert_eq!(der.len(), 70);

        let raw = der_to_raw(&der, 32).unwrap();
        assert_eq!(raw.len(), 64);
        assert_eq!(&raw[..32], &r);
        assert_eq!(&raw[32..], &s);
    }

    #[test]
    fn test_short_component_is_left_padded() {
        let r = [0x7fu8; 31];
        let mut s = vec![0x00];
        s.extend_from_slice(&[0x90u8; 32]);
        let der = der_from_parts(&r, &s);

        let raw = der_to_raw(&der, 32).unwrap();
        assert_eq!(raw[0], 0);
        assert_eq!(&raw[1..32], &r);
        assert_eq!(&raw[32..], &[0x90u8; 32]);
    }

    #[test]
    fn test_p521_long_form_length() {
        let mut r = vec![0x00];
        r.extend_from_slice(&[0x01u8; 65]);
        let s = vec![0x01u8; 66];
        let raw: Vec<u8> = [vec![0u8], r[1..].to_vec(), s.clone()].concat();
        assert_eq!(raw.len(), 132);

        let der = raw_to_der(&raw).unwrap();
        assert_eq!(der[1], 0x81);
        assert_eq!(der_to_raw(&der, 66).unwrap(), raw);
    }

    #[test]
    fn test_rejects_oversized_component() {
        let der = der_from_parts(&[0x01u8; 33], &[0x01u8; 32]);
        assert!(der_to_raw(&der, 32).is_err());
    }

    #[test]
    fn test_rejects_negative_integer() {
        let der = der_from_parts(&[0x80u8; 32], &[0x01u8; 32]);
        assert!(der_to_raw(&der, 32).is_err());
    }

    #[test]
    fn test_rejects_non_minimal_integer() {
        let der = [0x30, 0x08, 0x02, 0x03, 0x00, 0x00, 0x01, 0x02, 0x01, 0x02];
        assert!(matches!(
            der_to_raw(&der, 32),
            Err(CoreError::MalformedDer(_))
        ));
    }

    #[test]
    fn test_rejects_zero_component() {
        let zero_r = [0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x02];
        assert!(der_to_raw(&zero_r, 32).is_err());

        let mut raw = vec![0u8; 64];
        raw[63] = 1;
        assert!(raw_to_der(&raw).is_err());
    }

    #[test]
    fn test_rejects_component_above_curve_order() {
        let r: Vec<u8> = [[0x00u8].as_slice(), &[0xffu8; 32]].concat();
        let der = der_from_parts(&r, &[0x01]);
        assert!(der_to_raw(&der, 32).is_err());

        let raw = [[0xffu8; 32], [0x01u8; 32]].concat();
        assert!(raw_to_der(&raw).is_err());
    }

    #[test]
    fn test_unknown_width_rejected() {
        let der = der_from_parts(&[0x01u8; 8], &[0x01u8; 8]);
        assert!(der_to_raw(&der, 8).is_err());
        assert!(raw_to_der(&[0x01u8; 40]).is_err());
        assert!(raw_to_der(&[0x01u8; 63]).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut der = der_from_parts(&[0x01u8; 32], &[0x01u8; 32]);
        der.push(0);
        assert!(der_to_raw(&der, 32).is_err());
    }

    #[test]
    fn test_rsa_passthrough() {
        let sig = vec![0xabu8; 256];
        let out = normalize_signature(SigningAlgorithm::Ps256, sig.clone(), SignatureFormat::Der)
            .unwrap();
        assert_eq!(out, sig);
    }

    #[test]
    fn test_raw_ec_length_checked() {
        let result =
            normalize_signature(SigningAlgorithm::Es384, vec![0u8; 64], SignatureFormat::Raw);
        assert!(matches!(
            result,
            Err(CoreError::SignatureLength { expected: 96, actual: 64, .. })
        ));
    }

    #[test]
    fn test_der_normalized_for_every_curve() {
        for alg in [
            SigningAlgorithm::Es256,
            SigningAlgorithm::Es384,
            SigningAlgorithm::Es512,
        ] {
            let width = alg.coordinate_width().unwrap();
            let mut raw = vec![0x5au8; width * 2];
            raw[0] = 0;
            raw[width] = 0;
            let der = raw_to_der(&raw).unwrap();
            let out = normalize_signature(alg, der, SignatureFormat::Der).unwrap();
            assert_eq!(out, raw);
        }
    }

    proptest! {
        #[test]
        fn test_raw_der_roundtrip_p256(
            mut r in any::<[u8; 32]>(),
            mut s in any::<[u8; 32]>(),
        ) {
            // Keep both scalars in [1, n).
            for half in [&mut r, &mut s] {
                half[0] &= 0x7f;
                half[31] |= 0x01;
            }
            let raw: Vec<u8> = [r.as_slice(), s.as_slice()].concat();
            let der = raw_to_der(&raw).unwrap();
            prop_assert!(der.len() <= 72);
            prop_assert_eq!(der_to_raw(&der, 32).unwrap(), raw);
        }

        #[test]
        fn test_der_to_raw_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
            let _ = der_to_raw(&bytes, 48);
        }
    }
}
