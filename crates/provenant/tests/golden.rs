//! Golden vectors for signature normalization.
//!
//! Every implementation must map each valid DER signature to identical raw
//! bytes and reject each malformed one.

use provenant::core::{der_to_raw, normalize_signature, ErrorKind};
use provenant::SignatureFormat;
use provenant_testkit::vectors::der_vectors;

#[test]
fn test_der_vectors() {
    for v in der_vectors() {
        let width = v.algorithm.coordinate_width().unwrap();
        let result = der_to_raw(&v.der_bytes(), width);
        match v.raw_bytes() {
            Some(raw) => assert_eq!(result.unwrap(), raw, "{}", v.name),
            None => assert!(result.is_err(), "{} should be rejected", v.name),
        }
    }
}

#[test]
fn test_der_vectors_through_normalize() {
    for v in der_vectors() {
        let result = normalize_signature(v.algorithm, v.der_bytes(), SignatureFormat::Der);
        match v.raw_bytes() {
            Some(raw) => assert_eq!(result.unwrap(), raw, "{}", v.name),
            None => assert_eq!(result.unwrap_err().kind(), ErrorKind::Signing, "{}", v.name),
        }
    }
}

#[test]
fn test_raw_vectors_pass_through_unchanged() {
    for v in der_vectors() {
        if let Some(raw) = v.raw_bytes() {
            let normalized =
                normalize_signature(v.algorithm, raw.clone(), SignatureFormat::Raw).unwrap();
            assert_eq!(normalized, raw, "{}", v.name);
        }
    }
}
