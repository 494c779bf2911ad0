//! Golden vectors for DER to raw ECDSA signature normalization.
//!
//! Every conforming implementation must map each valid `der` to exactly
//! `raw`, and must reject every vector whose `raw` is `None`.

use provenant_core::SigningAlgorithm;

/// A single normalization vector. Byte strings are hex.
#[derive(Debug, Clone, Copy)]
pub struct DerVector {
    pub name: &'static str,
    pub algorithm: SigningAlgorithm,
    pub der: &'static str,
    pub raw: Option<&'static str>,
}

impl DerVector {
    pub fn der_bytes(&self) -> Vec<u8> {
        hex::decode(self.der).expect("vector hex")
    }

    pub fn raw_bytes(&self) -> Option<Vec<u8>> {
        self.raw.map(|raw| hex::decode(raw).expect("vector hex"))
    }
}

/// All normalization vectors, valid ones first.
pub fn der_vectors() -> Vec<DerVector> {
    vec![
        DerVector {
            name: "es256-minimal",
            algorithm: SigningAlgorithm::Es256,
            der: "3006020101020102",
            raw: Some(concat!(
                "0000000000000000000000000000000000000000000000000000000000000001",
                "0000000000000000000000000000000000000000000000000000000000000002",
            )),
        },
        DerVector {
            name: "es256-high-bit-r",
            algorithm: SigningAlgorithm::Es256,
            der: concat!(
                "3045",
                "0221008011111111111111111111111111111111111111111111111111111111111111",
                "02207f22222222222222222222222222222222222222222222222222222222222222",
            ),
            raw: Some(concat!(
                "8011111111111111111111111111111111111111111111111111111111111111",
                "7f22222222222222222222222222222222222222222222222222222222222222",
            )),
        },
        DerVector {
            name: "es256-both-padded",
            algorithm: SigningAlgorithm::Es256,
            der: concat!(
                "3046",
                "022100e044444444444444444444444444444444444444444444444444444444444444",
                "022100c033333333333333333333333333333333333333333333333333333333333333",
            ),
            raw: Some(concat!(
                "e044444444444444444444444444444444444444444444444444444444444444",
                "c033333333333333333333333333333333333333333333333333333333333333",
            )),
        },
        DerVector {
            name: "es384-short-r",
            algorithm: SigningAlgorithm::Es384,
            der: concat!(
                "3063",
                "022e44444444444444444444444444444444444444444444444444444444444444444444444444444444444444444444",
                "0231009a5555555555555555555555555555555555555555555555555555555555555555555555555555555555555555555555",
            ),
            raw: Some(concat!(
                "000044444444444444444444444444444444444444444444444444444444444444444444444444444444444444444444",
                "9a5555555555555555555555555555555555555555555555555555555555555555555555555555555555555555555555",
            )),
        },
        DerVector {
            name: "es512-long-form",
            algorithm: SigningAlgorithm::Es512,
            der: concat!(
                "308187",
                "0242016666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666",
                "02417777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777",
            ),
            raw: Some(concat!(
                "016666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666666",
                "007777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777777",
            )),
        },
        DerVector {
            name: "reject-trailing-byte",
            algorithm: SigningAlgorithm::Es256,
            der: "300602010102010200",
            raw: None,
        },
        DerVector {
            name: "reject-non-minimal-length",
            algorithm: SigningAlgorithm::Es256,
            der: "308106020101020102",
            raw: None,
        },
        DerVector {
            name: "reject-negative-integer",
            algorithm: SigningAlgorithm::Es256,
            der: "3006020180020102",
            raw: None,
        },
        DerVector {
            name: "reject-wrong-tag",
            algorithm: SigningAlgorithm::Es256,
            der: "3106020101020102",
            raw: None,
        },
        DerVector {
            name: "reject-truncated",
            algorithm: SigningAlgorithm::Es256,
            der: "30060201010201",
            raw: None,
        },
        DerVector {
            name: "reject-non-minimal-integer",
            algorithm: SigningAlgorithm::Es256,
            der: "30080203000001020102",
            raw: None,
        },
        DerVector {
            name: "reject-zero-r",
            algorithm: SigningAlgorithm::Es256,
            der: "3006020100020102",
            raw: None,
        },
        DerVector {
            name: "reject-r-above-order",
            algorithm: SigningAlgorithm::Es256,
            der: concat!(
                "3026",
                "022100ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
                "020102",
            ),
            raw: None,
        },
        DerVector {
            name: "reject-oversized-component",
            algorithm: SigningAlgorithm::Es256,
            der: concat!(
                "3026",
                "0221010000000000000000000000000000000000000000000000000000000000000000",
                "020102",
            ),
            raw: None,
        },
    ]
}
