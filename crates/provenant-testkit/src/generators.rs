//! Proptest strategies for property-based testing.

use proptest::prelude::*;
use provenant_core::{ExclusionRange, HashAlgorithm, SigningAlgorithm};

/// Any supported signing algorithm.
pub fn arb_algorithm() -> impl Strategy<Value = SigningAlgorithm> {
    prop::sample::select(SigningAlgorithm::ALL.to_vec())
}

/// An ECDSA algorithm.
pub fn arb_ec_algorithm() -> impl Strategy<Value = SigningAlgorithm> {
    prop::sample::select(crate::fixtures::EC_ALGORITHMS.to_vec())
}

pub fn arb_hash_algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![
        Just(HashAlgorithm::Sha256),
        Just(HashAlgorithm::Sha384),
        Just(HashAlgorithm::Sha512),
    ]
}

/// Asset bytes of up to `max_len` bytes.
pub fn arb_asset(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Up to four disjoint, non-empty exclusion ranges in ascending order,
/// separated by gaps of up to `max_gap` bytes.
pub fn arb_exclusions(max_gap: u64) -> impl Strategy<Value = Vec<ExclusionRange>> {
    prop::collection::vec((0..=max_gap, 1..=256u64), 0..=4).prop_map(|parts| {
        let mut offset = 0;
        parts
            .into_iter()
            .map(|(gap, length)| {
                let range = ExclusionRange::new(offset + gap, length);
                offset = range.end();
                range
            })
            .collect()
    })
}

/// A valid raw ECDSA signature for `algorithm` with arbitrary component
/// bytes, biased toward leading zeros and high bits.
pub fn arb_raw_signature(algorithm: SigningAlgorithm) -> impl Strategy<Value = Vec<u8>> {
    let width = algorithm.coordinate_width().unwrap_or(32);
    let component = prop_oneof![
        prop::collection::vec(any::<u8>(), width),
        (0..width, prop::collection::vec(any::<u8>(), width)).prop_map(|(zeros, mut bytes)| {
            bytes[..zeros].fill(0);
            bytes
        }),
        prop::collection::vec(any::<u8>(), width).prop_map(|mut bytes| {
            bytes[0] |= 0x80;
            bytes
        }),
    ]
    .prop_map(clamp_scalar);
    (component.clone(), component).prop_map(|(mut r, s)| {
        r.extend_from_slice(&s);
        r
    })
}

/// Bring a big-endian component into `[1, n)` for the curve of its width.
fn clamp_scalar(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() == 66 {
        bytes[0] &= 0x01;
        bytes[1] &= 0xfe;
    } else {
        bytes[0] = bytes[0].min(0xfe);
    }
    if bytes.iter().all(|&b| b == 0) {
        if let Some(last) = bytes.last_mut() {
            *last = 1;
        }
    }
    bytes
}
