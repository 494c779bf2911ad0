//! Digest descriptors: the output of the out-of-band hashing step.
//!
//! A descriptor records which hash was used, which byte ranges of the asset
//! were skipped, and the resulting digest value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::algorithm::HashAlgorithm;
use crate::error::{CoreError, Result};

/// Maximum number of exclusion ranges a descriptor may carry.
pub const MAX_EXCLUSIONS: usize = 16;

/// A byte range of the asset left out of the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExclusionRange {
    /// Absolute offset of the first excluded byte.
    pub start: u64,
    /// Number of excluded bytes.
    pub length: u64,
}

impl ExclusionRange {
    /// Range of `length` bytes starting at `start`. Validity is checked by
    /// [`normalize_exclusions`], not here.
    pub const fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// One past the last excluded byte.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Whether `offset` falls inside the range.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Sort and validate a set of exclusions.
///
/// Ranges must be non-empty, must not overlap, must not overflow `u64`, and
/// there may be at most [`MAX_EXCLUSIONS`] of them.
pub fn normalize_exclusions(exclusions: &[ExclusionRange]) -> Result<Vec<ExclusionRange>> {
    if exclusions.len() > MAX_EXCLUSIONS {
        return Err(CoreError::InvalidExclusions(format!(
            "{} ranges exceeds maximum of {}",
            exclusions.len(),
            MAX_EXCLUSIONS
        )));
    }

    let mut sorted = exclusions.to_vec();
    sorted.sort();

    for range in &sorted {
        if range.length == 0 {
            return Err(CoreError::InvalidExclusions(format!(
                "empty range at offset {}",
                range.start
            )));
        }
        if range.start.checked_add(range.length).is_none() {
            return Err(CoreError::InvalidExclusions(format!(
                "range at offset {} overflows",
                range.start
            )));
        }
    }

    for pair in sorted.windows(2) {
        if pair[1].start < pair[0].end() {
            return Err(CoreError::InvalidExclusions(format!(
                "ranges at {} and {} overlap",
                pair[0].start, pair[1].start
            )));
        }
    }

    Ok(sorted)
}

/// Hash algorithm, excluded ranges, and digest value for an asset.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestDescriptor {
    /// The hash algorithm used.
    pub alg: HashAlgorithm,
    /// Byte ranges skipped while hashing (sorted, non-overlapping).
    pub exclusions: Vec<ExclusionRange>,
    /// The digest value.
    #[serde(rename = "hash", with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl DigestDescriptor {
    /// Build a descriptor from already computed parts.
    ///
    /// Validates the exclusions and the digest length.
    pub fn new(alg: HashAlgorithm, exclusions: &[ExclusionRange], value: Vec<u8>) -> Result<Self> {
        let exclusions = normalize_exclusions(exclusions)?;
        if value.len() != alg.output_len() {
            return Err(CoreError::InvalidDigest(format!(
                "{} digest must be {} bytes, got {}",
                alg,
                alg.output_len(),
                value.len()
            )));
        }
        Ok(Self {
            alg,
            exclusions,
            value,
        })
    }

    /// Hash `data`, skipping every excluded range.
    ///
    /// Ranges that extend past the end of `data` are skipped as far as the
    /// data goes.
    pub fn compute(data: &[u8], alg: HashAlgorithm, exclusions: &[ExclusionRange]) -> Result<Self> {
        let exclusions = normalize_exclusions(exclusions)?;
        let mut hasher = alg.hasher();
        let mut cursor = 0usize;

        for range in &exclusions {
            let start = usize::try_from(range.start).unwrap_or(usize::MAX).min(data.len());
            let end = usize::try_from(range.end()).unwrap_or(usize::MAX).min(data.len());
            if start > cursor {
                hasher.update(&data[cursor..start]);
            }
            cursor = cursor.max(end);
        }
        if cursor < data.len() {
            hasher.update(&data[cursor..]);
        }

        Ok(Self {
            alg,
            exclusions,
            value: hasher.finalize(),
        })
    }

    /// Find the exclusion that exactly covers a region of `length` bytes.
    pub fn exclusion_of_length(&self, length: u64) -> Option<&ExclusionRange> {
        self.exclusions.iter().find(|range| range.length == length)
    }

    /// Parse a descriptor from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: DigestDescriptor =
            serde_json::from_str(json).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        DigestDescriptor::new(parsed.alg, &parsed.exclusions, parsed.value)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Digest as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

impl fmt::Debug for DigestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        f.debug_struct("DigestDescriptor")
            .field("alg", &self.alg)
            .field("exclusions", &self.exclusions)
            .field("value", &&hex[..hex.len().min(16)])
            .finish()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
