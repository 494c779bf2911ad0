//! Streaming digests with excluded ranges.

use provenant_core::{normalize_exclusions, DigestDescriptor, ExclusionRange, HashAlgorithm};
use provenant_stream::{SeekMode, Stream};

use crate::error::Result;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Hash a whole stream, skipping `exclusions`.
///
/// This is the out-of-band hashing step of the two-phase protocol for callers
/// that hold the asset as a [`Stream`]. The stream is read from the start and
/// left at its end.
pub fn hash_stream(
    stream: &mut dyn Stream,
    alg: HashAlgorithm,
    exclusions: &[ExclusionRange],
) -> Result<DigestDescriptor> {
    hash_stream_with_buffer(stream, alg, exclusions, DEFAULT_BUFFER_SIZE)
}

pub(crate) fn hash_stream_with_buffer(
    stream: &mut dyn Stream,
    alg: HashAlgorithm,
    exclusions: &[ExclusionRange],
    buffer_size: usize,
) -> Result<DigestDescriptor> {
    let exclusions = normalize_exclusions(exclusions)?;
    let mut hasher = alg.hasher();
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut offset = 0u64;

    stream.seek(0, SeekMode::Start)?;
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        feed_included(&mut hasher, &buf[..n], offset, &exclusions);
        offset += n as u64;
    }

    Ok(DigestDescriptor::new(alg, &exclusions, hasher.finalize())?)
}

/// Feed the parts of `chunk` (starting at absolute `offset`) that fall
/// outside every exclusion. `exclusions` must be sorted.
fn feed_included(
    hasher: &mut provenant_core::Hasher,
    chunk: &[u8],
    offset: u64,
    exclusions: &[ExclusionRange],
) {
    let chunk_end = offset + chunk.len() as u64;
    let mut cursor = offset;

    for range in exclusions {
        if range.end() <= cursor {
            continue;
        }
        if range.start >= chunk_end {
            break;
        }
        if range.start > cursor {
            hasher.update(&chunk[(cursor - offset) as usize..(range.start - offset) as usize]);
        }
        cursor = range.end().min(chunk_end);
    }
    if cursor < chunk_end {
        hasher.update(&chunk[(cursor - offset) as usize..]);
    }
}
