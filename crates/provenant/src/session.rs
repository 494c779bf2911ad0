//! Embed sessions: single-pass signing and the two-phase reserve/finalize
//! protocol.
//!
//! A session runs exactly one of two flows:
//!
//! ```text
//! Fresh ──sign()──────────────────────────▶ SinglePass
//! Fresh ──reserve()──▶ Reserved ──finalize()──▶ Finalized
//! ```
//!
//! Any other call is a [`Error::State`]. A reservation is consumed by the
//! first `finalize` attempt, successful or not.

use provenant_core::{
    encode_placeholder, encode_signed, validate_mime_type, Claim, DigestDescriptor,
    ExclusionRange, SignedManifest,
};
use provenant_signer::Signer;
use provenant_stream::{SeekMode, Stream};

use crate::config::EmbedConfig;
use crate::error::{Error, Result};
use crate::hash::hash_stream_with_buffer;

/// Outcome of a single-pass sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResult {
    /// Bytes written to the destination stream.
    pub total_size: u64,
    /// The manifest envelope, when it was not embedded in the destination.
    pub manifest: Option<Vec<u8>>,
}

#[derive(Debug)]
struct Reservation {
    size: usize,
    mime_type: String,
    placeholder: Vec<u8>,
}

#[derive(Debug)]
enum SessionState {
    Fresh,
    SinglePass,
    Reserved(Reservation),
    Finalized,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Fresh => "fresh",
            SessionState::SinglePass => "single-pass",
            SessionState::Reserved(_) => "reserved",
            SessionState::Finalized => "finalized",
        }
    }
}

/// One embedding operation.
#[derive(Debug)]
pub struct EmbedSession {
    config: EmbedConfig,
    state: SessionState,
}

impl EmbedSession {
    pub(crate) fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            state: SessionState::Fresh,
        }
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Manifest slot size for `signer`: its capacity plus configured padding.
    pub fn manifest_size(&self, signer: &Signer) -> Result<usize> {
        Ok(signer.reserve_size()? + self.config.reserve_padding)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single pass
    // ─────────────────────────────────────────────────────────────────────────

    /// Hash `source`, sign a claim over it, then write the signed asset.
    ///
    /// With `embed` set the asset is copied to `dest` followed by the
    /// manifest; otherwise the asset is copied unchanged and the manifest is
    /// returned in [`SignResult::manifest`]. Nothing is written to `dest`
    /// until signing has succeeded.
    pub fn sign(
        &mut self,
        signer: &mut Signer,
        mime_type: &str,
        source: &mut dyn Stream,
        dest: &mut dyn Stream,
    ) -> Result<SignResult> {
        if !matches!(self.state, SessionState::Fresh) {
            return Err(self.state_error("sign"));
        }
        self.state = SessionState::SinglePass;
        validate_mime_type(mime_type)?;

        let asset_len = source.len()?;
        let slot = self.manifest_size(signer)?;
        let exclusions: Vec<ExclusionRange> = if self.config.embed {
            vec![ExclusionRange::new(asset_len, slot as u64)]
        } else {
            Vec::new()
        };
        let digest = hash_stream_with_buffer(
            source,
            self.config.hash_algorithm,
            &exclusions,
            self.config.copy_buffer_size,
        )?;

        let envelope = sign_claim(
            signer,
            mime_type,
            digest,
            self.config.embed.then_some(slot),
        )?;

        source.seek(0, SeekMode::Start)?;
        let mut total =
            provenant_stream::copy(source, dest, self.config.copy_buffer_size)?;
        let manifest = if self.config.embed {
            dest.write_all(&envelope)?;
            total += envelope.len() as u64;
            None
        } else {
            Some(envelope)
        };
        dest.flush()?;

        tracing::debug!(
            mime_type,
            asset_len,
            total_size = total,
            embedded = manifest.is_none(),
            "single-pass sign complete"
        );
        Ok(SignResult {
            total_size: total,
            manifest,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Two phase
    // ─────────────────────────────────────────────────────────────────────────

    /// Reserve `size` bytes for a manifest and return the placeholder to
    /// embed in the asset.
    pub fn reserve(&mut self, size: usize, mime_type: &str) -> Result<Vec<u8>> {
        if !matches!(self.state, SessionState::Fresh) {
            return Err(self.state_error("reserve"));
        }
        let placeholder = encode_placeholder(mime_type, size)?;

        tracing::debug!(size, mime_type, "reserved manifest placeholder");
        self.state = SessionState::Reserved(Reservation {
            size,
            mime_type: mime_type.to_string(),
            placeholder: placeholder.clone(),
        });
        Ok(placeholder)
    }

    /// Reserve exactly what `signer` needs (plus configured padding).
    pub fn reserve_for(&mut self, signer: &Signer, mime_type: &str) -> Result<Vec<u8>> {
        let size = self.manifest_size(signer)?;
        self.reserve(size, mime_type)
    }

    /// Sign `digest` and produce the manifest that replaces the placeholder.
    ///
    /// `digest` must exclude exactly one range of the reserved size; that
    /// range locates the placeholder. When `asset` is given, the placeholder
    /// bytes there are verified and overwritten all-or-nothing. The returned
    /// bytes are always exactly the reserved size.
    pub fn finalize(
        &mut self,
        signer: &mut Signer,
        digest: &DigestDescriptor,
        mime_type: &str,
        asset: Option<&mut dyn Stream>,
    ) -> Result<Vec<u8>> {
        let reservation = match std::mem::replace(&mut self.state, SessionState::Finalized) {
            SessionState::Reserved(r) => r,
            other => {
                self.state = other;
                return Err(self.state_error("finalize"));
            }
        };

        if mime_type != reservation.mime_type {
            return Err(Error::InvalidInput(format!(
                "mime type {mime_type:?} does not match reservation {:?}",
                reservation.mime_type
            )));
        }
        // Descriptor fields are public; re-check what `DigestDescriptor::new` enforces.
        let digest = DigestDescriptor::new(digest.alg, &digest.exclusions, digest.value.clone())?;
        if digest.exclusions.len() > self.config.max_exclusions {
            return Err(Error::InvalidInput(format!(
                "{} exclusions exceeds configured maximum of {}",
                digest.exclusions.len(),
                self.config.max_exclusions
            )));
        }
        let region = placeholder_region(&digest, reservation.size)?;

        let envelope = sign_claim(signer, mime_type, digest, Some(reservation.size))
            .map_err(|e| {
                tracing::warn!(kind = %e.kind(), size = reservation.size, "finalize failed");
                e
            })?;

        if let Some(asset) = asset {
            patch(asset, region.start, &reservation.placeholder, &envelope)?;
        }

        tracing::debug!(
            offset = region.start,
            size = reservation.size,
            "finalized manifest"
        );
        Ok(envelope)
    }

    fn state_error(&self, op: &str) -> Error {
        Error::State(format!("{op} is not allowed in a {} session", self.state.name()))
    }
}

/// Build, sign and encode a claim. `pad_to` fixes the envelope size.
fn sign_claim(
    signer: &mut Signer,
    mime_type: &str,
    digest: DigestDescriptor,
    pad_to: Option<usize>,
) -> Result<Vec<u8>> {
    let claim = Claim::new(
        mime_type,
        signer.algorithm(),
        digest,
        signer.tsa_url().map(str::to_string),
    )?;
    let claim_bytes = claim.to_bytes()?;
    let signature = signer.sign(&claim_bytes)?;
    let manifest = SignedManifest {
        claim_bytes,
        signature,
        certificates: signer.certificates().to_vec(),
    };
    Ok(encode_signed(&manifest, pad_to)?)
}

/// The one exclusion exactly as long as the reservation.
fn placeholder_region(digest: &DigestDescriptor, size: usize) -> Result<ExclusionRange> {
    let mut matches = digest
        .exclusions
        .iter()
        .filter(|r| r.length == size as u64);
    match (matches.next(), matches.next()) {
        (Some(region), None) => Ok(*region),
        (None, _) => Err(Error::InvalidInput(format!(
            "digest does not exclude a {size}-byte placeholder region"
        ))),
        (Some(_), Some(_)) => Err(Error::InvalidInput(format!(
            "digest excludes more than one {size}-byte region"
        ))),
    }
}

/// Overwrite the placeholder at `offset` with `envelope`.
///
/// The region is read back and compared first; nothing is written unless it
/// holds the expected placeholder. A failed write is rolled back.
fn patch(asset: &mut dyn Stream, offset: u64, placeholder: &[u8], envelope: &[u8]) -> Result<()> {
    let offset_i64 = i64::try_from(offset)
        .map_err(|_| Error::InvalidInput(format!("placeholder offset {offset} is too large")))?;

    asset.seek(offset_i64, SeekMode::Start)?;
    let mut current = vec![0u8; placeholder.len()];
    asset.read_fully(&mut current)?;
    if current != placeholder {
        return Err(Error::InvalidInput(format!(
            "asset does not hold the reserved placeholder at offset {offset}"
        )));
    }

    let written = asset
        .seek(offset_i64, SeekMode::Start)
        .and_then(|_| asset.write_all(envelope))
        .and_then(|_| asset.flush());
    if let Err(e) = written {
        tracing::warn!(offset, error = %e, "manifest patch failed, restoring placeholder");
        let restored = asset
            .seek(offset_i64, SeekMode::Start)
            .and_then(|_| asset.write_all(placeholder))
            .and_then(|_| asset.flush());
        if let Err(rollback) = restored {
            tracing::warn!(offset, error = %rollback, "placeholder restore failed");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init;
    use provenant_core::{decode_envelope, Envelope, ErrorKind, HashAlgorithm};
    use provenant_stream::{CallbackStream, MemoryStream};
    use provenant_testkit::generators::{arb_algorithm, arb_asset};
    use proptest::prelude::*;

    fn session() -> EmbedSession {
        init().session(EmbedConfig::default()).unwrap()
    }

    #[test]
    fn test_finalize_before_reserve() {
        let mut s = session();
        let digest = DigestDescriptor::compute(b"x", HashAlgorithm::Sha256, &[]).unwrap();
        let mut signer = provenant_testkit::stub_signer(provenant_core::SigningAlgorithm::Es256);
        let err = s.finalize(&mut signer, &digest, "image/jpeg", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceState);

        // Session still usable for a reservation.
        assert!(s.reserve(2048, "image/jpeg").is_ok());
    }

    #[test]
    fn test_reserve_twice_rejected() {
        let mut s = session();
        s.reserve(2048, "image/jpeg").unwrap();
        assert_eq!(
            s.reserve(2048, "image/jpeg").unwrap_err().kind(),
            ErrorKind::ResourceState
        );
    }

    #[test]
    fn test_reserve_too_small_is_capacity() {
        let mut s = session();
        let err = s.reserve(8, "image/jpeg").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_finalize_rejects_invalid_descriptor() {
        let mut signer = provenant_testkit::stub_signer(provenant_core::SigningAlgorithm::Es256);
        let overlapping = DigestDescriptor {
            alg: HashAlgorithm::Sha256,
            exclusions: vec![ExclusionRange::new(10, 2048), ExclusionRange::new(0, 50)],
            value: vec![1, 2, 3],
        };
        let short_value = DigestDescriptor {
            alg: HashAlgorithm::Sha256,
            exclusions: vec![ExclusionRange::new(10, 2048)],
            value: vec![1, 2, 3],
        };

        for digest in [overlapping, short_value] {
            let mut s = session();
            let placeholder = s.reserve(2048, "image/jpeg").unwrap();
            let mut backing = vec![0u8; 10];
            backing.extend_from_slice(&placeholder);
            let mut asset = MemoryStream::from_vec(backing.clone());

            let err = s
                .finalize(&mut signer, &digest, "image/jpeg", Some(&mut asset))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(asset.as_slice(), backing.as_slice());
        }
    }

    #[test]
    fn test_placeholder_region_must_be_unique() {
        let digest = DigestDescriptor::compute(
            &[0u8; 100],
            HashAlgorithm::Sha256,
            &[ExclusionRange::new(0, 10), ExclusionRange::new(50, 10)],
        )
        .unwrap();
        assert!(placeholder_region(&digest, 10).is_err());
        assert!(placeholder_region(&digest, 20).is_err());
    }

    #[test]
    fn test_patch_refuses_wrong_region() {
        let placeholder = encode_placeholder("image/png", 512).unwrap();
        let mut asset = MemoryStream::from_vec(vec![7u8; 2048]);
        let err = patch(&mut asset, 100, &placeholder, &[1u8; 512]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(asset.as_slice().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_patch_rolls_back_failed_write() {
        use std::sync::{Arc, Mutex};

        let placeholder = encode_placeholder("image/png", 512).unwrap();
        let mut backing = vec![1u8; 100];
        backing.extend_from_slice(&placeholder);
        let data = Arc::new(Mutex::new(backing));
        let pos = Arc::new(Mutex::new(0usize));
        let writes = Arc::new(Mutex::new(0usize));

        let (rd, rp) = (data.clone(), pos.clone());
        let sp = pos.clone();
        let (wd, wp, wc) = (data.clone(), pos, writes);
        let mut asset = CallbackStream::builder()
            .read(move |buf| {
                let data = rd.lock().unwrap();
                let mut pos = rp.lock().unwrap();
                let n = buf.len().min(data.len() - *pos);
                buf[..n].copy_from_slice(&data[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            })
            .seek(move |offset, _| {
                *sp.lock().unwrap() = offset as usize;
                Ok(offset as u64)
            })
            .write(move |bytes| {
                let mut count = wc.lock().unwrap();
                *count += 1;
                let mut data = wd.lock().unwrap();
                let mut pos = wp.lock().unwrap();
                // The first write lands half the envelope, then the device fails.
                let n = if *count == 1 { bytes.len() / 2 } else { bytes.len() };
                data[*pos..*pos + n].copy_from_slice(&bytes[..n]);
                *pos += n;
                if *count == 2 {
                    return Err(std::io::Error::new(std::io::ErrorKind::Other, "device full"));
                }
                Ok(n)
            })
            .flush(|| Ok(()))
            .build();

        let err = patch(&mut asset, 100, &placeholder, &[9u8; 512]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let data = data.lock().unwrap();
        assert_eq!(&data[100..], placeholder.as_slice());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_sign_appends_exactly_the_reserved_size(
            alg in arb_algorithm(),
            asset in arb_asset(1024),
        ) {
            let mut signer = provenant_testkit::stub_signer(alg);
            let slot = signer.reserve_size().unwrap();
            let mut source = provenant_stream::ReadOnlyMemoryStream::new(asset.clone());
            let mut dest = MemoryStream::new();

            let result = session().sign(&mut signer, "image/png", &mut source, &mut dest).unwrap();
            prop_assert_eq!(result.total_size, (asset.len() + slot) as u64);
            prop_assert_eq!(&dest.as_slice()[..asset.len()], asset.as_slice());
            prop_assert!(matches!(
                decode_envelope(&dest.as_slice()[asset.len()..]).unwrap(),
                Envelope::Signed(_)
            ));
        }
    }

    #[test]
    fn test_out_of_band_sign() {
        let config = EmbedConfig {
            embed: false,
            ..EmbedConfig::default()
        };
        let mut s = init().session(config).unwrap();
        let mut signer = provenant_testkit::stub_signer(provenant_core::SigningAlgorithm::Es256);
        let mut source = provenant_stream::ReadOnlyMemoryStream::new(vec![3u8; 300]);
        let mut dest = MemoryStream::new();

        let result = s.sign(&mut signer, "image/png", &mut source, &mut dest).unwrap();
        assert_eq!(result.total_size, 300);
        assert_eq!(dest.as_slice(), &[3u8; 300]);
        let manifest = result.manifest.unwrap();
        assert!(matches!(decode_envelope(&manifest).unwrap(), Envelope::Signed(_)));
    }
}
