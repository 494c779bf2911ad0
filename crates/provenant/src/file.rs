//! File-path conveniences over [`FileStream`].

use std::path::Path;

use provenant_core::{DigestDescriptor, ExclusionRange, HashAlgorithm};
use provenant_signer::Signer;
use provenant_stream::{FileStream, Stream};

use crate::config::EmbedConfig;
use crate::error::{Error, Result};
use crate::hash::hash_stream;
use crate::library::init;
use crate::session::SignResult;

/// Sign the asset at `source` into a new file at `dest` in one pass.
///
/// `dest` is created or truncated only after the source has been opened;
/// signing the same path in place is rejected.
pub fn sign_file(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    mime_type: &str,
    signer: &mut Signer,
    config: EmbedConfig,
) -> Result<SignResult> {
    let (source, dest) = (source.as_ref(), dest.as_ref());
    if same_file(source, dest) {
        return Err(Error::InvalidInput(format!(
            "source and destination are the same file: {}",
            source.display()
        )));
    }

    let mut session = init().session(config)?;
    let mut input = FileStream::open(source)?;
    let mut output = match FileStream::create(dest) {
        Ok(output) => output,
        Err(e) => {
            input.close();
            return Err(e.into());
        }
    };

    let result = session.sign(signer, mime_type, &mut input, &mut output);
    input.close();
    output.close();

    if let Ok(signed) = &result {
        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            total_size = signed.total_size,
            "signed file"
        );
    }
    result
}

/// Digest the file at `path`, skipping `exclusions`.
pub fn hash_file(
    path: impl AsRef<Path>,
    alg: HashAlgorithm,
    exclusions: &[ExclusionRange],
) -> Result<DigestDescriptor> {
    let mut stream = FileStream::open(path)?;
    let digest = hash_stream(&mut stream, alg, exclusions);
    stream.close();
    digest
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
