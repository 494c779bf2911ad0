//! Bridges between [`Stream`] and `std::io`.

use std::io;

use crate::error::{Result, StreamError};
use crate::traits::{SeekMode, Stream};

/// Adapts any [`Stream`] to `std::io::{Read, Write, Seek}`.
#[derive(Debug)]
pub struct StreamIo<S> {
    inner: S,
}

impl<S: Stream> StreamIo<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => e,
            StreamError::Unsupported { .. } => io::Error::new(io::ErrorKind::Unsupported, err),
            StreamError::InvalidSeek { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            StreamError::Closed { .. } => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

impl<S: Stream> io::Read for StreamIo<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.inner.read(buf)?)
    }
}

impl<S: Stream> io::Write for StreamIo<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.inner.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.inner.flush()?)
    }
}

impl<S: Stream> io::Seek for StreamIo<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, mode) = match pos {
            io::SeekFrom::Start(n) => (
                i64::try_from(n)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?,
                SeekMode::Start,
            ),
            io::SeekFrom::Current(n) => (n, SeekMode::Current),
            io::SeekFrom::End(n) => (n, SeekMode::End),
        };
        Ok(self.inner.seek(offset, mode)?)
    }
}

/// Copy everything from the cursor of `src` to the cursor of `dst`.
///
/// Returns the number of bytes copied.
pub fn copy(src: &mut dyn Stream, dst: &mut dyn Stream, buf_size: usize) -> Result<u64> {
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStream, ReadOnlyMemoryStream};
    use std::io::{Read, Seek, SeekFrom, Write};

    #[test]
    fn test_std_io_adapter() {
        let mut io = StreamIo::new(MemoryStream::new());
        io.write_all(b"provenance").unwrap();
        io.seek(SeekFrom::Start(3)).unwrap();
        let mut out = String::new();
        io.read_to_string(&mut out).unwrap();
        assert_eq!(out, "venance");
    }

    #[test]
    fn test_unsupported_maps_to_io_kind() {
        let mut io = StreamIo::new(ReadOnlyMemoryStream::new(vec![1u8]));
        let err = io.write(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_copy_small_buffer() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let mut src = ReadOnlyMemoryStream::new(data.clone());
        let mut dst = MemoryStream::new();
        assert_eq!(copy(&mut src, &mut dst, 7).unwrap(), 10_000);
        assert_eq!(dst.as_slice(), data.as_slice());
    }
}
