//! In-memory stream backends.
//!
//! [`ReadOnlyMemoryStream`] wraps a fixed buffer; [`MemoryStream`] is a
//! growable read/write buffer whose writes overwrite in place and extend
//! past the end.

use bytes::Bytes;

use crate::error::{Result, StreamError};
use crate::traits::{resolve_seek, SeekMode, Stream};

/// A fixed, read-only buffer.
#[derive(Debug, Clone)]
pub struct ReadOnlyMemoryStream {
    data: Bytes,
    position: u64,
    closed: bool,
}

impl ReadOnlyMemoryStream {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            closed: false,
        }
    }

    /// The whole buffer, independent of the cursor.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StreamError::Closed {
                backend: self.backend(),
            });
        }
        Ok(())
    }
}

impl Stream for ReadOnlyMemoryStream {
    fn backend(&self) -> &'static str {
        "read-only memory"
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let n = read_from(&self.data, self.position, buf);
        self.position += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        self.check_open()?;
        self.position = resolve_seek(self.position, self.data.len() as u64, offset, mode)?;
        Ok(self.position)
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        self.check_open()?;
        Err(StreamError::Unsupported {
            op: "write",
            backend: self.backend(),
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()
    }

    fn close(&mut self) {
        self.data = Bytes::new();
        self.position = 0;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// A growable read/write buffer.
///
/// Writes inside the already-written region overwrite in place; writes that
/// run past the end extend the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: u64,
    closed: bool,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents with the cursor at 0.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            closed: false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StreamError::Closed {
                backend: self.backend(),
            });
        }
        Ok(())
    }
}

impl Stream for MemoryStream {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let n = read_from(&self.data, self.position, buf);
        self.position += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        self.check_open()?;
        self.position = resolve_seek(self.position, self.data.len() as u64, offset, mode)?;
        Ok(self.position)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_open()?;
        // The cursor never exceeds the length, so it fits in usize.
        let start = self.position as usize;
        let end = start + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);
        self.position = end as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()
    }

    fn close(&mut self) {
        self.data = Vec::new();
        self.position = 0;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

fn read_from(data: &[u8], position: u64, buf: &mut [u8]) -> usize {
    let start = (position as usize).min(data.len());
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}
