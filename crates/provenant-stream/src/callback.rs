//! Caller-supplied stream adapter.
//!
//! Each of the four operations is an optional closure. This is how foreign
//! storage and transports plug into the stream contract: whatever the caller
//! leaves out reports [`StreamError::Unsupported`].

use std::fmt;
use std::io;

use crate::error::{Result, StreamError};
use crate::traits::{SeekMode, Stream};

type ReadFn = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + Send>;
type SeekFn = Box<dyn FnMut(i64, SeekMode) -> io::Result<u64> + Send>;
type WriteFn = Box<dyn FnMut(&[u8]) -> io::Result<usize> + Send>;
type FlushFn = Box<dyn FnMut() -> io::Result<()> + Send>;

const BACKEND: &str = "callback";

/// A stream whose operations are closures.
///
/// ```rust
/// use provenant_stream::{CallbackStream, Stream};
///
/// let mut sink = Vec::new();
/// let mut stream = CallbackStream::builder()
///     .write(move |data| {
///         sink.extend_from_slice(data);
///         Ok(data.len())
///     })
///     .build();
/// assert_eq!(stream.write(b"abc").unwrap(), 3);
/// assert!(stream.read(&mut [0u8; 4]).is_err());
/// ```
pub struct CallbackStream {
    read: Option<ReadFn>,
    seek: Option<SeekFn>,
    write: Option<WriteFn>,
    flush: Option<FlushFn>,
    closed: bool,
}

impl CallbackStream {
    pub fn builder() -> CallbackStreamBuilder {
        CallbackStreamBuilder::default()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StreamError::Closed { backend: BACKEND });
        }
        Ok(())
    }
}

fn unsupported(op: &'static str) -> StreamError {
    StreamError::Unsupported {
        op,
        backend: BACKEND,
    }
}

impl Stream for CallbackStream {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let requested = buf.len();
        let read = self.read.as_mut().ok_or_else(|| unsupported("read"))?;
        let n = read(buf)?;
        if n > requested {
            tracing::warn!(claimed = n, requested, "read callback overran its buffer");
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("read callback reported {n} bytes for a {requested}-byte buffer"),
            )));
        }
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        self.check_open()?;
        let seek = self.seek.as_mut().ok_or_else(|| unsupported("seek"))?;
        Ok(seek(offset, mode)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_open()?;
        let write = self.write.as_mut().ok_or_else(|| unsupported("write"))?;
        let n = write(data)?;
        if n > data.len() {
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("write callback reported {n} bytes for {} supplied", data.len()),
            )));
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        let flush = self.flush.as_mut().ok_or_else(|| unsupported("flush"))?;
        Ok(flush()?)
    }

    fn close(&mut self) {
        self.read = None;
        self.seek = None;
        self.write = None;
        self.flush = None;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for CallbackStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackStream")
            .field("read", &self.read.is_some())
            .field("seek", &self.seek.is_some())
            .field("write", &self.write.is_some())
            .field("flush", &self.flush.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Builder for [`CallbackStream`].
#[derive(Default)]
pub struct CallbackStreamBuilder {
    read: Option<ReadFn>,
    seek: Option<SeekFn>,
    write: Option<WriteFn>,
    flush: Option<FlushFn>,
}

impl CallbackStreamBuilder {
    pub fn read(mut self, f: impl FnMut(&mut [u8]) -> io::Result<usize> + Send + 'static) -> Self {
        self.read = Some(Box::new(f));
        self
    }

    pub fn seek(mut self, f: impl FnMut(i64, SeekMode) -> io::Result<u64> + Send + 'static) -> Self {
        self.seek = Some(Box::new(f));
        self
    }

    pub fn write(mut self, f: impl FnMut(&[u8]) -> io::Result<usize> + Send + 'static) -> Self {
        self.write = Some(Box::new(f));
        self
    }

    pub fn flush(mut self, f: impl FnMut() -> io::Result<()> + Send + 'static) -> Self {
        self.flush = Some(Box::new(f));
        self
    }

    pub fn build(self) -> CallbackStream {
        CallbackStream {
            read: self.read,
            seek: self.seek,
            write: self.write,
            flush: self.flush,
            closed: false,
        }
    }
}
