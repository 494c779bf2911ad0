//! Stream trait: the four-operation contract every asset byte travels through.
//!
//! Implementations include fixed and growable memory buffers, files, and a
//! fully caller-supplied callback adapter.

use crate::error::{Result, StreamError};

/// Largest single transfer. Longer requests are clamped, not rejected.
pub const MAX_TRANSFER_LEN: usize = i32::MAX as usize;

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekMode {
    Start,
    Current,
    End,
}

impl SeekMode {
    /// Decode the raw wire code (0 start, 1 current, 2 end).
    pub fn from_raw(code: i32) -> Option<Self> {
        match code {
            0 => Some(SeekMode::Start),
            1 => Some(SeekMode::Current),
            2 => Some(SeekMode::End),
            _ => None,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            SeekMode::Start => 0,
            SeekMode::Current => 1,
            SeekMode::End => 2,
        }
    }
}

/// A byte store with a cursor.
///
/// # Design Notes
///
/// - **EOF is 0**: `read` returns 0 only at end of stream. Backends that cannot
///   perform an operation return [`StreamError::Unsupported`] instead.
/// - **Bounded cursor**: the position always lies in `[0, len]`; seeks that
///   would leave that range fail without moving the cursor.
/// - **Explicit release**: `close` frees the backing resource, is idempotent,
///   and every later operation fails with [`StreamError::Closed`].
pub trait Stream: Send {
    /// Short backend name for errors and logs.
    fn backend(&self) -> &'static str;

    // ─────────────────────────────────────────────────────────────────────────
    // Required operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Read up to `buf.len()` bytes at the cursor.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Move the cursor and return the new absolute position.
    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64>;

    /// Write `data` at the cursor and return how much was written.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Push buffered writes to the backing store.
    fn flush(&mut self) -> Result<()>;

    /// Release the backing resource.
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    // ─────────────────────────────────────────────────────────────────────────
    // Provided helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Read with a caller-supplied length that may exceed what a buffer can
    /// index. The request is clamped to the buffer and [`MAX_TRANSFER_LEN`].
    fn read_up_to(&mut self, buf: &mut [u8], requested: u64) -> Result<usize> {
        let len = clamp_len(requested, buf.len());
        self.read(&mut buf[..len])
    }

    /// Write counterpart of [`Stream::read_up_to`].
    fn write_up_to(&mut self, data: &[u8], requested: u64) -> Result<usize> {
        let len = clamp_len(requested, data.len());
        self.write(&data[..len])
    }

    /// Write every byte of `data`.
    fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Err(StreamError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "stream accepted no bytes",
                )));
            }
            data = &data[n..];
        }
        Ok(())
    }

    /// Fill `buf` completely; fails if the stream ends first.
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(StreamError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("stream ended after {filled} of {} bytes", buf.len()),
                )));
            }
            filled += n;
        }
        Ok(())
    }

    /// Current absolute position.
    fn position(&mut self) -> Result<u64> {
        self.seek(0, SeekMode::Current)
    }

    /// Total length; the cursor is left where it was.
    fn len(&mut self) -> Result<u64> {
        let pos = self.position()?;
        let end = self.seek(0, SeekMode::End)?;
        let pos = i64::try_from(pos).map_err(|_| StreamError::InvalidSeek {
            offset: i64::MAX,
            mode: SeekMode::Start,
            len: end,
        })?;
        self.seek(pos, SeekMode::Start)?;
        Ok(end)
    }

    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        (**self).seek(offset, mode)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Seek using a raw mode code.
///
/// Returns the new position, or `-1` when the mode is not one of 0, 1, 2 or
/// the seek fails.
pub fn seek_raw(stream: &mut dyn Stream, offset: i64, code: i32) -> i64 {
    let Some(mode) = SeekMode::from_raw(code) else {
        return -1;
    };
    match stream.seek(offset, mode) {
        Ok(pos) => i64::try_from(pos).unwrap_or(-1),
        Err(_) => -1,
    }
}

/// Resolve a seek against a cursor and length, keeping the result in
/// `[0, len]`.
pub fn resolve_seek(position: u64, len: u64, offset: i64, mode: SeekMode) -> Result<u64> {
    let base = match mode {
        SeekMode::Start => 0,
        SeekMode::Current => position,
        SeekMode::End => len,
    };
    let invalid = || StreamError::InvalidSeek { offset, mode, len };

    let target = i128::from(base) + i128::from(offset);
    if target < 0 || target > i128::from(len) {
        return Err(invalid());
    }
    u64::try_from(target).map_err(|_| invalid())
}

fn clamp_len(requested: u64, available: usize) -> usize {
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    requested.min(available).min(MAX_TRANSFER_LEN)
}
