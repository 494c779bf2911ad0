//! Random-access file stream.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StreamError};
use crate::traits::{resolve_seek, SeekMode, Stream};

/// A stream over a file on disk.
#[derive(Debug)]
pub struct FileStream {
    file: Option<File>,
    path: PathBuf,
    writable: bool,
    position: u64,
}

impl FileStream {
    /// Open an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "opened file stream (read-only)");
        Ok(Self::from_parts(file, path, false))
    }

    /// Open an existing file for reading and writing in place.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        tracing::debug!(path = %path.display(), "opened file stream (read-write)");
        Ok(Self::from_parts(file, path, true))
    }

    /// Create or truncate a file for reading and writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        tracing::debug!(path = %path.display(), "created file stream");
        Ok(Self::from_parts(file, path, true))
    }

    fn from_parts(file: File, path: &Path, writable: bool) -> Self {
        Self {
            file: Some(file),
            path: path.to_path_buf(),
            writable,
            position: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(StreamError::Closed { backend: "file" })
    }
}

impl Stream for FileStream {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.file()?.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        let position = self.position;
        let file = self.file()?;
        let len = file.metadata()?.len();
        let target = resolve_seek(position, len, offset, mode)?;
        file.seek(SeekFrom::Start(target))?;
        self.position = target;
        Ok(target)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.writable {
            self.file()?;
            return Err(StreamError::Unsupported {
                op: "write",
                backend: "read-only file",
            });
        }
        let n = self.file()?.write(data)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.file()?.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if self.writable {
                if let Err(e) = file.flush() {
                    tracing::warn!(path = %self.path.display(), error = %e, "flush on close failed");
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}
