//! # Provenant Stream
//!
//! The byte-stream contract that carries every asset and manifest byte between
//! caller storage and the signing and embedding logic.
//!
//! ## Key Types
//!
//! - [`Stream`] - The four-operation trait (read, seek, write, flush) plus close
//! - [`ReadOnlyMemoryStream`] - Fixed in-memory buffer
//! - [`MemoryStream`] - Growable buffer with overwrite-in-place writes
//! - [`FileStream`] - Random-access file
//! - [`CallbackStream`] - Operations supplied as caller closures
//! - [`StreamIo`] - `std::io` adapter over any stream
//!
//! ## Design Notes
//!
//! - **EOF vs unsupported**: `read` returns 0 only at end of data; a backend
//!   that cannot perform an operation returns [`StreamError::Unsupported`]
//! - **Clamped transfers**: requests wider than [`MAX_TRANSFER_LEN`] become
//!   partial transfers, not errors
//! - **Bounded cursor**: seeks outside `[0, len]` fail and leave the cursor put

pub mod callback;
pub mod error;
pub mod file;
pub mod io;
pub mod memory;
pub mod traits;

pub use callback::{CallbackStream, CallbackStreamBuilder};
pub use error::{Result, StreamError};
pub use file::FileStream;
pub use io::{copy, StreamIo};
pub use memory::{MemoryStream, ReadOnlyMemoryStream};
pub use traits::{resolve_seek, seek_raw, SeekMode, Stream, MAX_TRANSFER_LEN};
