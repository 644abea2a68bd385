//! Shared low-level types for the Forge engine.
//!
//! This crate provides the binary plumbing used by asset containers such as the
//! shader pack:
//!
//! - [`buffer`] - Owned raw byte storage
//! - [`hash`] - Stable FNV-1a name hashing
//! - [`stream`] - Positioned byte streams over memory and files
//! - [`codec`] - Typed transfer (raw values, strings, sequences, maps, objects)

pub mod buffer;
pub mod codec;
pub mod hash;
pub mod stream;

pub use buffer::Buffer;
pub use codec::{RawValue, Serializable, StreamReaderExt, StreamWriterExt};
pub use hash::{fnv1a_32, name_hash};
pub use stream::{
    BoundedStreamReader, FileStreamReader, FileStreamWriter, MemoryStreamReader, MemoryStreamWriter, StreamError,
    StreamReader, StreamResult, StreamWriter,
};
