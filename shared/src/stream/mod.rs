//! Positioned binary streams.
//!
//! A stream is the minimal capability set the typed codec needs: an absolute byte
//! cursor, raw transfer in one direction, and a liveness flag. Two backends exist
//! for each direction:
//!
//! | Direction | Memory                 | File               |
//! |-----------|------------------------|--------------------|
//! | read      | [`MemoryStreamReader`] | [`FileStreamReader`] |
//! | write     | [`MemoryStreamWriter`] | [`FileStreamWriter`] |
//!
//! Every backend checks the number of bytes actually transferred against the
//! request and fails with [`StreamError::ShortRead`] / [`StreamError::ShortWrite`]
//! on a shortfall. A failed transfer also clears the liveness flag.
//!
//! [`BoundedStreamReader`] caps how far past a starting offset a reader may go,
//! so a corrupt length prefix fails before its storage is allocated.
//!
//! Typed operations live in [`crate::codec`] as extension traits, so they are
//! available on every backend.

mod bounded;
mod error;
mod file;
mod memory;

pub use bounded::BoundedStreamReader;
pub use error::{StreamError, StreamResult};
pub use file::{FileStreamReader, FileStreamWriter};
pub use memory::{MemoryStreamReader, MemoryStreamWriter};

/// Readable, seekable byte stream.
pub trait StreamReader {
    /// False once the stream has failed or its cursor has left the readable range.
    fn is_good(&self) -> bool;

    /// Absolute cursor position in bytes.
    fn position(&mut self) -> StreamResult<u64>;

    /// Move the cursor to an absolute byte position.
    fn set_position(&mut self, position: u64) -> StreamResult<()>;

    /// Fill `destination` completely or fail.
    fn read_data(&mut self, destination: &mut [u8]) -> StreamResult<()>;

    /// Check that `len` more bytes may be read before storage for them is
    /// allocated. Backends that cannot tell accept every request.
    fn reserve_read(&mut self, len: usize) -> StreamResult<()> {
        let _ = len;
        Ok(())
    }
}

/// Writable, seekable byte stream.
pub trait StreamWriter {
    /// False once the stream has failed or its cursor has left the writable range.
    fn is_good(&self) -> bool;

    /// Absolute cursor position in bytes.
    fn position(&mut self) -> StreamResult<u64>;

    /// Move the cursor to an absolute byte position.
    fn set_position(&mut self, position: u64) -> StreamResult<()>;

    /// Write all of `data` or fail.
    fn write_data(&mut self, data: &[u8]) -> StreamResult<()>;
}

impl<S: StreamReader + ?Sized> StreamReader for &mut S {
    fn is_good(&self) -> bool {
        (**self).is_good()
    }

    fn position(&mut self) -> StreamResult<u64> {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        (**self).set_position(position)
    }

    fn read_data(&mut self, destination: &mut [u8]) -> StreamResult<()> {
        (**self).read_data(destination)
    }

    fn reserve_read(&mut self, len: usize) -> StreamResult<()> {
        (**self).reserve_read(len)
    }
}

impl<S: StreamWriter + ?Sized> StreamWriter for &mut S {
    fn is_good(&self) -> bool {
        (**self).is_good()
    }

    fn position(&mut self) -> StreamResult<u64> {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        (**self).set_position(position)
    }

    fn write_data(&mut self, data: &[u8]) -> StreamResult<()> {
        (**self).write_data(data)
    }
}
