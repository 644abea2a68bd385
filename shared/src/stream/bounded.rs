//! Reader capped to a byte budget past its starting offset.

use super::{StreamError, StreamReader, StreamResult};

/// Borrows a reader and fails any read that would take it more than `limit`
/// bytes past the position it had when wrapped.
///
/// Length prefixes decoded through this reader are checked against the budget
/// before their storage is allocated.
#[derive(Debug)]
pub struct BoundedStreamReader<'a, R: StreamReader + ?Sized> {
    inner: &'a mut R,
    start: u64,
    limit: u64,
}

impl<'a, R: StreamReader + ?Sized> BoundedStreamReader<'a, R> {
    pub fn new(inner: &'a mut R, limit: u64) -> StreamResult<Self> {
        let start = inner.position()?;
        Ok(Self {
            inner,
            start,
            limit,
        })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Bytes read past the starting offset so far
    pub fn consumed(&mut self) -> StreamResult<u64> {
        Ok(self.inner.position()?.saturating_sub(self.start))
    }

    fn check(&mut self, len: usize) -> StreamResult<()> {
        let requested = self.consumed()?.saturating_add(len as u64);
        if requested > self.limit {
            return Err(StreamError::LimitExceeded {
                requested,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

impl<R: StreamReader + ?Sized> StreamReader for BoundedStreamReader<'_, R> {
    fn is_good(&self) -> bool {
        self.inner.is_good()
    }

    fn position(&mut self) -> StreamResult<u64> {
        self.inner.position()
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        self.inner.set_position(position)
    }

    fn read_data(&mut self, destination: &mut [u8]) -> StreamResult<()> {
        self.check(destination.len())?;
        self.inner.read_data(destination)
    }

    fn reserve_read(&mut self, len: usize) -> StreamResult<()> {
        self.check(len)?;
        self.inner.reserve_read(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::codec::StreamReaderExt;
    use crate::stream::MemoryStreamReader;

    fn source() -> Buffer {
        let mut buffer = Buffer::with_size(32);
        // Length prefix claiming 1 GiB, then a few real bytes
        buffer.write(&0x4000_0000u32.to_le_bytes(), 0);
        buffer.write(b"abcdefgh", 4);
        buffer
    }

    #[test]
    fn test_reads_within_limit() {
        let buffer = source();
        let mut reader = MemoryStreamReader::new(&buffer);
        reader.set_position(4).unwrap();

        let mut bounded = BoundedStreamReader::new(&mut reader, 8).unwrap();
        assert_eq!(bounded.read_bytes(8).unwrap(), b"abcdefgh");
        assert_eq!(bounded.consumed().unwrap(), 8);
    }

    #[test]
    fn test_read_past_limit_fails_without_moving() {
        let buffer = source();
        let mut reader = MemoryStreamReader::new(&buffer);
        reader.set_position(4).unwrap();

        let mut bounded = BoundedStreamReader::new(&mut reader, 6).unwrap();
        let err = bounded.read_bytes(8).unwrap_err();
        assert!(matches!(
            err,
            StreamError::LimitExceeded {
                requested: 8,
                limit: 6
            }
        ));
        assert_eq!(bounded.consumed().unwrap(), 0);
        assert!(bounded.is_good());
    }

    #[test]
    fn test_oversized_length_prefix_rejected_before_allocation() {
        let buffer = source();
        let mut reader = MemoryStreamReader::new(&buffer);

        let mut bounded = BoundedStreamReader::new(&mut reader, 1024).unwrap();
        let err = bounded.read_string().unwrap_err();
        assert!(matches!(
            err,
            StreamError::LimitExceeded {
                requested,
                limit: 1024
            } if requested == 4 + 0x4000_0000
        ));
    }

    #[test]
    fn test_memory_reader_rejects_length_past_end() {
        let buffer = source();
        let mut reader = MemoryStreamReader::new(&buffer);

        let err = reader.read_buffer(None).unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShortRead {
                position: 4,
                requested: 0x4000_0000,
                transferred: 0
            }
        ));
    }
}
