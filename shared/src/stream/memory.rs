//! Streams bounded by a caller-supplied [`Buffer`].

use super::{StreamError, StreamReader, StreamResult, StreamWriter};
use crate::buffer::Buffer;

/// Reads from a borrowed buffer.
#[derive(Debug)]
pub struct MemoryStreamReader<'a> {
    buffer: &'a Buffer,
    position: u64,
    failed: bool,
}

impl<'a> MemoryStreamReader<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        Self {
            buffer,
            position: 0,
            failed: false,
        }
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        (self.buffer.size() as u64).saturating_sub(self.position) as usize
    }
}

impl StreamReader for MemoryStreamReader<'_> {
    fn is_good(&self) -> bool {
        !self.failed && self.position <= self.buffer.size() as u64
    }

    fn position(&mut self) -> StreamResult<u64> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        self.position = position;
        Ok(())
    }

    fn read_data(&mut self, destination: &mut [u8]) -> StreamResult<()> {
        let requested = destination.len();
        if requested > self.remaining() || !self.is_good() {
            self.failed = true;
            return Err(StreamError::ShortRead {
                position: self.position,
                requested,
                transferred: 0,
            });
        }

        let start = self.position as usize;
        destination.copy_from_slice(&self.buffer.as_bytes()[start..start + requested]);
        self.position += requested as u64;
        Ok(())
    }

    fn reserve_read(&mut self, len: usize) -> StreamResult<()> {
        if len > self.remaining() {
            self.failed = true;
            return Err(StreamError::ShortRead {
                position: self.position,
                requested: len,
                transferred: 0,
            });
        }
        Ok(())
    }
}

/// Writes into a borrowed buffer without ever growing it.
#[derive(Debug)]
pub struct MemoryStreamWriter<'a> {
    buffer: &'a mut Buffer,
    position: u64,
    failed: bool,
}

impl<'a> MemoryStreamWriter<'a> {
    /// Wrap `buffer`, allocating `capacity` bytes first if it is smaller.
    ///
    /// Reallocation discards the previous contents.
    pub fn new(buffer: &'a mut Buffer, capacity: usize) -> Self {
        if capacity > buffer.size() {
            buffer.allocate(capacity);
        }
        Self {
            buffer,
            position: 0,
            failed: false,
        }
    }

    pub fn remaining(&self) -> usize {
        (self.buffer.size() as u64).saturating_sub(self.position) as usize
    }
}

impl StreamWriter for MemoryStreamWriter<'_> {
    fn is_good(&self) -> bool {
        !self.failed && self.position <= self.buffer.size() as u64
    }

    fn position(&mut self) -> StreamResult<u64> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        self.position = position;
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> StreamResult<()> {
        if data.len() > self.remaining() || !self.is_good() {
            self.failed = true;
            return Err(StreamError::ShortWrite {
                position: self.position,
                requested: data.len(),
                transferred: 0,
            });
        }

        self.buffer.write(data, self.position as usize);
        self.position += data.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_advances_cursor() {
        let buffer = Buffer::copy(&[1, 2, 3, 4, 5]);
        let mut reader = MemoryStreamReader::new(&buffer);

        let mut first = [0u8; 2];
        reader.read_data(&mut first).unwrap();
        let mut second = [0u8; 3];
        reader.read_data(&mut second).unwrap();

        assert_eq!(first, [1, 2]);
        assert_eq!(second, [3, 4, 5]);
        assert_eq!(reader.position().unwrap(), 5);
        assert!(reader.is_good());
    }

    #[test]
    fn test_reader_overrun_fails() {
        let buffer = Buffer::copy(&[1, 2, 3]);
        let mut reader = MemoryStreamReader::new(&buffer);

        let mut dst = [0u8; 4];
        let err = reader.read_data(&mut dst).unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShortRead {
                requested: 4,
                transferred: 0,
                ..
            }
        ));
        assert!(!reader.is_good());
    }

    #[test]
    fn test_reader_position_past_end_is_not_good() {
        let buffer = Buffer::copy(&[0; 4]);
        let mut reader = MemoryStreamReader::new(&buffer);
        reader.set_position(5).unwrap();
        assert!(!reader.is_good());

        let mut dst = [0u8; 1];
        assert!(reader.read_data(&mut dst).is_err());
    }

    #[test]
    fn test_writer_allocates_capacity() {
        let mut buffer = Buffer::new();
        let mut writer = MemoryStreamWriter::new(&mut buffer, 8);
        writer.write_data(&[7; 8]).unwrap();
        assert_eq!(writer.remaining(), 0);
        drop(writer);

        assert_eq!(buffer.as_bytes(), &[7; 8]);
    }

    #[test]
    fn test_writer_does_not_grow() {
        let mut buffer = Buffer::with_size(4);
        let mut writer = MemoryStreamWriter::new(&mut buffer, 0);
        writer.write_data(&[1, 2, 3]).unwrap();

        let err = writer.write_data(&[4, 5]).unwrap_err();
        assert!(matches!(err, StreamError::ShortWrite { requested: 2, .. }));
        assert!(!writer.is_good());
        drop(writer);

        assert_eq!(buffer.size(), 4);
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_writer_seek_and_overwrite() {
        let mut buffer = Buffer::with_size(6);
        let mut writer = MemoryStreamWriter::new(&mut buffer, 6);
        writer.write_data(&[0; 6]).unwrap();
        writer.set_position(2).unwrap();
        writer.write_data(&[9, 9]).unwrap();
        assert_eq!(writer.position().unwrap(), 4);
        drop(writer);

        assert_eq!(buffer.as_bytes(), &[0, 0, 9, 9, 0, 0]);
    }
}
