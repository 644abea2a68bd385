//! Typed transfer on top of the stream protocol.
//!
//! Two kinds of values cross a stream:
//!
//! - **Raw values** ([`RawValue`]): fixed-size records copied as one flat block of
//!   little-endian bytes (integers, floats, byte arrays, fixed pack records).
//! - **Objects** ([`Serializable`]): composite types that supply an explicit
//!   serialize/deserialize pair which issues further typed operations on the same
//!   stream. This is how nested structures compose.
//!
//! Every raw primitive also implements [`Serializable`] by delegating to raw
//! transfer, so sequences and maps pick the per-element strategy through trait
//! resolution at compile time. Nothing is inferred from memory layout at runtime.
//!
//! # Wire conventions
//!
//! ```text
//! string:  u32 byte length, UTF-8 bytes
//! array:   [u32 count], element × count
//! map:     [u32 count], (key, value) × count
//! buffer:  [u32 size], raw bytes
//! ```
//!
//! The bracketed count is omitted when the schema already knows it (the writer
//! passes `write_size = false`, the reader passes `Some(count)`).

mod raw;

#[cfg(test)]
mod tests;

pub use raw::RawValue;

use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};

use smallvec::SmallVec;

use crate::buffer::Buffer;
use crate::stream::{StreamError, StreamReader, StreamResult, StreamWriter};

/// Upper bound on speculative preallocation for sequences read from a stream.
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

const ZERO_CHUNK: [u8; 4096] = [0u8; 4096];

/// A type with an explicit stream serialize/deserialize pair.
pub trait Serializable: Sized {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()>;

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self>;
}

macro_rules! impl_serializable_via_raw {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serializable for $ty {
                fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
                    writer.write_raw(self)
                }

                fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
                    reader.read_raw()
                }
            }
        )*
    };
}

impl_serializable_via_raw!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<const N: usize> Serializable for [u8; N] {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(self)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_raw()
    }
}

impl Serializable for String {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_string(self)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_string()
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_array(self, true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_array(None)
    }
}

impl<K: Serializable + Ord, V: Serializable> Serializable for BTreeMap<K, V> {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_map(self.iter(), true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_map(None)
    }
}

impl<K, V, S> Serializable for hashbrown::HashMap<K, V, S>
where
    K: Serializable + Eq + Hash,
    V: Serializable,
    S: BuildHasher + Default,
{
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_map(self.iter(), true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_map(None)
    }
}

/// Convert an in-memory length to the on-disk `u32` prefix.
fn length_prefix(len: usize) -> StreamResult<u32> {
    u32::try_from(len).map_err(|_| StreamError::LengthOverflow(len))
}

/// Typed write operations available on every [`StreamWriter`].
pub trait StreamWriterExt: StreamWriter {
    /// Write a fixed-size value as one flat block.
    fn write_raw<T: RawValue>(&mut self, value: &T) -> StreamResult<()> {
        let mut bytes: SmallVec<[u8; 32]> = SmallVec::from_elem(0, T::SIZE);
        value.write_le(&mut bytes);
        self.write_data(&bytes)
    }

    /// Write a composite value through its own serializer.
    fn write_object<T: Serializable>(&mut self, value: &T) -> StreamResult<()> {
        value.serialize(self)
    }

    fn write_string(&mut self, value: &str) -> StreamResult<()> {
        self.write_raw(&length_prefix(value.len())?)?;
        self.write_data(value.as_bytes())
    }

    /// Write a sequence, optionally preceded by its element count.
    fn write_array<T: Serializable>(&mut self, items: &[T], write_size: bool) -> StreamResult<()> {
        if write_size {
            self.write_raw(&length_prefix(items.len())?)?;
        }
        for item in items {
            item.serialize(self)?;
        }
        Ok(())
    }

    /// Write key/value pairs, optionally preceded by the pair count.
    fn write_map<'a, K, V, I>(&mut self, entries: I, write_size: bool) -> StreamResult<()>
    where
        K: Serializable + 'a,
        V: Serializable + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        if write_size {
            self.write_raw(&length_prefix(entries.len())?)?;
        }
        for (key, value) in entries {
            key.serialize(self)?;
            value.serialize(self)?;
        }
        Ok(())
    }

    /// Write a buffer's bytes, optionally preceded by its size.
    fn write_buffer(&mut self, buffer: &Buffer, write_size: bool) -> StreamResult<()> {
        if write_size {
            self.write_raw(&length_prefix(buffer.size())?)?;
        }
        self.write_data(buffer.as_bytes())
    }

    /// Write bytes verbatim, without a size prefix.
    fn write_bytes(&mut self, bytes: &[u8]) -> StreamResult<()> {
        self.write_data(bytes)
    }

    /// Write `size` zero bytes.
    fn write_zero(&mut self, size: u64) -> StreamResult<()> {
        let mut left = size;
        while left > 0 {
            let chunk = left.min(ZERO_CHUNK.len() as u64) as usize;
            self.write_data(&ZERO_CHUNK[..chunk])?;
            left -= chunk as u64;
        }
        Ok(())
    }
}

impl<W: StreamWriter + ?Sized> StreamWriterExt for W {}

/// Typed read operations available on every [`StreamReader`].
pub trait StreamReaderExt: StreamReader {
    /// Read a fixed-size value from one flat block.
    fn read_raw<T: RawValue>(&mut self) -> StreamResult<T> {
        let mut bytes: SmallVec<[u8; 32]> = SmallVec::from_elem(0, T::SIZE);
        self.read_data(&mut bytes)?;
        Ok(T::read_le(&bytes))
    }

    /// Read a composite value through its own deserializer.
    fn read_object<T: Serializable>(&mut self) -> StreamResult<T> {
        T::deserialize(self)
    }

    fn read_string(&mut self) -> StreamResult<String> {
        let len = self.read_raw::<u32>()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a sequence. `count` is the known element count, or `None` to read
    /// the count prefix from the stream.
    fn read_array<T: Serializable>(&mut self, count: Option<u32>) -> StreamResult<Vec<T>> {
        let count = match count {
            Some(count) => count,
            None => self.read_raw::<u32>()?,
        } as usize;

        let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));
        for _ in 0..count {
            items.push(T::deserialize(self)?);
        }
        Ok(items)
    }

    /// Read key/value pairs into any collection built from pairs.
    fn read_map<K, V, M>(&mut self, count: Option<u32>) -> StreamResult<M>
    where
        K: Serializable,
        V: Serializable,
        M: FromIterator<(K, V)>,
    {
        let count = match count {
            Some(count) => count,
            None => self.read_raw::<u32>()?,
        };

        (0..count)
            .map(|_| {
                let key = K::deserialize(self)?;
                let value = V::deserialize(self)?;
                Ok((key, value))
            })
            .collect()
    }

    /// Read a buffer of `size` bytes, or of a size read from the stream.
    fn read_buffer(&mut self, size: Option<u32>) -> StreamResult<Buffer> {
        let size = match size {
            Some(size) => size,
            None => self.read_raw::<u32>()?,
        } as usize;

        self.reserve_read(size)?;
        let mut buffer = Buffer::with_size(size);
        self.read_data(buffer.as_bytes_mut())?;
        Ok(buffer)
    }

    /// Read exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> StreamResult<Vec<u8>> {
        self.reserve_read(len)?;
        let mut bytes = vec![0u8; len];
        self.read_data(&mut bytes)?;
        Ok(bytes)
    }
}

impl<R: StreamReader + ?Sized> StreamReaderExt for R {}
