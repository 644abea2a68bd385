//! Owned raw byte storage.
//!
//! [`Buffer`] is the storage unit handed to the memory-backed streams. It owns
//! its bytes exclusively; [`Buffer::copy`] always duplicates, so two buffers never
//! alias the same allocation.
//!
//! Out-of-bounds access is a programmer error (a corrupt schema or a wrong offset
//! computed by the caller), not an input error, so the accessors assert instead of
//! returning a `Result`.

use std::ops::{Index, IndexMut};

use bytemuck::Pod;

/// Owned, resizable block of raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Create a null buffer (no storage).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with `size` zeroed bytes.
    pub fn with_size(size: usize) -> Self {
        let mut buffer = Self::new();
        buffer.allocate(size);
        buffer
    }

    /// Duplicate `source` into a fresh allocation.
    pub fn copy(source: &[u8]) -> Self {
        Self {
            data: source.to_vec(),
        }
    }

    /// Drop any previous storage and allocate `size` bytes.
    ///
    /// A size of zero leaves the buffer null.
    pub fn allocate(&mut self, size: usize) {
        self.release();
        if size == 0 {
            return;
        }
        self.data = vec![0u8; size];
    }

    /// Free the storage. Calling this on a null buffer does nothing.
    pub fn release(&mut self) {
        self.data = Vec::new();
    }

    /// Fill the whole buffer with zeros.
    pub fn zero_initialize(&mut self) {
        self.data.fill(0);
    }

    /// Allocated length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer holds storage.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read a `T` stored at `offset`.
    ///
    /// The read copies, so `offset` needs no particular alignment.
    ///
    /// # Panics
    ///
    /// Panics if `offset + size_of::<T>()` exceeds the buffer.
    pub fn read<T: Pod>(&self, offset: usize) -> T {
        let size = std::mem::size_of::<T>();
        self.assert_in_bounds(offset, size);
        bytemuck::pod_read_unaligned(&self.data[offset..offset + size])
    }

    /// Copy `size` bytes starting at `offset` out of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the buffer.
    pub fn read_bytes(&self, size: usize, offset: usize) -> Vec<u8> {
        self.assert_in_bounds(offset, size);
        self.data[offset..offset + size].to_vec()
    }

    /// Copy `data` into the buffer at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + data.len()` exceeds the allocated size.
    pub fn write(&mut self, data: &[u8], offset: usize) {
        self.assert_in_bounds(offset, data.len());
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// View the whole buffer as a slice of `T`.
    ///
    /// Returns `None` when the storage is misaligned for `T` or its length is not
    /// a multiple of `size_of::<T>()`.
    pub fn as_slice_of<T: Pod>(&self) -> Option<&[T]> {
        bytemuck::try_cast_slice(&self.data).ok()
    }

    /// Consume the buffer, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    fn assert_in_bounds(&self, offset: usize, size: usize) {
        let end = offset.checked_add(size);
        assert!(
            end.is_some_and(|end| end <= self.data.len()),
            "buffer access out of bounds: offset {} + size {} > capacity {}",
            offset,
            size,
            self.data.len()
        );
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Index<usize> for Buffer {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Buffer {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.data[index]
    }
}
