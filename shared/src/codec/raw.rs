//! Flat little-endian values.

use byteorder::{ByteOrder, LittleEndian};

/// A fixed-size value transferred as one flat byte copy.
///
/// Multi-byte fields are always encoded little-endian, so a value written on one
/// host decodes identically on any other. Implementors must write and read exactly
/// [`RawValue::SIZE`] bytes.
pub trait RawValue: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Encode into `out`, which is exactly `SIZE` bytes long.
    fn write_le(&self, out: &mut [u8]);

    /// Decode from `bytes`, which is exactly `SIZE` bytes long.
    fn read_le(bytes: &[u8]) -> Self;
}

impl RawValue for u8 {
    const SIZE: usize = 1;

    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl RawValue for i8 {
    const SIZE: usize = 1;

    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

macro_rules! impl_raw_value {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl RawValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn write_le(&self, out: &mut [u8]) {
                    LittleEndian::$write(out, *self);
                }

                fn read_le(bytes: &[u8]) -> Self {
                    LittleEndian::$read(bytes)
                }
            }
        )*
    };
}

impl_raw_value! {
    u16 => read_u16, write_u16;
    u32 => read_u32, write_u32;
    u64 => read_u64, write_u64;
    i16 => read_i16, write_i16;
    i32 => read_i32, write_i32;
    i64 => read_i64, write_i64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

impl<const N: usize> RawValue for [u8; N] {
    const SIZE: usize = N;

    fn write_le(&self, out: &mut [u8]) {
        out.copy_from_slice(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut value = [0u8; N];
        value.copy_from_slice(bytes);
        value
    }
}
