//! Tests for the typed stream codec

use super::*;
use crate::stream::{MemoryStreamReader, MemoryStreamWriter};

#[derive(Debug, Clone, PartialEq)]
struct Binding {
    slot: u32,
    name: String,
    sizes: Vec<u16>,
}

impl Serializable for Binding {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.slot)?;
        writer.write_string(&self.name)?;
        writer.write_array(&self.sizes, true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            slot: reader.read_raw()?,
            name: reader.read_string()?,
            sizes: reader.read_array(None)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Layout {
    bindings: BTreeMap<u32, Binding>,
    tags: Vec<String>,
}

impl Serializable for Layout {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_map(self.bindings.iter(), true)?;
        writer.write_array(&self.tags, true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            bindings: reader.read_map(None)?,
            tags: reader.read_array(None)?,
        })
    }
}

/// Serialize `value` into a fresh buffer sized to fit exactly.
fn encode<T: Serializable>(value: &T, capacity: usize) -> (Buffer, u64) {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, capacity);
    writer.write_object(value).unwrap();
    let written = writer.position().unwrap();
    (buffer, written)
}

#[test]
fn test_raw_values_are_little_endian() {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 15);
    writer.write_raw(&0x0102_0304u32).unwrap();
    writer.write_raw(&0x0A0B_0C0D_0E0F_1011u64).unwrap();
    writer.write_raw(&0x2233u16).unwrap();
    writer.write_raw(&0x44u8).unwrap();
    drop(writer);

    assert_eq!(
        buffer.as_bytes(),
        &[
            0x04, 0x03, 0x02, 0x01, // u32
            0x11, 0x10, 0x0F, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, // u64
            0x33, 0x22, // u16
            0x44, // u8
        ]
    );
}

#[test]
fn test_raw_signed_and_float() {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 64);
    writer.write_raw(&-5i32).unwrap();
    writer.write_raw(&1.5f32).unwrap();
    writer.write_raw(&-0.25f64).unwrap();
    writer.write_raw(&-1i8).unwrap();
    writer.write_raw(b"FGSP").unwrap();
    drop(writer);

    let mut reader = MemoryStreamReader::new(&buffer);
    assert_eq!(reader.read_raw::<i32>().unwrap(), -5);
    assert_eq!(reader.read_raw::<f32>().unwrap(), 1.5);
    assert_eq!(reader.read_raw::<f64>().unwrap(), -0.25);
    assert_eq!(reader.read_raw::<i8>().unwrap(), -1);
    assert_eq!(&reader.read_raw::<[u8; 4]>().unwrap(), b"FGSP");
}

#[test]
fn test_string_wire_format() {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 7);
    writer.write_string("abc").unwrap();
    drop(writer);

    assert_eq!(buffer.as_bytes(), &[3, 0, 0, 0, b'a', b'b', b'c']);

    let mut reader = MemoryStreamReader::new(&buffer);
    assert_eq!(reader.read_string().unwrap(), "abc");
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let buffer = Buffer::copy(&[2, 0, 0, 0, 0xFF, 0xFE]);
    let mut reader = MemoryStreamReader::new(&buffer);
    assert!(matches!(
        reader.read_string(),
        Err(StreamError::InvalidUtf8(_))
    ));
}

#[test]
fn test_nested_objects() {
    let mut bindings = BTreeMap::new();
    bindings.insert(
        0,
        Binding {
            slot: 0,
            name: "camera".to_string(),
            sizes: vec![64, 16],
        },
    );
    bindings.insert(
        3,
        Binding {
            slot: 3,
            name: "lights".to_string(),
            sizes: vec![],
        },
    );
    let layout = Layout {
        bindings,
        tags: vec!["opaque".to_string(), "shadowed".to_string()],
    };

    let (buffer, _) = encode(&layout, 256);
    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: Layout = reader.read_object().unwrap();

    assert_eq!(decoded, layout);
}

#[test]
fn test_array_with_known_count_omits_prefix() {
    let values = vec![1u32, 2, 3];

    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 12);
    writer.write_array(&values, false).unwrap();
    assert_eq!(writer.position().unwrap(), 12);
    drop(writer);

    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: Vec<u32> = reader.read_array(Some(3)).unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_array_with_prefix() {
    let values = vec![7u64, 8];
    let (buffer, written) = encode(&values, 64);
    assert_eq!(written, 4 + 16);
    assert_eq!(&buffer.as_bytes()[..4], &[2, 0, 0, 0]);

    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: Vec<u64> = reader.read_array(None).unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_known_count_zero_reads_nothing() {
    let buffer = Buffer::new();
    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: Vec<u32> = reader.read_array(Some(0)).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(reader.position().unwrap(), 0);
}

#[test]
fn test_hash_map_round_trip() {
    let mut map: hashbrown::HashMap<String, u32> = hashbrown::HashMap::new();
    map.insert("albedo".to_string(), 0);
    map.insert("normal".to_string(), 1);
    map.insert("roughness".to_string(), 2);

    let (buffer, _) = encode(&map, 256);
    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: hashbrown::HashMap<String, u32> = reader.read_object().unwrap();
    assert_eq!(decoded, map);
}

#[test]
fn test_map_into_ordered_collection() {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 64);
    let pairs: BTreeMap<u32, u8> = [(5, 50), (1, 10)].into_iter().collect();
    writer.write_map(pairs.iter(), false).unwrap();
    drop(writer);

    let mut reader = MemoryStreamReader::new(&buffer);
    let decoded: Vec<(u32, u8)> = reader.read_map(Some(2)).unwrap();
    assert_eq!(decoded, vec![(1, 10), (5, 50)]);
}

#[test]
fn test_buffer_round_trip() {
    let source = Buffer::copy(&[1, 2, 3, 4, 5]);

    let mut storage = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut storage, 32);
    writer.write_buffer(&source, true).unwrap();
    writer.write_buffer(&source, false).unwrap();
    drop(writer);

    let mut reader = MemoryStreamReader::new(&storage);
    assert_eq!(reader.read_buffer(None).unwrap(), source);
    assert_eq!(reader.read_buffer(Some(5)).unwrap(), source);
}

#[test]
fn test_write_zero() {
    let mut buffer = Buffer::copy(&[0xAA; 10_000]);
    let mut writer = MemoryStreamWriter::new(&mut buffer, 0);
    writer.write_zero(9_000).unwrap();
    assert_eq!(writer.position().unwrap(), 9_000);
    drop(writer);

    assert!(buffer.as_bytes()[..9_000].iter().all(|&b| b == 0));
    assert!(buffer.as_bytes()[9_000..].iter().all(|&b| b == 0xAA));
}

#[test]
fn test_truncated_object_fails() {
    let binding = Binding {
        slot: 1,
        name: "material".to_string(),
        sizes: vec![1, 2, 3, 4],
    };
    let (buffer, written) = encode(&binding, 128);

    let truncated = Buffer::copy(&buffer.as_bytes()[..written as usize - 3]);
    let mut reader = MemoryStreamReader::new(&truncated);
    let result: StreamResult<Binding> = reader.read_object();
    assert!(matches!(result, Err(StreamError::ShortRead { .. })));
}

#[test]
fn test_writer_overrun_reports_short_write() {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 6);
    let err = writer.write_string("too long").unwrap_err();
    assert!(matches!(err, StreamError::ShortWrite { .. }));
}
