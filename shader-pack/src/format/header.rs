use forge_shared::codec::RawValue;
use forge_shared::{
    Serializable, StreamReader, StreamReaderExt, StreamResult, StreamWriter, StreamWriterExt,
};

use super::{SHADER_PACK_MAGIC, SHADER_PACK_VERSION};

/// Shader pack file header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub program_count: u32,
    pub module_count: u32,
}

impl FileHeader {
    pub const SIZE: usize = 16;

    /// Header for a pack in the current format version.
    pub fn new(program_count: u32, module_count: u32) -> Self {
        Self {
            magic: SHADER_PACK_MAGIC,
            version: SHADER_PACK_VERSION,
            program_count,
            module_count,
        }
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == SHADER_PACK_MAGIC
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.program_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.module_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: &[u8; Self::SIZE] = bytes.get(..Self::SIZE)?.try_into().ok()?;
        Some(Self::decode(raw))
    }

    fn decode(raw: &[u8; Self::SIZE]) -> Self {
        Self {
            magic: [raw[0], raw[1], raw[2], raw[3]],
            version: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            program_count: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            module_count: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
        }
    }
}

impl RawValue for FileHeader {
    const SIZE: usize = Self::SIZE;

    fn write_le(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; Self::SIZE];
        raw.copy_from_slice(bytes);
        Self::decode(&raw)
    }
}

impl Serializable for FileHeader {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(self)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_raw()
    }
}
