//! Program and module index records.

use forge_shared::codec::RawValue;
use forge_shared::{
    Serializable, StreamReader, StreamReaderExt, StreamResult, StreamWriter, StreamWriterExt,
};
use hashbrown::HashMap;

use super::{FileHeader, ShaderStage};
use crate::error::PackError;

/// Fixed part of a program index entry: name hash (u32) + reflection offset (u64)
const PROGRAM_ENTRY_FIXED_SIZE: u64 = 4 + 8;

/// Width of the module-index count prefix and of each module index
const INDEX_WORD_SIZE: u64 = 4;

/// Exact byte size of the program index region for programs with the given
/// module counts.
pub fn program_index_size<I: IntoIterator<Item = usize>>(module_counts: I) -> u64 {
    module_counts
        .into_iter()
        .map(|count| PROGRAM_ENTRY_FIXED_SIZE + INDEX_WORD_SIZE + INDEX_WORD_SIZE * count as u64)
        .sum()
}

/// Exact byte size of the module index region.
pub fn module_index_size(module_count: u32) -> u64 {
    module_count as u64 * ModuleInfo::SIZE as u64
}

/// Index entry for one program. Keyed by name hash in [`PackIndex::programs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInfo {
    /// Absolute offset of the program's reflection blob
    pub reflection_offset: u64,
    /// Indices into the pack-wide module list, in stage order as written
    pub module_indices: Vec<u32>,
}

impl ProgramInfo {
    /// Encoded size of this entry including its name hash key.
    pub fn entry_size(&self) -> u64 {
        program_index_size([self.module_indices.len()])
    }
}

impl Serializable for ProgramInfo {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.reflection_offset)?;
        writer.write_array(&self.module_indices, true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            reflection_offset: reader.read_raw()?,
            module_indices: reader.read_array(None)?,
        })
    }
}

/// Location and tags of one compiled module (24 bytes)
///
/// # Layout
/// ```text
/// 0x00: packed_offset u64
/// 0x08: packed_size u64 (bytes)
/// 0x10: version u8
/// 0x11: stage u8
/// 0x12: reserved (2 bytes, zero)
/// 0x14: flags u32
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    pub packed_offset: u64,
    pub packed_size: u64,
    pub version: u8,
    pub stage: u8,
    pub flags: u32,
}

impl ModuleInfo {
    pub const SIZE: usize = 24;

    /// Decode the stage tag.
    pub fn stage(&self) -> Result<ShaderStage, PackError> {
        ShaderStage::try_from(self.stage)
    }

    /// Offset one past the last bytecode byte.
    pub fn end_offset(&self) -> u64 {
        self.packed_offset.saturating_add(self.packed_size)
    }
}

impl RawValue for ModuleInfo {
    const SIZE: usize = Self::SIZE;

    fn write_le(&self, out: &mut [u8]) {
        out[0..8].copy_from_slice(&self.packed_offset.to_le_bytes());
        out[8..16].copy_from_slice(&self.packed_size.to_le_bytes());
        out[16] = self.version;
        out[17] = self.stage;
        out[18..20].fill(0);
        out[20..24].copy_from_slice(&self.flags.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            packed_offset: u64::read_le(&bytes[0..8]),
            packed_size: u64::read_le(&bytes[8..16]),
            version: bytes[16],
            stage: bytes[17],
            flags: u32::read_le(&bytes[20..24]),
        }
    }
}

impl Serializable for ModuleInfo {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(self)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_raw()
    }
}

/// In-memory program and module index of one pack.
#[derive(Debug, Clone, Default)]
pub struct PackIndex {
    pub programs: HashMap<u32, ProgramInfo>,
    pub modules: Vec<ModuleInfo>,
}

impl PackIndex {
    /// Read both index regions. The reader must be positioned just after the
    /// header.
    pub fn read<R: StreamReader + ?Sized>(
        reader: &mut R,
        header: &FileHeader,
    ) -> Result<Self, PackError> {
        let entries: Vec<(u32, ProgramInfo)> = reader.read_map(Some(header.program_count))?;

        let mut programs = HashMap::with_capacity(entries.len());
        for (key, info) in entries {
            if programs.insert(key, info).is_some() {
                return Err(PackError::DuplicateKey { key });
            }
        }

        let modules = reader.read_array(Some(header.module_count))?;

        let index = Self { programs, modules };
        index.validate()?;
        Ok(index)
    }

    /// Check every program's module indices against the module list.
    pub fn validate(&self) -> Result<(), PackError> {
        let module_count = self.modules.len() as u32;
        for (&key, info) in &self.programs {
            if let Some(&index) = info.module_indices.iter().find(|&&i| i >= module_count) {
                return Err(PackError::InvalidModuleIndex {
                    key,
                    index,
                    module_count,
                });
            }
        }
        Ok(())
    }

    pub fn program(&self, key: u32) -> Option<&ProgramInfo> {
        self.programs.get(&key)
    }

    pub fn module(&self, index: u32) -> Option<&ModuleInfo> {
        self.modules.get(index as usize)
    }
}
