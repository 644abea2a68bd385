//! Three-phase pack writer.
//!
//! 1. **Plan**: hash every program name and size both index regions from the
//!    module counts already known in the library.
//! 2. **Reserve + stream**: write the header and two zero-filled placeholders of
//!    exactly the planned sizes, then stream each program's reflection blob and
//!    module bytecode while recording their offsets in an in-memory index mirror.
//! 3. **Backpatch**: size the mirror against each reservation, then seek back to
//!    the placeholders and overwrite them with it. A mirror that would not fit
//!    its placeholder is rejected before anything is written.
//!
//! Offsets are absolute positions in the writer's stream.

use forge_shared::{Serializable, StreamError, StreamWriter, StreamWriterExt, name_hash};
use hashbrown::HashMap;
use tracing::debug;

use crate::error::{IndexRegion, PackError};
use crate::format::{
    FileHeader, MODULE_VERSION, ModuleInfo, PackIndex, ProgramInfo, module_index_size,
    program_index_size,
};
use crate::library::{CompiledShader, ShaderLibrary};

/// Progress of a [`PackBuilder`]. Each step only runs from the phase before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Planned,
    Reserved,
    Streamed,
    Backpatched,
}

struct PlannedProgram<'a, R> {
    name: &'a str,
    key: u32,
    shader: &'a CompiledShader<R>,
}

/// Writes one pack from a borrowed [`ShaderLibrary`].
pub struct PackBuilder<'a, R> {
    programs: Vec<PlannedProgram<'a, R>>,
    header: FileHeader,
    program_index_size: u64,
    module_index_size: u64,
    program_index_offset: u64,
    module_index_offset: u64,
    entries: Vec<(u32, ProgramInfo)>,
    modules: Vec<ModuleInfo>,
    phase: BuildPhase,
}

fn count_u32(len: usize) -> Result<u32, PackError> {
    u32::try_from(len).map_err(|_| PackError::Stream(StreamError::LengthOverflow(len)))
}

/// Compare an index region's length against its reservation.
fn check_region(region: IndexRegion, reserved: u64, written: u64) -> Result<(), PackError> {
    if reserved != written {
        return Err(PackError::IndexSizeMismatch {
            region,
            reserved,
            written,
        });
    }
    Ok(())
}

impl<'a, R: Serializable> PackBuilder<'a, R> {
    /// Phase 1: hash names and size the index regions.
    pub fn plan(library: &'a ShaderLibrary<R>) -> Result<Self, PackError> {
        let mut seen: HashMap<u32, &str> = HashMap::with_capacity(library.len());
        let mut programs = Vec::with_capacity(library.len());

        for (name, shader) in library.iter() {
            let key = name_hash(name);
            if let Some(existing) = seen.insert(key, name) {
                return Err(PackError::HashCollision {
                    key,
                    name: name.to_string(),
                    existing: existing.to_string(),
                });
            }
            programs.push(PlannedProgram { name, key, shader });
        }

        let program_count = count_u32(programs.len())?;
        let module_count = count_u32(library.module_count())?;

        let program_index_size =
            program_index_size(programs.iter().map(|p| p.shader.modules.len()));
        let module_index_size = module_index_size(module_count);

        debug!(
            "Planned shader pack: {} programs, {} modules, index {} + {} bytes",
            program_count, module_count, program_index_size, module_index_size
        );

        Ok(Self {
            programs,
            header: FileHeader::new(program_count, module_count),
            program_index_size,
            module_index_size,
            program_index_offset: 0,
            module_index_offset: 0,
            entries: Vec::with_capacity(program_count as usize),
            modules: Vec::with_capacity(module_count as usize),
            phase: BuildPhase::Planned,
        })
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Planned byte size of the program index region
    pub fn program_index_size(&self) -> u64 {
        self.program_index_size
    }

    /// Planned byte size of the module index region
    pub fn module_index_size(&self) -> u64 {
        self.module_index_size
    }

    /// Offset where the data region starts. Valid once reserved.
    pub fn data_offset(&self) -> u64 {
        self.module_index_offset + self.module_index_size
    }

    fn expect_phase(&self, expected: BuildPhase) -> Result<(), PackError> {
        if self.phase != expected {
            return Err(PackError::BuildPhase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    /// Write the header and zero-filled placeholders for both index regions.
    pub fn reserve<W: StreamWriter + ?Sized>(&mut self, writer: &mut W) -> Result<(), PackError> {
        self.expect_phase(BuildPhase::Planned)?;

        writer.write_raw(&self.header)?;

        self.program_index_offset = writer.position()?;
        writer.write_zero(self.program_index_size)?;

        self.module_index_offset = writer.position()?;
        writer.write_zero(self.module_index_size)?;

        self.phase = BuildPhase::Reserved;
        Ok(())
    }

    /// Phase 2: stream every program's reflection and bytecode, recording offsets.
    pub fn stream_data<W: StreamWriter + ?Sized>(
        &mut self,
        writer: &mut W,
    ) -> Result<(), PackError> {
        self.expect_phase(BuildPhase::Reserved)?;

        for program in &self.programs {
            let reflection_offset = writer.position()?;
            writer.write_object(&program.shader.reflection)?;

            let mut module_indices = Vec::with_capacity(program.shader.modules.len());
            for module in &program.shader.modules {
                let packed_offset = writer.position()?;
                writer.write_bytes(&module.bytecode)?;

                module_indices.push(count_u32(self.modules.len())?);
                self.modules.push(ModuleInfo {
                    packed_offset,
                    packed_size: module.bytecode.len() as u64,
                    version: MODULE_VERSION,
                    stage: module.stage.tag(),
                    flags: module.flags,
                });
            }

            debug!(
                "Packed program '{}' ({:#010x}): {} modules at {}",
                program.name,
                program.key,
                module_indices.len(),
                reflection_offset
            );

            self.entries.push((
                program.key,
                ProgramInfo {
                    reflection_offset,
                    module_indices,
                },
            ));
        }

        self.phase = BuildPhase::Streamed;
        Ok(())
    }

    /// Phase 3: overwrite the placeholders with the recorded index.
    ///
    /// Leaves the writer positioned at the end of the data region. On a size
    /// mismatch nothing is overwritten.
    pub fn backpatch<W: StreamWriter + ?Sized>(&mut self, writer: &mut W) -> Result<(), PackError> {
        self.expect_phase(BuildPhase::Streamed)?;

        let program_bytes =
            program_index_size(self.entries.iter().map(|(_, info)| info.module_indices.len()));
        check_region(IndexRegion::Programs, self.program_index_size, program_bytes)?;
        let module_bytes = module_index_size(count_u32(self.modules.len())?);
        check_region(IndexRegion::Modules, self.module_index_size, module_bytes)?;

        let end = writer.position()?;

        writer.set_position(self.program_index_offset)?;
        writer.write_map(self.entries.iter().map(|(key, info)| (key, info)), false)?;
        let written = writer.position()? - self.program_index_offset;
        check_region(IndexRegion::Programs, self.program_index_size, written)?;

        writer.set_position(self.module_index_offset)?;
        writer.write_array(&self.modules, false)?;
        let written = writer.position()? - self.module_index_offset;
        check_region(IndexRegion::Modules, self.module_index_size, written)?;

        writer.set_position(end)?;

        self.phase = BuildPhase::Backpatched;
        Ok(())
    }

    /// Run every phase against `writer`.
    pub fn write<W: StreamWriter + ?Sized>(&mut self, writer: &mut W) -> Result<(), PackError> {
        self.reserve(writer)?;
        self.stream_data(writer)?;
        self.backpatch(writer)
    }

    /// Consume a backpatched builder, returning the index it wrote.
    pub fn finish(self) -> Result<(FileHeader, PackIndex), PackError> {
        self.expect_phase(BuildPhase::Backpatched)?;

        let index = PackIndex {
            programs: self.entries.into_iter().collect(),
            modules: self.modules,
        };
        Ok((self.header, index))
    }
}
