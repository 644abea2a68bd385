//! Shader pack orchestrator.
//!
//! [`ShaderPack`] is the entry point for both directions:
//!
//! - **Read**: [`ShaderPack::open`] reads the header and index eagerly. Programs
//!   are then resolved one at a time by name with [`ShaderPack::load_program`],
//!   which seeks straight to the program's reflection and bytecode.
//! - **Write**: [`ShaderPack::create_from_library`] streams a whole
//!   [`ShaderLibrary`] into a new file with a [`PackBuilder`].
//!
//! A pack that failed to open stays [`PackState::Unloaded`]; every load on it
//! fails fast with [`PackError::NotLoaded`]. A written pack must be reopened
//! with [`ShaderPack::reopen`] before programs can be loaded from it.


use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use forge_shared::{
    BoundedStreamReader, FileStreamReader, FileStreamWriter, Serializable, StreamError,
    StreamReader, StreamReaderExt, name_hash,
};
use tracing::{debug, info, warn};

use crate::builder::PackBuilder;
use crate::config::PackOptions;
use crate::error::PackError;
use crate::format::{
    FileHeader, ModuleInfo, PackIndex, ProgramInfo, SHADER_PACK_MAGIC, SHADER_PACK_VERSION,
    ShaderStage,
};
use crate::library::ShaderLibrary;

/// Lifecycle state of a [`ShaderPack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackState {
    /// Open or validation failed; terminal for this instance
    Unloaded,
    /// Header and index read; programs can be loaded
    Loaded,
    /// A write is in progress
    Building,
    /// The pack file was written; reopen to read from it
    Written,
}

/// Bytecode of one module as stored in the pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedModule {
    pub stage: ShaderStage,
    pub flags: u32,
    pub bytecode: Vec<u8>,
}

/// One program resolved from a pack.
#[derive(Debug, Clone)]
pub struct PackedProgram<R> {
    /// Name the program was requested by
    pub name: String,
    /// Name hash used as the index key
    pub key: u32,
    /// Deserialized reflection metadata
    pub reflection: R,
    /// The same reflection blob as stored on disk
    pub reflection_bytes: Vec<u8>,
    /// Modules in the order they were written
    pub modules: Vec<PackedModule>,
}

impl<R> PackedProgram<R> {
    /// First module for `stage`, if the program has one
    pub fn module(&self, stage: ShaderStage) -> Option<&PackedModule> {
        self.modules.iter().find(|m| m.stage == stage)
    }

    /// Program name without directories or extension.
    pub fn display_name(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.name)
    }
}

/// Turns a loaded program into a runtime shader object.
pub trait ShaderFactory {
    type Reflection: Serializable;
    type Shader;
    type Error: From<PackError>;

    fn create_shader(
        &mut self,
        program: PackedProgram<Self::Reflection>,
    ) -> Result<Self::Shader, Self::Error>;
}

/// A shader pack file and its in-memory index.
#[derive(Debug)]
pub struct ShaderPack {
    path: PathBuf,
    state: PackState,
    options: PackOptions,
    header: Option<FileHeader>,
    index: PackIndex,
    reader: Option<FileStreamReader>,
    load_error: Option<PackError>,
}

impl ShaderPack {
    fn empty(path: PathBuf, options: PackOptions, state: PackState) -> Self {
        Self {
            path,
            state,
            options,
            header: None,
            index: PackIndex::default(),
            reader: None,
            load_error: None,
        }
    }

    /// Open a pack with default options.
    ///
    /// Never fails: on error the pack is [`PackState::Unloaded`] and the cause is
    /// available from [`ShaderPack::load_error`].
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with_options(path, PackOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: PackOptions) -> Self {
        let path = path.as_ref();
        match Self::try_open_with_options(path, options.clone()) {
            Ok(pack) => pack,
            Err(e) => {
                warn!(error = %e, "Failed to load shader pack {}", path.display());
                let mut pack = Self::empty(path.to_path_buf(), options, PackState::Unloaded);
                pack.load_error = Some(e);
                pack
            }
        }
    }

    /// Open a pack with default options, returning the failure instead of an
    /// unloaded pack.
    pub fn try_open(path: impl AsRef<Path>) -> Result<Self, PackError> {
        Self::try_open_with_options(path, PackOptions::default())
    }

    pub fn try_open_with_options(
        path: impl AsRef<Path>,
        options: PackOptions,
    ) -> Result<Self, PackError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = open_reader(&path)?;

        let header: FileHeader = reader.read_raw()?;
        if !header.has_valid_magic() {
            return Err(PackError::FormatMismatch {
                expected: SHADER_PACK_MAGIC,
                found: header.magic,
            });
        }
        if !options.version_policy.accepts(header.version) {
            return Err(PackError::UnsupportedVersion {
                found: header.version,
                supported: SHADER_PACK_VERSION,
            });
        }

        let index = PackIndex::read(&mut reader, &header)?;

        info!(
            "Loaded shader pack {}: {} programs, {} modules",
            path.display(),
            header.program_count,
            header.module_count
        );

        let mut pack = Self::empty(path, options, PackState::Loaded);
        pack.header = Some(header);
        pack.index = index;
        if pack.options.reuse_reader {
            pack.reader = Some(reader);
        }
        Ok(pack)
    }

    /// Write every shader in `library` to a new pack file at `path`.
    ///
    /// The pack is written to `<path>.tmp` and renamed over `path` only once
    /// complete. On failure the staging file is removed and any existing file
    /// at `path` is left untouched.
    ///
    /// The returned pack is [`PackState::Written`]: its index answers queries
    /// such as [`ShaderPack::contains`], but programs can only be loaded after
    /// [`ShaderPack::reopen`].
    pub fn create_from_library<R: Serializable>(
        library: &ShaderLibrary<R>,
        path: impl AsRef<Path>,
    ) -> Result<Self, PackError> {
        let path = path.as_ref().to_path_buf();
        let mut pack = Self::empty(path, PackOptions::default(), PackState::Building);

        let mut builder = PackBuilder::plan(library)?;

        let staging = staging_path(&pack.path)?;
        if let Err(e) = write_staged(&mut builder, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        if let Err(e) = commit_staged(&staging, &pack.path) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        let (header, index) = builder.finish()?;

        info!(
            "Wrote shader pack {}: {} programs, {} modules",
            pack.path.display(),
            header.program_count,
            header.module_count
        );

        pack.header = Some(header);
        pack.index = index;
        pack.state = PackState::Written;
        Ok(pack)
    }

    /// Reopen this pack's file for reading with the same options.
    pub fn reopen(self) -> Self {
        Self::open_with_options(self.path, self.options)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PackState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == PackState::Loaded
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Why the last open failed, if it did
    pub fn load_error(&self) -> Option<&PackError> {
        self.load_error.as_ref()
    }

    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    pub fn program_count(&self) -> u32 {
        self.header.map_or(0, |h| h.program_count)
    }

    pub fn module_count(&self) -> u32 {
        self.header.map_or(0, |h| h.module_count)
    }

    /// Check whether a program with this name is in the index.
    pub fn contains(&self, name: &str) -> bool {
        self.index.programs.contains_key(&name_hash(name))
    }

    pub fn program_info(&self, name: &str) -> Option<&ProgramInfo> {
        self.index.program(name_hash(name))
    }

    pub fn module_info(&self, index: u32) -> Option<&ModuleInfo> {
        self.index.module(index)
    }

    /// Read one program's reflection and bytecode.
    pub fn load_program<R: Serializable>(
        &mut self,
        name: &str,
    ) -> Result<PackedProgram<R>, PackError> {
        if self.state != PackState::Loaded {
            return Err(PackError::NotLoaded);
        }

        let key = name_hash(name);
        let info = self.index.program(key).ok_or_else(|| PackError::NotFound {
            name: name.to_string(),
        })?;

        let mut reader = match self.reader.take() {
            Some(reader) => reader,
            None => open_reader(&self.path)?,
        };

        let result = read_program(&mut reader, &self.index, &self.options, key, info);

        // A reader that hit a short read or seek error is not reused
        if self.options.reuse_reader && reader.is_good() {
            self.reader = Some(reader);
        }

        let (reflection, reflection_bytes, modules) = result?;

        debug!(
            "Loaded shader program '{}': {} modules, {} reflection bytes",
            name,
            modules.len(),
            reflection_bytes.len()
        );

        Ok(PackedProgram {
            name: name.to_string(),
            key,
            reflection,
            reflection_bytes,
            modules,
        })
    }

    /// Load a program and hand it to `factory`.
    pub fn load_shader<F: ShaderFactory>(
        &mut self,
        name: &str,
        factory: &mut F,
    ) -> Result<F::Shader, F::Error> {
        let program = self.load_program::<F::Reflection>(name)?;
        factory.create_shader(program)
    }
}

fn open_reader(path: &Path) -> Result<FileStreamReader, PackError> {
    FileStreamReader::open(path).map_err(|source| PackError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Sibling path a pack is written to before it replaces `path`.
fn staging_path(path: &Path) -> Result<PathBuf, PackError> {
    match path.file_name() {
        Some(name) => {
            let mut staging_name = OsString::from(name);
            staging_name.push(".tmp");
            Ok(path.with_file_name(staging_name))
        }
        None => Err(PackError::Open {
            path: path.to_path_buf(),
            source: StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "shader pack path has no file name",
            )),
        }),
    }
}

fn write_staged<R: Serializable>(
    builder: &mut PackBuilder<'_, R>,
    staging: &Path,
) -> Result<(), PackError> {
    let mut writer = FileStreamWriter::create(staging).map_err(|source| PackError::Open {
        path: staging.to_path_buf(),
        source,
    })?;
    builder.write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn commit_staged(staging: &Path, path: &Path) -> Result<(), PackError> {
    let commit_error = |source: io::Error| PackError::Commit {
        path: path.to_path_buf(),
        source,
    };

    // Windows rename does not replace an existing file
    #[cfg(windows)]
    if path.exists() {
        fs::remove_file(path).map_err(commit_error)?;
    }

    fs::rename(staging, path).map_err(commit_error)
}

type ProgramParts<R> = (R, Vec<u8>, Vec<PackedModule>);

fn read_program<R: Serializable>(
    reader: &mut FileStreamReader,
    index: &PackIndex,
    options: &PackOptions,
    key: u32,
    info: &ProgramInfo,
) -> Result<ProgramParts<R>, PackError> {
    reader.set_position(info.reflection_offset)?;
    let (reflection, reflection_size) = read_reflection::<R>(reader, options.max_module_size)?;

    let mut modules = Vec::with_capacity(info.module_indices.len());
    for &module_index in &info.module_indices {
        let module = index
            .module(module_index)
            .ok_or(PackError::InvalidModuleIndex {
                key,
                index: module_index,
                module_count: index.modules.len() as u32,
            })?;
        let stage = module.stage()?;
        options.check_blob_size("module", module.packed_size)?;

        reader.set_position(module.packed_offset)?;
        let bytecode = reader.read_bytes(module.packed_size as usize)?;
        modules.push(PackedModule {
            stage,
            flags: module.flags,
            bytecode,
        });
    }

    // Second pass over the reflection blob for consumers that parse it themselves
    reader.set_position(info.reflection_offset)?;
    let reflection_bytes = reader.read_bytes(reflection_size as usize)?;

    Ok((reflection, reflection_bytes, modules))
}

/// Deserialize a reflection blob without letting it read, or allocate for,
/// more than `limit` bytes.
fn read_reflection<R: Serializable>(
    reader: &mut FileStreamReader,
    limit: u64,
) -> Result<(R, u64), PackError> {
    let mut bounded = BoundedStreamReader::new(reader, limit)?;
    let reflection = bounded.read_object().map_err(|e| match e {
        StreamError::LimitExceeded { requested, limit } => PackError::OversizedBlob {
            what: "reflection",
            size: requested,
            limit,
        },
        e => PackError::Stream(e),
    })?;
    let size = bounded.consumed()?;
    Ok((reflection, size))
}
