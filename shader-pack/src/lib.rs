//! Shader pack container for the Forge engine
//!
//! A shader pack persists a named collection of compiled shader programs
//! (bytecode plus reflection metadata) in one seekable `.fgsp` file and resolves
//! single programs by name without reading the rest of the file.
//!
//! # Modules
//!
//! - [`format`] - On-disk header, program index and module index records
//! - [`reflection`] - Reflection metadata stored with every program
//! - [`library`] - Single-owner registry of compiled shaders (write input)
//! - [`builder`] - Plan / reserve / stream / backpatch pack writer
//! - [`pack`] - Open, query and load programs from a pack
//! - [`config`] - Reader options (TOML)
//! - [`error`] - [`PackError`]

pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod library;
pub mod pack;
pub mod reflection;

pub use builder::{BuildPhase, PackBuilder};
pub use config::{PackOptions, VersionPolicy};
pub use error::{IndexRegion, PackError};
pub use format::{
    FileHeader, ModuleInfo, PackIndex, ProgramInfo, SHADER_PACK_EXT, SHADER_PACK_MAGIC,
    SHADER_PACK_VERSION, ShaderStage,
};
pub use library::{CompiledShader, ShaderLibrary, ShaderModule};
pub use pack::{PackState, PackedModule, PackedProgram, ShaderFactory, ShaderPack};
pub use reflection::{
    ImageSampler, PushConstantRange, ReflectionData, ShaderBuffer, ShaderDescriptorSet,
    ShaderResourceDeclaration, ShaderUniform, ShaderUniformType, StageFlags, StorageBuffer,
    UniformBuffer,
};
