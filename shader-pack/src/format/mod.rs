//! Shader pack on-disk schema (`.fgsp`)
//!
//! A pack stores many compiled shader programs in one seekable file. Only the
//! header and the two index regions are read eagerly; reflection and bytecode
//! blobs are fetched by offset on demand.
//!
//! # Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ FileHeader (16 bytes)                                        │
//! │ ├── magic: "FGSP"                                            │
//! │ ├── version: u32                                             │
//! │ ├── program_count: u32                                       │
//! │ └── module_count: u32                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Program index (program_count entries)                        │
//! │ ├── name_hash: u32                                           │
//! │ ├── reflection_offset: u64                                   │
//! │ └── module_indices: u32 count + u32 × count                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Module index (module_count × 24-byte ModuleInfo)             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Data region, per program in write order:                     │
//! │ ├── reflection blob                                          │
//! │ └── bytecode blob × modules                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no trailing index or checksum. The writer reserves both index
//! regions up front and backpatches them once the data offsets are known (see
//! [`crate::builder`]).

mod header;
mod index;
mod stage;

#[cfg(test)]
mod tests;

pub use header::FileHeader;
pub use index::{ModuleInfo, PackIndex, ProgramInfo, module_index_size, program_index_size};
pub use stage::ShaderStage;

/// File extension for shader packs (without dot)
pub const SHADER_PACK_EXT: &str = "fgsp";

/// Magic bytes at the start of every shader pack
pub const SHADER_PACK_MAGIC: [u8; 4] = *b"FGSP";

/// Current pack format version
pub const SHADER_PACK_VERSION: u32 = 1;

/// Version tag written into every [`ModuleInfo`]
pub const MODULE_VERSION: u8 = 1;
