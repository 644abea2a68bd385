use std::path::PathBuf;
use std::{fmt, io};

use forge_shared::StreamError;

use crate::builder::BuildPhase;

/// Which index region a backpatch check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRegion {
    Programs,
    Modules,
}

impl fmt::Display for IndexRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRegion::Programs => f.write_str("program"),
            IndexRegion::Modules => f.write_str("module"),
        }
    }
}

/// Error type for shader pack reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Path missing, unreadable or unwritable
    #[error("failed to open shader pack {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: StreamError,
    },

    /// A fully written staging file could not replace the destination
    #[error("failed to move shader pack into place at {}: {source}", .path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Header magic does not identify a shader pack
    #[error("not a shader pack: expected magic {expected:?}, found {found:?}")]
    FormatMismatch { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported shader pack version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The pack never loaded successfully, or was opened for writing
    #[error("shader pack is not loaded")]
    NotLoaded,

    #[error("shader program '{name}' not found in pack")]
    NotFound { name: String },

    /// Stream failure, including short reads and writes
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Backpatched index content does not fill its reserved placeholder exactly
    #[error("{region} index size mismatch: reserved {reserved} bytes, wrote {written}")]
    IndexSizeMismatch {
        region: IndexRegion,
        reserved: u64,
        written: u64,
    },

    #[error(
        "program {key:#010x} references module {index}, but the pack has {module_count} modules"
    )]
    InvalidModuleIndex {
        key: u32,
        index: u32,
        module_count: u32,
    },

    #[error("invalid shader stage tag {0}")]
    InvalidStage(u8),

    #[error("name hash collision: '{name}' and '{existing}' both hash to {key:#010x}")]
    HashCollision {
        key: u32,
        name: String,
        existing: String,
    },

    #[error("duplicate program key {key:#010x} in pack index")]
    DuplicateKey { key: u32 },

    #[error("shader '{0}' is already in the library")]
    DuplicateShader(String),

    /// An advertised blob size exceeds the configured limit
    #[error("{what} of {size} bytes exceeds the {limit} byte limit")]
    OversizedBlob {
        what: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("pack builder is in phase {found:?}, expected {expected:?}")]
    BuildPhase {
        expected: BuildPhase,
        found: BuildPhase,
    },

    #[error("invalid pack options: {0}")]
    Config(#[from] toml::de::Error),
}

impl PackError {
    /// True when fewer bytes were transferred than requested, typically a
    /// truncated pack file.
    pub fn is_short_transfer(&self) -> bool {
        matches!(
            self,
            PackError::Stream(StreamError::ShortRead { .. } | StreamError::ShortWrite { .. })
        )
    }
}
