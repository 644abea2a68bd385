//! Shader pack reader options.
//!
//! Options can be built in code or loaded from a TOML table such as:
//!
//! ```toml
//! version_policy = "accept_older"
//! reuse_reader = true
//! max_module_size = 16777216
//! ```
//!
//! Missing keys fall back to their defaults.

use std::path::Path;

use forge_shared::StreamError;
use serde::{Deserialize, Serialize};

use crate::error::PackError;
use crate::format::SHADER_PACK_VERSION;

/// Which on-disk format versions a reader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Only the current format version
    #[default]
    Exact,
    /// The current version and any earlier one
    AcceptOlder,
}

impl VersionPolicy {
    pub fn accepts(self, version: u32) -> bool {
        match self {
            VersionPolicy::Exact => version == SHADER_PACK_VERSION,
            VersionPolicy::AcceptOlder => (1..=SHADER_PACK_VERSION).contains(&version),
        }
    }
}

/// Options controlling how a pack is opened and read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackOptions {
    /// Accepted format versions (default: exact)
    #[serde(default)]
    pub version_policy: VersionPolicy,
    /// Keep one file reader open between loads (default: true)
    #[serde(default = "default_true")]
    pub reuse_reader: bool,
    /// Largest module or reflection blob a load will read (default: 64 MiB)
    #[serde(default = "default_max_module_size")]
    pub max_module_size: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_module_size() -> u64 {
    64 * 1024 * 1024
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::default(),
            reuse_reader: default_true(),
            max_module_size: default_max_module_size(),
        }
    }
}

impl PackOptions {
    /// Parse options from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, PackError> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let content = std::fs::read_to_string(path).map_err(StreamError::from)?;
        Self::from_toml_str(&content)
    }

    /// Fail if `size` exceeds [`PackOptions::max_module_size`].
    pub(crate) fn check_blob_size(&self, what: &'static str, size: u64) -> Result<(), PackError> {
        if size > self.max_module_size {
            return Err(PackError::OversizedBlob {
                what,
                size,
                limit: self.max_module_size,
            });
        }
        Ok(())
    }
}
