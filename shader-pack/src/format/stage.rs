use std::fmt;

use crate::error::PackError;

/// Pipeline stage a compiled module runs in.
///
/// The discriminant is the on-disk stage tag. Tag 0 is reserved and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ShaderStage {
    Vertex = 1,
    Fragment = 2,
    Compute = 3,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [Self::Vertex, Self::Fragment, Self::Compute];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }
}

impl TryFrom<u8> for ShaderStage {
    type Error = PackError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::Vertex),
            2 => Ok(Self::Fragment),
            3 => Ok(Self::Compute),
            other => Err(PackError::InvalidStage(other)),
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
