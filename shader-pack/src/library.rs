//! Single-owner registry of compiled shaders.
//!
//! The library owns every [`CompiledShader`] under its name. The pack builder
//! and other consumers only borrow from it.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::PackError;
use crate::format::ShaderStage;
use crate::reflection::ReflectionData;

/// One compiled module: stage tag, bytecode bytes and opaque flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderModule {
    pub stage: ShaderStage,
    pub bytecode: Vec<u8>,
    pub flags: u32,
}

impl ShaderModule {
    pub fn new(stage: ShaderStage, bytecode: Vec<u8>) -> Self {
        Self {
            stage,
            bytecode,
            flags: 0,
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Bytecode length in bytes
    pub fn len(&self) -> usize {
        self.bytecode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytecode.is_empty()
    }

    /// View the bytecode as 32-bit words.
    ///
    /// Returns `None` when the length is not a multiple of four or the bytes are
    /// not word-aligned.
    pub fn words(&self) -> Option<&[u32]> {
        bytemuck::try_cast_slice(&self.bytecode).ok()
    }
}

/// A compiled program: its modules in stage order plus reflection metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledShader<R = ReflectionData> {
    pub modules: Vec<ShaderModule>,
    pub reflection: R,
}

impl<R> CompiledShader<R> {
    pub fn new(reflection: R) -> Self {
        Self {
            modules: Vec::new(),
            reflection,
        }
    }

    pub fn with_module(mut self, module: ShaderModule) -> Self {
        self.modules.push(module);
        self
    }

    /// First module compiled for `stage`, if any
    pub fn module(&self, stage: ShaderStage) -> Option<&ShaderModule> {
        self.modules.iter().find(|m| m.stage == stage)
    }
}

/// Name-ordered collection of compiled shaders.
#[derive(Debug, Clone)]
pub struct ShaderLibrary<R = ReflectionData> {
    shaders: BTreeMap<String, CompiledShader<R>>,
}

impl<R> Default for ShaderLibrary<R> {
    fn default() -> Self {
        Self {
            shaders: BTreeMap::new(),
        }
    }
}

impl<R> ShaderLibrary<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shader. Fails if the name is already taken.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        shader: CompiledShader<R>,
    ) -> Result<(), PackError> {
        match self.shaders.entry(name.into()) {
            btree_map::Entry::Occupied(entry) => {
                Err(PackError::DuplicateShader(entry.key().clone()))
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(shader);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CompiledShader<R>> {
        self.shaders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<CompiledShader<R>> {
        self.shaders.remove(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Iterate shaders in name order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &CompiledShader<R>)> {
        self.shaders.iter().map(|(name, shader)| (name.as_str(), shader))
    }

    /// Total module count across every shader
    pub fn module_count(&self) -> usize {
        self.shaders.values().map(|s| s.modules.len()).sum()
    }
}

impl<'a, R> IntoIterator for &'a ShaderLibrary<R> {
    type Item = (&'a String, &'a CompiledShader<R>);
    type IntoIter = btree_map::Iter<'a, String, CompiledShader<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.shaders.iter()
    }
}
