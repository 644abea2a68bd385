//! Shader reflection metadata.
//!
//! Describes the resources a program binds: descriptor sets with their buffers
//! and images, named constant buffers, resource declarations and push-constant
//! ranges. The pack stores one serialized [`ReflectionData`] blob per program in
//! front of its bytecode.
//!
//! Maps are ordered so the serialized blob of a given reflection value is always
//! the same bytes.

use std::collections::BTreeMap;

use forge_shared::codec::RawValue;
use forge_shared::{
    Serializable, StreamError, StreamReader, StreamReaderExt, StreamResult, StreamWriter,
    StreamWriterExt,
};

bitflags::bitflags! {
    /// Pipeline stages a resource is visible to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StageFlags: u32 {
        const VERTEX = 0b0000_0001;
        const FRAGMENT = 0b0000_0010;
        const COMPUTE = 0b0000_0100;
    }
}

impl Serializable for StageFlags {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.bits())
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(StageFlags::from_bits_truncate(reader.read_raw()?))
    }
}

/// Uniform buffer binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformBuffer {
    pub size: u32,
    pub binding: u32,
    pub name: String,
    pub stages: StageFlags,
}

impl Serializable for UniformBuffer {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.size)?;
        writer.write_raw(&self.binding)?;
        writer.write_string(&self.name)?;
        writer.write_object(&self.stages)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            size: reader.read_raw()?,
            binding: reader.read_raw()?,
            name: reader.read_string()?,
            stages: reader.read_object()?,
        })
    }
}

/// Storage buffer binding. Same shape as a uniform buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageBuffer {
    pub size: u32,
    pub binding: u32,
    pub name: String,
    pub stages: StageFlags,
}

impl Serializable for StorageBuffer {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.size)?;
        writer.write_raw(&self.binding)?;
        writer.write_string(&self.name)?;
        writer.write_object(&self.stages)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            size: reader.read_raw()?,
            binding: reader.read_raw()?,
            name: reader.read_string()?,
            stages: reader.read_object()?,
        })
    }
}

/// Image, texture or sampler binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSampler {
    pub binding: u32,
    pub descriptor_set: u32,
    pub array_size: u32,
    pub name: String,
    pub stages: StageFlags,
}

impl Serializable for ImageSampler {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&self.binding)?;
        writer.write_raw(&self.descriptor_set)?;
        writer.write_raw(&self.array_size)?;
        writer.write_string(&self.name)?;
        writer.write_object(&self.stages)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            binding: reader.read_raw()?,
            descriptor_set: reader.read_raw()?,
            array_size: reader.read_raw()?,
            name: reader.read_string()?,
            stages: reader.read_object()?,
        })
    }
}

/// Push-constant range (12 bytes, transferred raw)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: StageFlags,
    pub offset: u32,
    pub size: u32,
}

impl RawValue for PushConstantRange {
    const SIZE: usize = 12;

    fn write_le(&self, out: &mut [u8]) {
        self.stages.bits().write_le(&mut out[0..4]);
        self.offset.write_le(&mut out[4..8]);
        self.size.write_le(&mut out[8..12]);
    }

    fn read_le(bytes: &[u8]) -> Self {
        Self {
            stages: StageFlags::from_bits_truncate(u32::read_le(&bytes[0..4])),
            offset: u32::read_le(&bytes[4..8]),
            size: u32::read_le(&bytes[8..12]),
        }
    }
}

impl Serializable for PushConstantRange {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(self)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        reader.read_raw()
    }
}

/// All bindings of one descriptor set, keyed by binding slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDescriptorSet {
    pub uniform_buffers: BTreeMap<u32, UniformBuffer>,
    pub storage_buffers: BTreeMap<u32, StorageBuffer>,
    pub image_samplers: BTreeMap<u32, ImageSampler>,
    pub storage_images: BTreeMap<u32, ImageSampler>,
    pub separate_textures: BTreeMap<u32, ImageSampler>,
    pub separate_samplers: BTreeMap<u32, ImageSampler>,
}

impl ShaderDescriptorSet {
    /// True when the set declares no buffers or images
    pub fn is_empty(&self) -> bool {
        self.uniform_buffers.is_empty()
            && self.storage_buffers.is_empty()
            && self.image_samplers.is_empty()
            && self.storage_images.is_empty()
            && self.separate_textures.is_empty()
            && self.separate_samplers.is_empty()
    }
}

impl Serializable for ShaderDescriptorSet {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_object(&self.uniform_buffers)?;
        writer.write_object(&self.storage_buffers)?;
        writer.write_object(&self.image_samplers)?;
        writer.write_object(&self.storage_images)?;
        writer.write_object(&self.separate_textures)?;
        writer.write_object(&self.separate_samplers)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            uniform_buffers: reader.read_object()?,
            storage_buffers: reader.read_object()?,
            image_samplers: reader.read_object()?,
            storage_images: reader.read_object()?,
            separate_textures: reader.read_object()?,
            separate_samplers: reader.read_object()?,
        })
    }
}

/// Named resource declaration (register + array count)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderResourceDeclaration {
    pub name: String,
    pub register: u32,
    pub count: u32,
}

impl Serializable for ShaderResourceDeclaration {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_string(&self.name)?;
        writer.write_raw(&self.register)?;
        writer.write_raw(&self.count)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            name: reader.read_string()?,
            register: reader.read_raw()?,
            count: reader.read_raw()?,
        })
    }
}

/// Type of a member inside a constant buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ShaderUniformType {
    #[default]
    None = 0,
    Bool,
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    IVec2,
    IVec3,
    IVec4,
}

impl ShaderUniformType {
    const ALL: [ShaderUniformType; 13] = [
        Self::None,
        Self::Bool,
        Self::Int,
        Self::UInt,
        Self::Float,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Mat3,
        Self::Mat4,
        Self::IVec2,
        Self::IVec3,
        Self::IVec4,
    ];

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}

impl Serializable for ShaderUniformType {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_raw(&(*self as u8))
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        let tag: u8 = reader.read_raw()?;
        Self::from_tag(tag).ok_or(StreamError::InvalidValue {
            what: "uniform type",
            value: tag as u64,
        })
    }
}

/// Member of a constant buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderUniform {
    pub name: String,
    pub ty: ShaderUniformType,
    pub size: u32,
    pub offset: u32,
}

impl Serializable for ShaderUniform {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_string(&self.name)?;
        writer.write_object(&self.ty)?;
        writer.write_raw(&self.size)?;
        writer.write_raw(&self.offset)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            name: reader.read_string()?,
            ty: reader.read_object()?,
            size: reader.read_raw()?,
            offset: reader.read_raw()?,
        })
    }
}

/// Named constant buffer with its members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderBuffer {
    pub name: String,
    pub size: u32,
    pub uniforms: BTreeMap<String, ShaderUniform>,
}

impl Serializable for ShaderBuffer {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_string(&self.name)?;
        writer.write_raw(&self.size)?;
        writer.write_object(&self.uniforms)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            name: reader.read_string()?,
            size: reader.read_raw()?,
            uniforms: reader.read_object()?,
        })
    }
}

/// Complete reflection metadata of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionData {
    pub descriptor_sets: Vec<ShaderDescriptorSet>,
    pub resources: BTreeMap<String, ShaderResourceDeclaration>,
    pub constant_buffers: BTreeMap<String, ShaderBuffer>,
    pub push_constant_ranges: Vec<PushConstantRange>,
}

impl ReflectionData {
    /// Uniform buffer at `binding` in descriptor set `set`, if declared
    pub fn uniform_buffer(&self, set: u32, binding: u32) -> Option<&UniformBuffer> {
        self.descriptor_sets
            .get(set as usize)?
            .uniform_buffers
            .get(&binding)
    }

    pub fn uniform_buffer_count(&self, set: u32) -> usize {
        self.descriptor_sets
            .get(set as usize)
            .map_or(0, |s| s.uniform_buffers.len())
    }
}

impl Serializable for ReflectionData {
    fn serialize<W: StreamWriter + ?Sized>(&self, writer: &mut W) -> StreamResult<()> {
        writer.write_array(&self.descriptor_sets, true)?;
        writer.write_object(&self.resources)?;
        writer.write_object(&self.constant_buffers)?;
        writer.write_array(&self.push_constant_ranges, true)
    }

    fn deserialize<R: StreamReader + ?Sized>(reader: &mut R) -> StreamResult<Self> {
        Ok(Self {
            descriptor_sets: reader.read_array(None)?,
            resources: reader.read_object()?,
            constant_buffers: reader.read_object()?,
            push_constant_ranges: reader.read_array(None)?,
        })
    }
}
