//! Tests for the pack schema records

use super::*;
use crate::error::PackError;
use forge_shared::{Buffer, MemoryStreamReader, MemoryStreamWriter, StreamWriter, StreamWriterExt};

#[test]
fn test_header_bytes() {
    let header = FileHeader::new(2, 3);
    let bytes = header.to_bytes();

    assert_eq!(&bytes[0..4], b"FGSP");
    assert_eq!(&bytes[4..8], &SHADER_PACK_VERSION.to_le_bytes());
    assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
    assert_eq!(&bytes[12..16], &[3, 0, 0, 0]);

    assert_eq!(FileHeader::from_bytes(&bytes), Some(header));
    assert!(header.has_valid_magic());
}

#[test]
fn test_header_from_short_slice() {
    assert!(FileHeader::from_bytes(&[0u8; 15]).is_none());
}

#[test]
fn test_header_bad_magic() {
    let mut bytes = FileHeader::new(0, 0).to_bytes();
    bytes[0..4].copy_from_slice(b"NOPE");
    let header = FileHeader::from_bytes(&bytes).unwrap();
    assert!(!header.has_valid_magic());
}

#[test]
fn test_module_info_layout() {
    let info = ModuleInfo {
        packed_offset: 0x0102,
        packed_size: 20,
        version: MODULE_VERSION,
        stage: ShaderStage::Fragment.tag(),
        flags: 0xAABBCCDD,
    };

    let mut bytes = [0xFFu8; ModuleInfo::SIZE];
    forge_shared::RawValue::write_le(&info, &mut bytes);

    assert_eq!(&bytes[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
    assert_eq!(&bytes[8..16], &[20, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(bytes[16], MODULE_VERSION);
    assert_eq!(bytes[17], 2);
    // Reserved bytes are always zero
    assert_eq!(&bytes[18..20], &[0, 0]);
    assert_eq!(&bytes[20..24], &[0xDD, 0xCC, 0xBB, 0xAA]);

    let decoded: ModuleInfo = forge_shared::RawValue::read_le(&bytes);
    assert_eq!(decoded, info);
    assert_eq!(decoded.end_offset(), 0x0102 + 20);
    assert_eq!(decoded.stage().unwrap(), ShaderStage::Fragment);
}

#[test]
fn test_stage_tags() {
    for stage in ShaderStage::ALL {
        assert_eq!(ShaderStage::try_from(stage.tag()).unwrap(), stage);
    }
    assert!(matches!(
        ShaderStage::try_from(0),
        Err(PackError::InvalidStage(0))
    ));
    assert!(matches!(
        ShaderStage::try_from(9),
        Err(PackError::InvalidStage(9))
    ));
    assert_eq!(ShaderStage::Compute.to_string(), "compute");
}

#[test]
fn test_index_sizes() {
    assert_eq!(program_index_size(std::iter::empty()), 0);
    // hash + offset + count + one index
    assert_eq!(program_index_size([1]), 20);
    assert_eq!(program_index_size([1, 2]), 20 + 24);
    assert_eq!(module_index_size(0), 0);
    assert_eq!(module_index_size(3), 72);

    let info = ProgramInfo {
        reflection_offset: 0,
        module_indices: vec![0, 1],
    };
    assert_eq!(info.entry_size(), 24);
}

fn write_index(entries: &[(u32, ProgramInfo)], modules: &[ModuleInfo]) -> Buffer {
    let mut buffer = Buffer::new();
    let mut writer = MemoryStreamWriter::new(&mut buffer, 1024);
    writer
        .write_map(entries.iter().map(|(k, v)| (k, v)), false)
        .unwrap();
    writer.write_array(modules, false).unwrap();
    let len = writer.position().unwrap() as usize;
    drop(writer);
    Buffer::copy(&buffer.as_bytes()[..len])
}

fn module(offset: u64, size: u64, stage: ShaderStage) -> ModuleInfo {
    ModuleInfo {
        packed_offset: offset,
        packed_size: size,
        version: MODULE_VERSION,
        stage: stage.tag(),
        flags: 0,
    }
}

#[test]
fn test_pack_index_read() {
    let entries = vec![
        (
            0x1111_1111,
            ProgramInfo {
                reflection_offset: 100,
                module_indices: vec![0],
            },
        ),
        (
            0x2222_2222,
            ProgramInfo {
                reflection_offset: 200,
                module_indices: vec![1, 2],
            },
        ),
    ];
    let modules = vec![
        module(116, 12, ShaderStage::Vertex),
        module(216, 8, ShaderStage::Vertex),
        module(224, 20, ShaderStage::Fragment),
    ];

    let buffer = write_index(&entries, &modules);
    assert_eq!(
        buffer.size() as u64,
        program_index_size([1, 2]) + module_index_size(3)
    );

    let header = FileHeader::new(2, 3);
    let mut reader = MemoryStreamReader::new(&buffer);
    let index = PackIndex::read(&mut reader, &header).unwrap();

    assert_eq!(index.programs.len(), 2);
    assert_eq!(index.modules, modules);
    assert_eq!(index.program(0x2222_2222).unwrap().module_indices, vec![1, 2]);
    assert_eq!(index.module(2).unwrap().packed_size, 20);
    assert!(index.program(0x3333_3333).is_none());
    assert!(index.module(3).is_none());
}

#[test]
fn test_pack_index_rejects_bad_module_index() {
    let entries = vec![(
        7,
        ProgramInfo {
            reflection_offset: 0,
            module_indices: vec![4],
        },
    )];
    let modules = vec![module(0, 4, ShaderStage::Compute)];

    let buffer = write_index(&entries, &modules);
    let mut reader = MemoryStreamReader::new(&buffer);
    let err = PackIndex::read(&mut reader, &FileHeader::new(1, 1)).unwrap_err();

    assert!(matches!(
        err,
        PackError::InvalidModuleIndex {
            key: 7,
            index: 4,
            module_count: 1
        }
    ));
}

#[test]
fn test_pack_index_rejects_duplicate_key() {
    let info = ProgramInfo {
        reflection_offset: 0,
        module_indices: vec![],
    };
    let entries = vec![(5, info.clone()), (5, info)];

    let buffer = write_index(&entries, &[]);
    let mut reader = MemoryStreamReader::new(&buffer);
    let err = PackIndex::read(&mut reader, &FileHeader::new(2, 0)).unwrap_err();
    assert!(matches!(err, PackError::DuplicateKey { key: 5 }));
}

#[test]
fn test_pack_index_truncated() {
    let entries = vec![(
        1,
        ProgramInfo {
            reflection_offset: 0,
            module_indices: vec![0],
        },
    )];
    let buffer = write_index(&entries, &[module(0, 4, ShaderStage::Vertex)]);
    let truncated = Buffer::copy(&buffer.as_bytes()[..buffer.size() - 1]);

    let mut reader = MemoryStreamReader::new(&truncated);
    let err = PackIndex::read(&mut reader, &FileHeader::new(1, 1)).unwrap_err();
    assert!(err.is_short_transfer());
}
