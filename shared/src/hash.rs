//! Stable name hashing.
//!
//! Pack files key programs by the 32-bit FNV-1a hash of their name. The hash is a
//! pure function of the UTF-8 bytes, so a writer and a reader running in different
//! processes (or on different hosts) always agree on the key.
//!
//! Only the name's own bytes are hashed. No terminator is appended, so keys do
//! not match hashers that include a trailing NUL.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of `bytes`.
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Hash a program or asset name.
pub const fn name_hash(name: &str) -> u32 {
    fnv1a_32(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        // Reference values from the FNV test suite
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_const_evaluable() {
        const KEY: u32 = name_hash("shaders/pbr.glsl");
        assert_eq!(KEY, name_hash("shaders/pbr.glsl"));
    }

    #[test]
    fn test_name_hash_excludes_terminator() {
        assert_eq!(name_hash("a"), fnv1a_32(b"a"));
        assert_ne!(name_hash("a"), fnv1a_32(b"a\0"));
        assert_eq!(fnv1a_32(b"a\0"), 0x2b24d044);
    }

    #[test]
    fn test_distinct_names() {
        assert_ne!(name_hash("A"), name_hash("B"));
        assert_ne!(name_hash("shaders/a"), name_hash("shaders/A"));
    }
}
