//! FNV-1a content fingerprints.
//!
//! The same digest is produced whether the bytes are hashed from memory
//! ([`content_hash`]) or streamed from disk ([`file_hash`]). A digest written
//! by one build is compared against one computed by a later build, possibly
//! through the other path, so the two must never diverge.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Read size used by [`file_hash`].
const CHUNK_SIZE: usize = 4096;

/// Incremental 64-bit FNV-1a hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a {
    state: u64,
}

impl Fnv1a {
    /// Create a hasher at the FNV offset basis.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    /// Feed more bytes into the hash.
    pub fn update(&mut self, bytes: &[u8]) {
        let mut hash = self.state;
        for &byte in bytes {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        self.state = hash;
    }

    /// Current digest.
    #[must_use]
    pub const fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a buffer that is already in memory (e.g. a mapped file).
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = Fnv1a::new();
    hasher.update(bytes);
    hasher.finish()
}

/// Hash a file on disk, streaming it in fixed-size chunks.
pub fn file_hash(path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let mut hasher = Fnv1a::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_offset_basis() {
        assert_eq!(content_hash(b""), FNV_OFFSET);
    }

    #[test]
    fn test_known_vectors() {
        // Reference values for 64-bit FNV-1a
        assert_eq!(content_hash(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(content_hash(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Fnv1a::new();
        hasher.update(b"# Hi\n");
        hasher.update(b"");
        hasher.update(b"body text");
        assert_eq!(hasher.finish(), content_hash(b"# Hi\nbody text"));
    }

    #[test]
    fn test_file_hash_matches_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.md");
        // Spans several read chunks and ends mid-chunk
        let content: Vec<u8> = (0..CHUNK_SIZE * 3 + 123).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        assert_eq!(file_hash(&path).unwrap(), content_hash(&content));
    }

    #[test]
    fn test_file_hash_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(file_hash(&path).unwrap(), content_hash(b""));
    }

    #[test]
    fn test_file_hash_missing_file_errors() {
        assert!(file_hash(Path::new("/nonexistent/file.md")).is_err());
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(content_hash(b"# Hi"), content_hash(b"text"));
    }
}
