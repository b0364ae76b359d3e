//! Binary cache file format.
//!
//! ```text
//! u64 magic = 0x5353474341434543 ("SSGCACHE")
//! u64 entry_count
//! repeated entry_count times:
//!   u64 input_len    (includes NUL terminator)
//!   [u8; input_len]
//!   u64 output_len   (includes NUL terminator)
//!   [u8; output_len]
//!   i64 last_modified (epoch seconds)
//!   u64 content_hash
//! ```
//!
//! All integers are little-endian. Decoding is all-or-nothing: the first
//! malformed byte aborts the whole decode.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cache::CacheEntry;
use crate::error::CacheError;

/// Magic number at the start of every cache file ("SSGCACHE").
pub const CACHE_MAGIC: u64 = 0x5353_4743_4143_4543;

/// Upper bound on a stored path length, terminator included.
pub const MAX_PATH_LEN: u64 = 4096;

/// Smallest possible encoded entry: two 1-byte paths plus three u64 fields.
const MIN_ENTRY_LEN: usize = 8 + 1 + 8 + 1 + 8 + 8;

/// Serialize entries into the on-disk representation.
pub(crate) fn encode<'a>(
    entries: impl ExactSizeIterator<Item = &'a CacheEntry>,
) -> Result<Vec<u8>, CacheError> {
    let mut buf = Vec::with_capacity(16 + entries.len() * 96);
    buf.extend_from_slice(&CACHE_MAGIC.to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u64).to_le_bytes());

    for entry in entries {
        write_path(&mut buf, &entry.input_path)?;
        write_path(&mut buf, &entry.output_path)?;
        buf.extend_from_slice(&entry.last_modified.to_le_bytes());
        buf.extend_from_slice(&entry.content_hash.to_le_bytes());
    }

    Ok(buf)
}

/// Parse the on-disk representation.
///
/// Duplicate keys collapse with last-one-wins semantics, matching `upsert`.
pub(crate) fn decode(bytes: &[u8]) -> Result<HashMap<PathBuf, CacheEntry>, CacheError> {
    let mut reader = Reader::new(bytes);

    if reader.u64()? != CACHE_MAGIC {
        return Err(CacheError::BadMagic);
    }
    let count = reader.u64()?;

    // Never trust the declared count for preallocation
    let plausible = reader.remaining() / MIN_ENTRY_LEN;
    let capacity = usize::try_from(count).map_or(plausible, |c| c.min(plausible));
    let mut entries = HashMap::with_capacity(capacity);

    for _ in 0..count {
        let input_path = reader.path()?;
        let output_path = reader.path()?;
        let last_modified = reader.i64()?;
        let content_hash = reader.u64()?;
        entries.insert(
            input_path.clone(),
            CacheEntry {
                input_path,
                output_path,
                last_modified,
                content_hash,
            },
        );
    }

    if reader.remaining() != 0 {
        return Err(CacheError::TrailingBytes { entries: count });
    }

    Ok(entries)
}

fn write_path(buf: &mut Vec<u8>, path: &Path) -> Result<(), CacheError> {
    let s = path
        .to_str()
        .ok_or_else(|| CacheError::NonUtf8Path(path.to_path_buf()))?;
    if s.contains('\0') {
        return Err(CacheError::InvalidPath);
    }
    let len = s.len() as u64 + 1;
    if len > MAX_PATH_LEN {
        return Err(CacheError::PathTooLong { len });
    }
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

/// Bounds-checked cursor over the cache bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CacheError> {
        if self.remaining() < n {
            return Err(CacheError::Truncated { offset: self.pos });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array(&mut self) -> Result<[u8; 8], CacheError> {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.take(8)?);
        Ok(out)
    }

    fn u64(&mut self) -> Result<u64, CacheError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, CacheError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn path(&mut self) -> Result<PathBuf, CacheError> {
        let len = self.u64()?;
        if len == 0 || len > MAX_PATH_LEN {
            return Err(CacheError::PathTooLong { len });
        }
        #[allow(clippy::cast_possible_truncation)] // bounded by MAX_PATH_LEN
        let raw = self.take(len as usize)?;
        let (terminator, text) = raw.split_last().ok_or(CacheError::InvalidPath)?;
        if *terminator != 0 || text.contains(&0) {
            return Err(CacheError::InvalidPath);
        }
        let text = std::str::from_utf8(text).map_err(|_| CacheError::InvalidPath)?;
        Ok(PathBuf::from(text))
    }
}
