//! Bump arena for per-file and per-batch scratch memory.

use std::alloc::Layout;

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

/// Default size of the first arena block.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Errors from raw arena allocation.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The alignment is not a power of two or the size overflows when rounded.
    #[error("invalid allocation layout (size {size}, align {align})")]
    InvalidLayout {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment.
        align: usize,
    },

    /// The system allocator could not provide a new block.
    #[error("arena out of memory allocating {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes.
        size: usize,
    },
}

/// Growable bump allocator.
///
/// Allocation hands out consecutive chunks of the current block; when a
/// request does not fit, a new block at least large enough for it is chained
/// in. Individual allocations are never freed. [`reset`](Self::reset) rewinds
/// the whole arena at once and takes `&mut self`, so no allocation can be
/// used across it.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    /// Create an arena with the default block size.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create an arena whose first block holds `block_size` bytes.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            bump: Bump::with_capacity(block_size),
        }
    }

    /// Underlying allocator, for APIs that build collections in place.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Allocate `size` zeroed bytes aligned to `align`.
    ///
    /// A zero-sized request returns an empty slice.
    pub fn alloc(&self, size: usize, align: usize) -> Result<&mut [u8], ArenaError> {
        let layout =
            Layout::from_size_align(size, align).map_err(|_| ArenaError::InvalidLayout { size, align })?;
        if size == 0 {
            return Ok(&mut []);
        }
        let ptr = self
            .bump
            .try_alloc_layout(layout)
            .map_err(|_| ArenaError::OutOfMemory { size })?;
        // SAFETY: `ptr` is a fresh allocation of `size` bytes owned by the
        // arena, valid until the arena is reset or dropped; both need `&mut self`,
        // which cannot happen while the returned borrow of `self` is alive.
        let bytes = unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
            std::slice::from_raw_parts_mut(ptr.as_ptr(), size)
        };
        Ok(bytes)
    }

    /// Copy a string into the arena.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Concatenate byte slices into one contiguous arena allocation.
    pub fn alloc_concat(&self, parts: &[&[u8]]) -> &[u8] {
        let total = parts.iter().map(|p| p.len()).sum();
        let mut buf = BumpVec::with_capacity_in(total, &self.bump);
        for part in parts {
            buf.extend_from_slice(part);
        }
        buf.into_bump_slice()
    }

    /// Total bytes held by the arena's blocks, used or not.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Rewind the arena, invalidating every allocation.
    ///
    /// Only the most recent block is kept for reuse; older blocks are returned
    /// to the system allocator. Memory held across resets is therefore the size
    /// of that last block, not the total of every block allocated since the
    /// previous reset. Because block sizes grow, the last block is usually the
    /// largest, and a steady workload stops allocating after a few resets.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}
