//! Deferred output writes.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Default number of pending writes per worker.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Outcome of a [`WriteBatch::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Outputs written successfully.
    pub written: Vec<PathBuf>,
    /// Outputs that could not be written, with the reason.
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl FlushReport {
    /// Append the outcomes of another flush.
    pub fn extend(&mut self, other: FlushReport) {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
    }

    /// Whether the flush touched no output.
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.failed.is_empty()
    }
}

/// Bounded list of pending `(path, content)` writes owned by one worker.
///
/// `C` is the content type; the build uses `&[u8]` borrowed from a per-batch
/// arena, which the borrow checker then keeps alive until the batch is gone.
/// Dropping a batch with pending entries discards them without writing.
#[derive(Debug)]
pub struct WriteBatch<C> {
    entries: Vec<(PathBuf, C)>,
    capacity: usize,
}

impl<C: AsRef<[u8]>> WriteBatch<C> {
    /// Create an empty batch holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Queue a write, flushing first if the batch is already full.
    ///
    /// Returns the report of that implicit flush; empty when none happened.
    pub fn add(&mut self, path: PathBuf, content: C) -> FlushReport {
        let report = if self.is_full() {
            self.flush()
        } else {
            FlushReport::default()
        };
        self.entries.push((path, content));
        report
    }

    /// Write every pending entry and empty the batch.
    ///
    /// Each output is created or truncated and written in full. A failing
    /// entry is logged and reported; the remaining entries are still written.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport {
            written: Vec::with_capacity(self.entries.len()),
            failed: Vec::new(),
        };
        for (path, content) in self.entries.drain(..) {
            match fs::write(&path, content.as_ref()) {
                Ok(()) => report.written.push(path),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to write output");
                    report.failed.push((path, e));
                }
            }
        }
        report
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the next [`add`](Self::add) will flush first.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Maximum number of pending entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
