//! Page template split around its placeholders.

use std::path::Path;

use ssg_cache::content_hash;
use ssg_render::escape_html;

use crate::arena::Arena;
use crate::error::BuildError;
use crate::mapped::MappedFile;

/// Placeholder replaced by the HTML-escaped page title.
pub const TITLE_PLACEHOLDER: &[u8] = b"{{title}}";
/// Placeholder replaced by the rendered page body.
pub const CONTENT_PLACEHOLDER: &[u8] = b"{{content}}";

/// A memory-mapped template cut into the three literal runs around
/// `{{title}}` and `{{content}}`.
///
/// Built once per build and shared read-only by every worker.
#[derive(Debug)]
pub struct TemplateParts {
    source: MappedFile,
    title_at: usize,
    content_at: usize,
}

impl TemplateParts {
    /// Map the template at `path` and locate its placeholders.
    ///
    /// The first `{{title}}` and the first `{{content}}` after it are used.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let source = MappedFile::open(path).map_err(|e| BuildError::io(path, e))?;

        let invalid = |message: &str| BuildError::Template {
            path: path.to_path_buf(),
            message: message.to_owned(),
        };
        let title_at =
            find(&source, TITLE_PLACEHOLDER).ok_or_else(|| invalid("missing {{title}} placeholder"))?;
        let after_title = title_at + TITLE_PLACEHOLDER.len();
        let content_at = find(&source[after_title..], CONTENT_PLACEHOLDER)
            .map(|offset| after_title + offset)
            .ok_or_else(|| invalid("missing {{content}} placeholder after {{title}}"))?;

        Ok(Self {
            source,
            title_at,
            content_at,
        })
    }

    /// FNV-1a hash of the whole template.
    pub fn content_hash(&self) -> u64 {
        content_hash(&self.source)
    }

    /// Everything before `{{title}}`.
    pub fn head(&self) -> &[u8] {
        &self.source[..self.title_at]
    }

    /// Everything between `{{title}}` and `{{content}}`.
    pub fn middle(&self) -> &[u8] {
        &self.source[self.title_at + TITLE_PLACEHOLDER.len()..self.content_at]
    }

    /// Everything after `{{content}}`.
    pub fn tail(&self) -> &[u8] {
        &self.source[self.content_at + CONTENT_PLACEHOLDER.len()..]
    }

    /// Assemble a full page into `arena`.
    ///
    /// A missing title becomes the empty string.
    pub fn assemble_into<'a>(&self, arena: &'a Arena, title: Option<&str>, html: &str) -> &'a [u8] {
        let title = escape_html(title.unwrap_or_default());
        arena.alloc_concat(&[
            self.head(),
            title.as_bytes(),
            self.middle(),
            html.as_bytes(),
            self.tail(),
        ])
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
