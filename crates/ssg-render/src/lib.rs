//! Markdown page renderer for ssg.
//!
//! Rendering happens entirely inside a caller-supplied [`Bump`] arena: the
//! returned [`Rendered`] borrows its title and HTML from it, so the build
//! can reclaim a page's memory by resetting the arena.
//!
//! The [`PageRenderer`] trait is the seam between the build orchestrator and
//! the Markdown engine. [`MarkdownRenderer`] is the pulldown-cmark
//! implementation used by the CLI.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use ssg_render::{MarkdownRenderer, PageRenderer};
//!
//! let bump = Bump::new();
//! let page = MarkdownRenderer::new()
//!     .render(b"# Hello\n\n**Bold** text", &bump)
//!     .unwrap();
//! assert_eq!(page.title, Some("Hello"));
//! assert!(page.html.contains("<strong>Bold</strong>"));
//! ```

mod error;
mod escape;
mod front_matter;
mod markdown;

pub use bumpalo::Bump;
pub use error::RenderError;
pub use escape::escape_html;
pub use front_matter::{FrontMatter, split_front_matter};
pub use markdown::MarkdownRenderer;

/// A rendered page, borrowed from the arena it was rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendered<'a> {
    /// Page title, from front matter or the first level-1 heading.
    pub title: Option<&'a str>,
    /// HTML body.
    pub html: &'a str,
}

/// Converts one source document into HTML.
///
/// Implementations are shared by every build worker, hence `Send + Sync`.
pub trait PageRenderer: Send + Sync {
    /// Render `source` into `bump`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be rendered. The build logs it
    /// and skips the file.
    fn render<'a>(&self, source: &[u8], bump: &'a Bump) -> Result<Rendered<'a>, RenderError>;
}
