//! pulldown-cmark backed [`PageRenderer`].

use bumpalo::Bump;
use bumpalo::collections::String as BumpString;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::error::RenderError;
use crate::front_matter::split_front_matter;
use crate::{PageRenderer, Rendered};

/// Renders Markdown with optional front matter into HTML.
///
/// The title comes from the front matter `title:` key when present,
/// otherwise from the text of the first level-1 heading. The heading itself
/// is still rendered.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    gfm: bool,
}

impl MarkdownRenderer {
    /// Create a renderer with GitHub Flavored Markdown extensions enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable tables, strikethrough and task lists.
    #[must_use]
    pub const fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for MarkdownRenderer {
    fn render<'a>(&self, source: &[u8], bump: &'a Bump) -> Result<Rendered<'a>, RenderError> {
        let text = std::str::from_utf8(source)?;
        let (front_matter, body) = split_front_matter(text);

        // HTML output is usually a little larger than its source
        let mut out = BumpString::with_capacity_in(body.len() + body.len() / 4, bump);

        let title = if let Some(title) = front_matter.title {
            html::write_html_fmt(&mut out, Parser::new_ext(body, self.parser_options()))?;
            let title: &'a str = bump.alloc_str(title);
            Some(title)
        } else {
            let mut heading = HeadingCapture::new(bump);
            let events = Parser::new_ext(body, self.parser_options()).inspect(|e| heading.observe(e));
            html::write_html_fmt(&mut out, events)?;
            heading.finish()
        };

        Ok(Rendered {
            title,
            html: out.into_bump_str(),
        })
    }
}

/// Collects the plain text of the first level-1 heading.
struct HeadingCapture<'a> {
    text: BumpString<'a>,
    state: CaptureState,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Searching,
    Capturing,
    Done,
}

impl<'a> HeadingCapture<'a> {
    fn new(bump: &'a Bump) -> Self {
        Self {
            text: BumpString::new_in(bump),
            state: CaptureState::Searching,
        }
    }

    fn observe(&mut self, event: &Event<'_>) {
        match (self.state, event) {
            (
                CaptureState::Searching,
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                }),
            ) => self.state = CaptureState::Capturing,
            (CaptureState::Capturing, Event::Text(t) | Event::Code(t)) => self.text.push_str(t),
            (CaptureState::Capturing, Event::SoftBreak | Event::HardBreak) => self.text.push(' '),
            (CaptureState::Capturing, Event::End(TagEnd::Heading(HeadingLevel::H1))) => {
                self.state = CaptureState::Done;
            }
            _ => {}
        }
    }

    fn finish(self) -> Option<&'a str> {
        let title = self.text.into_bump_str().trim();
        (!title.is_empty()).then_some(title)
    }
}
