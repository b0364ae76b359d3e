//! Minimal front matter support.
//!
//! A document may open with a block delimited by `---` lines. Only the
//! `title:` key is recognized; surrounding spaces and double quotes are
//! trimmed from its value. Everything else in the block is ignored.

const DELIMITER: &str = "---";

/// Fields read from a front matter block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontMatter<'s> {
    /// Value of the `title:` key, if present and non-empty.
    pub title: Option<&'s str>,
}

/// Split a document into its front matter and Markdown body.
///
/// Returns default front matter and the whole document when it does not
/// open with a `---` line or the block is never closed.
///
/// # Examples
///
/// ```
/// use ssg_render::split_front_matter;
///
/// let (fm, body) = split_front_matter("---\ntitle: \"Intro\"\n---\n# Body\n");
/// assert_eq!(fm.title, Some("Intro"));
/// assert_eq!(body, "# Body\n");
/// ```
#[must_use]
pub fn split_front_matter(source: &str) -> (FrontMatter<'_>, &str) {
    let Some(rest) = strip_delimiter_line(source) else {
        return (FrontMatter::default(), source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (parse_block(block), body);
        }
        offset += line.len();
    }

    (FrontMatter::default(), source)
}

/// Strip an opening `---` line, returning what follows it.
fn strip_delimiter_line(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(DELIMITER)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

fn parse_block(block: &str) -> FrontMatter<'_> {
    let title = block
        .lines()
        .find_map(|line| line.strip_prefix("title:"))
        .map(|value| value.trim_matches(|c: char| c.is_whitespace() || c == '"'))
        .filter(|value| !value.is_empty());
    FrontMatter { title }
}
