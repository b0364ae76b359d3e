//! Render error type.

/// Errors produced while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The source is not valid UTF-8.
    #[error("source is not valid UTF-8 at byte {valid_up_to}")]
    InvalidUtf8 {
        /// Length of the valid prefix.
        valid_up_to: usize,
    },

    /// The HTML writer failed.
    #[error("failed to write HTML: {0}")]
    Write(#[from] std::fmt::Error),
}

impl From<std::str::Utf8Error> for RenderError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        }
    }
}
