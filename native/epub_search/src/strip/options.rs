//! Stripping options

/// Options for a strip call
///
/// The default is the plain behaviour: character data is copied verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripOptions {
    /// Replace line breaks written in the document's character data with
    /// spaces, so that source line wrapping is not mistaken for a paragraph
    /// boundary. A `\r\n` pair becomes `\n ` (the `\r` is normalized after
    /// folding). Newlines from `&#10;` and those inserted for block elements
    /// are kept.
    pub fold_newlines: bool,
}

impl StripOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold_newlines(mut self, fold: bool) -> Self {
        self.fold_newlines = fold;
        self
    }
}
