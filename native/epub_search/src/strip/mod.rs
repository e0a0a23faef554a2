//! XHTML Tag Stripper
//!
//! Extracts the visible text of an XHTML document for indexing. Only the
//! character data inside `body` is kept, and a newline is appended after
//! the end tag of every block element (`p`, `div`, `br`, `h1`..`h6`) so
//! that paragraph structure survives.
//!
//! ## Architecture
//!
//! ```text
//! &[u8] ---> decode_input ---> Scanner ---> Extraction (ScanHandler) ---> String
//!                                               |
//!                                               v
//!                                          TextBuffer
//! ```
//!
//! Extraction is a two-state machine. In `Preamble` only the start-tag
//! callback is active, waiting for `body`; everything in `head` is skipped.
//! In `Capturing` only the text and end-tag callbacks are active. No tree is
//! built and no element outlives its own event.
//!
//! Content of `script` and `style` elements inside `body` is emitted like
//! any other text.

pub mod buffer;
pub mod options;

use crate::core::encoding::decode_input;
use crate::core::scanner::{ActiveHandlers, ScanHandler, Scanner};
use crate::error::Result;
use buffer::TextBuffer;
pub use options::StripOptions;

/// Extraction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Waiting for the `body` start tag
    Preamble,
    /// Inside `body`: collecting text and block boundaries
    Capturing,
}

const PREAMBLE_HANDLERS: ActiveHandlers = ActiveHandlers {
    start_element: true,
    text: false,
    end_element: false,
};

const CAPTURING_HANDLERS: ActiveHandlers = ActiveHandlers {
    start_element: false,
    text: true,
    end_element: true,
};

/// True for end tags that mark a block boundary
///
/// Plain byte comparison: no case folding, no namespace prefix handling.
#[inline]
pub fn is_block_element(name: &[u8]) -> bool {
    matches!(name, b"p" | b"div" | b"br")
        || matches!(name, [b'h', level] if (b'1'..=b'6').contains(level))
}

/// Accumulator for a single strip call
struct Extraction {
    mode: Mode,
    buffer: TextBuffer,
}

impl Extraction {
    fn new(capacity: usize) -> Result<Self> {
        Ok(Extraction {
            mode: Mode::Preamble,
            buffer: TextBuffer::with_capacity(capacity)?,
        })
    }
}

impl ScanHandler for Extraction {
    fn active(&self) -> ActiveHandlers {
        match self.mode {
            Mode::Preamble => PREAMBLE_HANDLERS,
            Mode::Capturing => CAPTURING_HANDLERS,
        }
    }

    fn start_element(&mut self, name: &[u8]) {
        if name == b"body" {
            tracing::trace!("body found, capturing text");
            self.mode = Mode::Capturing;
        }
    }

    fn text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn end_element(&mut self, name: &[u8]) {
        if is_block_element(name) {
            self.buffer.push_newline();
        }
    }
}

/// Reusable stripper carrying a set of options
///
/// Holds no per-call state, so one value can be shared between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagStripper {
    options: StripOptions,
}

impl TagStripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StripOptions) -> Self {
        TagStripper { options }
    }

    /// Strip the tags from an XHTML document
    ///
    /// Returns `InvalidMarkup` if the document is not well-formed; no
    /// partial text is returned in that case.
    pub fn strip(&self, xhtml: &[u8]) -> Result<String> {
        let result = self.strip_inner(xhtml);
        match &result {
            Ok((text, mode)) => tracing::debug!(
                input_bytes = xhtml.len(),
                output_bytes = text.len(),
                body_found = *mode == Mode::Capturing,
                "stripped tags"
            ),
            Err(e) => tracing::debug!(input_bytes = xhtml.len(), error = %e, "failed to strip tags"),
        }
        result.map(|(text, _)| text)
    }

    fn strip_inner(&self, xhtml: &[u8]) -> Result<(String, Mode)> {
        // Without internal DTD entities the text is never longer than the XHTML
        let mut extraction = Extraction::new(xhtml.len())?;

        let document = decode_input(xhtml)?;
        let bom_len = xhtml.len() - document.len();
        Scanner::new(document)
            .with_base(bom_len)
            .fold_newlines(self.options.fold_newlines)
            .scan(&mut extraction)?;

        Ok((extraction.buffer.finish(), extraction.mode))
    }
}

/// Strip the tags from an XHTML document with default options
pub fn strip_tags(xhtml: &[u8]) -> Result<String> {
    TagStripper::new().strip(xhtml)
}

/// Strip the tags from an XHTML document with the given options
pub fn strip_tags_with(xhtml: &[u8], options: &StripOptions) -> Result<String> {
    TagStripper::with_options(*options).strip(xhtml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StripError;

    #[test]
    fn test_block_elements() {
        for name in ["p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6"] {
            assert!(is_block_element(name.as_bytes()), "{name} should be a block element");
        }
        for name in ["P", "h0", "h7", "h", "h10", "hr", "span", "xhtml:p", "body", "pre"] {
            assert!(!is_block_element(name.as_bytes()), "{name} should not be a block element");
        }
    }

    #[test]
    fn test_paragraphs() {
        let text = strip_tags(b"<html><body><p>Hello</p><p>World</p></body></html>").unwrap();
        assert_eq!(text, "Hello\nWorld\n");
    }

    #[test]
    fn test_head_skipped_inline_removed() {
        let input = b"<html><head><title>Ignored</title></head><body><h1>Title</h1>Some <b>bold</b> text.<br/></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "Title\nSome bold text.\n");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(strip_tags(b"<html><body></body></html>").unwrap(), "");
    }

    #[test]
    fn test_no_body() {
        assert_eq!(strip_tags(b"<html><head><title>t</title></head></html>").unwrap(), "");
    }

    #[test]
    fn test_self_closed_blocks_emit_newline() {
        assert_eq!(strip_tags(b"<html><body><p/><div/><br/></body></html>").unwrap(), "\n\n\n");
    }

    #[test]
    fn test_nested_blocks_each_emit_newline() {
        let input = b"<html><body><div><p>a</p></div></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "a\n\n");
    }

    #[test]
    fn test_text_after_body_still_captured() {
        // Capturing continues after `body` closes
        let input = b"<html><body>x</body>after</html>";
        assert_eq!(strip_tags(input).unwrap(), "xafter");
    }

    #[test]
    fn test_nested_body_not_special() {
        let input = b"<html><body><body>a</body><p>b</p></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "ab\n");
    }

    #[test]
    fn test_body_name_is_case_sensitive() {
        assert_eq!(strip_tags(b"<html><BODY><p>x</p></BODY></html>").unwrap(), "");
    }

    #[test]
    fn test_prefixed_body_not_matched() {
        let input = b"<x:html xmlns:x=\"http://www.w3.org/1999/xhtml\"><x:body><x:p>a</x:p></x:body></x:html>";
        assert_eq!(strip_tags(input).unwrap(), "");
    }

    #[test]
    fn test_script_and_style_leak() {
        let input = b"<html><body><style>p{}</style><script>go()</script><p>x</p></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "p{}go()x\n");
    }

    #[test]
    fn test_entities_decoded() {
        let input = b"<html><body><p>a &lt; b &amp;&amp; c&#33;</p></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "a < b && c!\n");
    }

    #[test]
    fn test_cdata_captured() {
        let input = b"<html><body><![CDATA[<raw>]]></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "<raw>");
    }

    #[test]
    fn test_text_newlines_preserved_by_default() {
        let input = b"<html><body><p>one\r\ntwo</p></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_fold_newlines() {
        let input = b"<html><body><p>one\ntwo</p>\n<p>three</p></body></html>";
        let options = StripOptions::new().fold_newlines(true);
        assert_eq!(strip_tags_with(input, &options).unwrap(), "one two\n three\n");
    }

    #[test]
    fn test_fold_newlines_only_folds_source_newlines() {
        let options = StripOptions::new().fold_newlines(true);
        let input = b"<html><body><p>a&#10;b</p></body></html>";
        assert_eq!(strip_tags_with(input, &options).unwrap(), "a\nb\n");

        let input = b"<html><body><p>a\r\nb</p></body></html>";
        assert_eq!(strip_tags_with(input, &options).unwrap(), "a\n b\n");
    }

    #[test]
    fn test_fold_newlines_in_cdata() {
        let options = StripOptions::new().fold_newlines(true);
        let input = b"<html><body><![CDATA[x\ny]]></body></html>";
        assert_eq!(strip_tags_with(input, &options).unwrap(), "x y");
    }

    #[test]
    fn test_internal_entity_expanded() {
        let input = b"<!DOCTYPE html [<!ENTITY book \"The Long Night\">]><html><body><p>&book;</p></body></html>";
        assert_eq!(strip_tags(input).unwrap(), "The Long Night\n");
    }

    #[test]
    fn test_undeclared_entity_needs_external_subset() {
        let bare = b"<!DOCTYPE html><html><body><p>a&nbsp;b</p></body></html>";
        assert!(strip_tags(bare).unwrap_err().is_invalid_markup());

        let public = b"<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"xhtml11.dtd\"><html><body><p>a&nbsp;b</p></body></html>";
        assert_eq!(strip_tags(public).unwrap(), "ab\n");
    }

    #[test]
    fn test_unclosed_paragraph_is_invalid() {
        let err = strip_tags(b"<html><body><p>Hello</body></html>").unwrap_err();
        assert!(err.is_invalid_markup());
    }

    #[test]
    fn test_error_in_head_is_invalid() {
        let err = strip_tags(b"<html><head><title>x</titel></head><body/></html>").unwrap_err();
        assert!(matches!(err, StripError::InvalidMarkup { .. }));
    }

    #[test]
    fn test_error_after_body_is_invalid() {
        assert!(strip_tags(b"<html><body><p>ok</p></body></html><extra/>").is_err());
    }

    #[test]
    fn test_bom_ignored() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"<html><body><p>x</p></body></html>");
        assert_eq!(strip_tags(&input).unwrap(), "x\n");
    }

    #[test]
    fn test_stripper_is_reusable() {
        let stripper = TagStripper::new();
        let input = b"<html><body><p>same</p></body></html>";
        let first = stripper.strip(input).unwrap();
        assert!(stripper.strip(b"<html><body>").is_err());
        let second = stripper.strip(input).unwrap();
        assert_eq!(first, second);
    }
}
