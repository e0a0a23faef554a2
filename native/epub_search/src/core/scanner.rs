//! Well-formedness Scanner with ScanHandler Trait
//!
//! Drives the `quick-xml` pull tokenizer over a whole document and turns its
//! token stream into the three callbacks an extractor needs: start-tag,
//! character-data and end-tag. On top of the tokenizer's own checks the
//! scanner enforces the rest of XML well-formedness that matters here:
//! - a single root element, no text outside it, balanced tags at end of input
//! - valid names, well-formed unique attributes, no `<` in attribute values
//! - resolvable entity references (see [`EntityResolver`])
//! - only XML `Char`s, no `]]>` in character data, no `--` in comments
//! - the XML declaration first, at most one DOCTYPE, before the root
//!
//! Handlers can switch individual callbacks off (see [`ActiveHandlers`]).
//! Inactive callbacks are not invoked, but the scan still validates
//! everything so that a violation anywhere fails the whole document.

use memchr::memchr;
use std::borrow::Cow;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::dtd::parse_doctype;
use super::entities::EntityResolver;
use super::text::{contains_cdata_end, fold_newlines, is_xml_whitespace, normalize_line_endings, validate_xml_chars};
use crate::error::{Result, StripError};

/// Which callbacks a handler currently wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHandlers {
    pub start_element: bool,
    pub text: bool,
    pub end_element: bool,
}

impl ActiveHandlers {
    pub const ALL: ActiveHandlers = ActiveHandlers {
        start_element: true,
        text: true,
        end_element: true,
    };
}

/// Trait for handling scan events
///
/// Names are passed as raw bytes exactly as written in the document
/// (prefix included, no namespace resolution). Text is entity-decoded and
/// line-ending normalized. Self-closing elements produce a start and an
/// end callback.
pub trait ScanHandler {
    /// Callbacks to deliver for the next event
    fn active(&self) -> ActiveHandlers {
        ActiveHandlers::ALL
    }

    /// Called when an element starts
    fn start_element(&mut self, name: &[u8]);

    /// Called for character data, including CDATA section contents
    fn text(&mut self, text: &str);

    /// Called when an element ends
    fn end_element(&mut self, name: &[u8]);
}

/// Scanner over a complete, already UTF-8 validated document
pub struct Scanner<'a> {
    input: &'a str,
    /// Byte offset of `input` within the caller's buffer (BOM length)
    base: usize,
    fold_newlines: bool,
}

/// Per-scan document state
#[derive(Default)]
struct ScanState {
    entities: EntityResolver,
    depth: usize,
    seen_root: bool,
    seen_doctype: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            base: 0,
            fold_newlines: false,
        }
    }

    /// Report error positions relative to a buffer `base` bytes longer
    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Replace each newline written in character data with a space
    ///
    /// Applies to the source text, before line-ending normalization and
    /// reference decoding: `\r\n` becomes `\r ` and then `\n `, while a
    /// newline produced by `&#10;` is kept.
    pub fn fold_newlines(mut self, fold: bool) -> Self {
        self.fold_newlines = fold;
        self
    }

    /// Scan the document to the end, dispatching events to `handler`
    pub fn scan<H: ScanHandler>(&self, handler: &mut H) -> Result<()> {
        let mut reader = Reader::from_str(self.input);
        reader.trim_text(false);
        reader.check_end_names(true);
        reader.check_comments(true);

        let mut state = ScanState::default();

        loop {
            let offset = reader.buffer_position();
            let position = self.base + offset;
            let event = reader
                .read_event()
                .map_err(|e| StripError::invalid(self.base + reader.buffer_position(), e.to_string()))?;

            match event {
                Event::Start(start) => {
                    open_element(&start, position, &mut state, handler)?;
                }

                Event::Empty(start) => {
                    open_element(&start, position, &mut state, handler)?;
                    close_element(start.name().as_ref(), position, &mut state, handler)?;
                }

                Event::End(end) => {
                    close_element(end.name().as_ref(), position, &mut state, handler)?;
                }

                Event::Text(text) => {
                    let raw = as_str(&text, position)?;
                    if state.depth == 0 {
                        if !is_xml_whitespace(raw.as_bytes()) {
                            return Err(StripError::invalid(position, "text outside the root element"));
                        }
                        continue;
                    }
                    if contains_cdata_end(raw) {
                        return Err(StripError::invalid(position, "']]>' in character data"));
                    }
                    self.character_data(raw, position, &state.entities, handler)?;
                }

                Event::CData(cdata) => {
                    if state.depth == 0 {
                        return Err(StripError::invalid(position, "CDATA section outside the root element"));
                    }
                    let raw = as_str(&cdata, position)?;
                    validate_xml_chars(raw).map_err(|reason| StripError::invalid(position, reason))?;
                    if handler.active().text && !raw.is_empty() {
                        let folded = self.fold(raw);
                        handler.text(&normalize_line_endings(&folded));
                    }
                }

                Event::DocType(doctype) => {
                    if state.seen_root {
                        return Err(StripError::invalid(position, "DOCTYPE after the root element"));
                    }
                    if state.seen_doctype {
                        return Err(StripError::invalid(position, "duplicate DOCTYPE declaration"));
                    }
                    state.seen_doctype = true;
                    let content = as_str(&doctype, position)?;
                    validate_xml_chars(content).map_err(|reason| StripError::invalid(position, reason))?;
                    let decl = parse_doctype(content).map_err(|reason| StripError::invalid(position, reason))?;
                    state.entities.apply_doctype(decl);
                }

                Event::Decl(decl) => {
                    if offset != 0 {
                        return Err(StripError::invalid(
                            position,
                            "XML declaration not at start of document",
                        ));
                    }
                    decl.version().map_err(|e| StripError::invalid(position, e.to_string()))?;
                }

                Event::PI(pi) => {
                    let content = as_str(&pi, position)?;
                    let target_end = content
                        .find(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r'))
                        .unwrap_or(content.len());
                    let target = &content[..target_end];
                    validate_name(target.as_bytes()).map_err(|reason| StripError::invalid(position, reason))?;
                    if target.eq_ignore_ascii_case("xml") {
                        return Err(StripError::invalid(position, "reserved processing instruction target"));
                    }
                    validate_xml_chars(content).map_err(|reason| StripError::invalid(position, reason))?;
                }

                Event::Comment(comment) => {
                    let content = as_str(&comment, position)?;
                    validate_xml_chars(content).map_err(|reason| StripError::invalid(position, reason))?;
                }

                Event::Eof => break,
            }
        }

        if state.depth > 0 {
            return Err(StripError::invalid(
                self.base + self.input.len(),
                format!("{} unclosed element(s) at end of input", state.depth),
            ));
        }
        if !state.seen_root {
            return Err(StripError::invalid(self.base + self.input.len(), "no element found"));
        }

        Ok(())
    }

    /// Validate and deliver one run of character data inside the root
    fn character_data<H: ScanHandler>(
        &self,
        raw: &str,
        position: usize,
        entities: &EntityResolver,
        handler: &mut H,
    ) -> Result<()> {
        let folded = if handler.active().text { self.fold(raw) } else { raw.into() };
        let normalized = normalize_line_endings(&folded);
        let decoded = entities
            .decode(&normalized)
            .map_err(|reason| StripError::invalid(position, reason))?;
        validate_xml_chars(&decoded).map_err(|reason| StripError::invalid(position, reason))?;
        if handler.active().text && !decoded.is_empty() {
            handler.text(&decoded);
        }
        Ok(())
    }

    fn fold<'t>(&self, raw: &'t str) -> Cow<'t, str> {
        if self.fold_newlines {
            fold_newlines(raw)
        } else {
            raw.into()
        }
    }
}

/// Start tag, or the first half of a self-closing tag
fn open_element<H: ScanHandler>(
    start: &BytesStart<'_>,
    position: usize,
    state: &mut ScanState,
    handler: &mut H,
) -> Result<()> {
    if state.seen_root && state.depth == 0 {
        return Err(StripError::invalid(position, "junk after document element"));
    }
    validate_start(start, position, &state.entities)?;
    state.seen_root = true;
    state.depth += 1;
    if handler.active().start_element {
        handler.start_element(start.name().as_ref());
    }
    Ok(())
}

/// End tag, or the second half of a self-closing tag
fn close_element<H: ScanHandler>(
    name: &[u8],
    position: usize,
    state: &mut ScanState,
    handler: &mut H,
) -> Result<()> {
    state.depth = state
        .depth
        .checked_sub(1)
        .ok_or_else(|| StripError::invalid(position, "end tag without matching start tag"))?;
    if handler.active().end_element {
        handler.end_element(name);
    }
    Ok(())
}

/// Check a start tag's name and attributes
///
/// Attribute values are decoded only to prove they are well-formed; the
/// decoded value is dropped.
fn validate_start(start: &BytesStart<'_>, position: usize, entities: &EntityResolver) -> Result<()> {
    let name = start.name();
    validate_name(name.as_ref()).map_err(|reason| StripError::invalid(position, reason))?;

    for attr in start.attributes() {
        let attr = attr.map_err(|e| StripError::invalid(position, e.to_string()))?;
        validate_name(attr.key.as_ref()).map_err(|reason| StripError::invalid(position, reason))?;

        let raw = as_str(&attr.value, position)?;
        if memchr(b'<', raw.as_bytes()).is_some() {
            return Err(StripError::invalid(position, "'<' in attribute value"));
        }
        let value = entities
            .decode_attribute(raw)
            .map_err(|reason| StripError::invalid(position, reason))?;
        validate_xml_chars(&value).map_err(|reason| StripError::invalid(position, reason))?;
    }
    Ok(())
}

/// Check if a byte is a valid XML NameStartChar
///
/// Non-ASCII bytes (>= 0x80) are allowed as they may be UTF-8 encoded
/// Unicode letters.
#[inline]
pub fn is_name_start_char(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b':' || c >= 0x80
}

/// Check if a byte is a valid XML NameChar
#[inline]
pub fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.' || c == b'-' || c == b'_' || c == b':' || c >= 0x80
}

/// Validate an element name
pub fn validate_name(name: &[u8]) -> std::result::Result<(), &'static str> {
    match name.split_first() {
        None => Err("empty element name"),
        Some((&first, _)) if !is_name_start_char(first) => Err("invalid name start character"),
        Some((_, rest)) if !rest.iter().all(|&c| is_name_char(c)) => Err("invalid character in name"),
        Some(_) => Ok(()),
    }
}

fn as_str(bytes: &[u8], position: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| StripError::invalid(position, "invalid UTF-8 byte sequence"))
}
