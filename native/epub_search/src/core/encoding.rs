//! Input Encoding Gate
//!
//! Detects the encoding of an XHTML document from its byte order mark or
//! initial bytes. Only UTF-8 is accepted; a UTF-8 BOM is removed before
//! scanning so that it never reaches the tokenizer.

use crate::error::{Result, StripError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encoding detected from the first bytes of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return XmlEncoding::Utf8;
        }

        match (input[0], input[1]) {
            (0xFF, 0xFE) => XmlEncoding::Utf16Le,
            (0xFE, 0xFF) => XmlEncoding::Utf16Be,
            // No BOM: '<' next to a NUL byte
            (0x00, b'<') => XmlEncoding::Utf16Be,
            (b'<', 0x00) => XmlEncoding::Utf16Le,
            _ => XmlEncoding::Utf8,
        }
    }
}

/// Validate the input as UTF-8 and return it without a leading BOM
pub fn decode_input(input: &[u8]) -> Result<&str> {
    match XmlEncoding::detect(input) {
        XmlEncoding::Utf8 => {}
        other => {
            return Err(StripError::invalid(
                0,
                format!("unsupported document encoding {:?}", other),
            ))
        }
    }

    let body = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let offset = input.len() - body.len();

    std::str::from_utf8(body).map_err(|e| {
        StripError::invalid(offset + e.valid_up_to(), "invalid UTF-8 byte sequence")
    })
}
