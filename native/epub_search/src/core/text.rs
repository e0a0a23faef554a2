//! Character data helpers
//!
//! SIMD-accelerated (memchr) passes over character data before it reaches
//! the output buffer.

use memchr::{memchr, memchr_iter, memmem};
use std::borrow::Cow;

/// Normalize line endings: `\r\n` and lone `\r` become `\n`
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr(b'\r', bytes) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);

    let mut pos = first;
    while pos < bytes.len() {
        match memchr(b'\r', &bytes[pos..]) {
            Some(offset) => {
                let cr = pos + offset;
                out.push_str(&text[pos..cr]);
                out.push('\n');
                pos = if bytes.get(cr + 1) == Some(&b'\n') { cr + 2 } else { cr + 1 };
            }
            None => {
                out.push_str(&text[pos..]);
                break;
            }
        }
    }

    Cow::Owned(out)
}

/// Replace every `\n` with a space
pub fn fold_newlines(text: &str) -> Cow<'_, str> {
    if memchr(b'\n', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\n', " "))
}

/// Reject characters outside the XML `Char` production: C0 controls other
/// than tab, LF and CR, and the noncharacters U+FFFE / U+FFFF.
/// Surrogates can't occur in a `&str`.
pub fn validate_xml_chars(text: &str) -> Result<(), &'static str> {
    let bytes = text.as_bytes();
    if bytes.iter().any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) {
        return Err("invalid control character");
    }
    // U+FFFE and U+FFFF encode as EF BF BE and EF BF BF
    let nonchar = memchr_iter(0xEF, bytes)
        .any(|i| bytes.get(i + 1) == Some(&0xBF) && matches!(bytes.get(i + 2), Some(0xBE | 0xBF)));
    if nonchar {
        return Err("invalid character U+FFFE or U+FFFF");
    }
    Ok(())
}

/// Check whether character data contains the CDATA terminator `]]>`
#[inline]
pub fn contains_cdata_end(text: &str) -> bool {
    memmem::find(text.as_bytes(), b"]]>").is_some()
}

/// Check whether text consists only of XML whitespace
#[inline]
pub fn is_xml_whitespace(text: &[u8]) -> bool {
    text.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_no_cr_borrowed() {
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed("a\nb")));
    }

    #[test]
    fn test_normalize_crlf_and_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\r"), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("\r\r\n"), "\n\n");
    }

    #[test]
    fn test_fold_newlines() {
        assert_eq!(fold_newlines("one\ntwo\n"), "one two ");
        assert!(matches!(fold_newlines("flat"), Cow::Borrowed("flat")));
    }

    #[test]
    fn test_xml_chars() {
        assert!(validate_xml_chars("tab\there\r\n\u{7F} \u{E9}\u{10000}\u{FFFD}").is_ok());
        assert!(validate_xml_chars("a\u{1}b").is_err());
        assert!(validate_xml_chars("\u{0}").is_err());
        assert!(validate_xml_chars("x\u{FFFE}").is_err());
        assert!(validate_xml_chars("\u{FFFF}").is_err());
    }

    #[test]
    fn test_cdata_end() {
        assert!(contains_cdata_end("a ]]> b"));
        assert!(!contains_cdata_end("a ]] > b ]>"));
    }

    #[test]
    fn test_whitespace() {
        assert!(is_xml_whitespace(b" \t\r\n"));
        assert!(is_xml_whitespace(b""));
        assert!(!is_xml_whitespace(b" x "));
    }
}
