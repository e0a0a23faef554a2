//! XML Entity Decoding
//!
//! Handles decoding of entity references in character data and
//! attribute values:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - General entities declared in the internal DTD subset
//!
//! The external DTD is never loaded. When a DOCTYPE names an external subset
//! (or the internal subset references parameter entities), an undeclared
//! entity may be declared out there, so the reference is skipped instead of
//! rejected. Otherwise an undeclared entity is an error.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use quick_xml::escape::unescape_with;
use std::borrow::Cow;
use std::collections::HashMap;

use super::dtd::DocTypeDecl;

/// Resolve one of the five predefined XML entities
#[inline]
pub fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

/// Entity resolution policy for one document
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    /// Internal subset declarations; `None` for external entities
    declared: HashMap<String, Option<String>>,
    skip_undeclared: bool,
}

impl EntityResolver {
    /// Resolver for a document without a DOCTYPE
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the entity declarations of the document's DOCTYPE
    pub fn apply_doctype(&mut self, decl: DocTypeDecl) {
        self.declared = decl.entities;
        self.skip_undeclared = decl.has_external_subset;
    }

    /// Resolve a named entity; `Some("")` skips it
    #[inline]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(value) = predefined_entity(name) {
            return Some(value);
        }
        match self.declared.get(name) {
            Some(Some(value)) => Some(value),
            // External entities are not loaded
            Some(None) => Some(""),
            None if self.skip_undeclared => Some(""),
            None => None,
        }
    }

    /// Decode all references in `raw`
    ///
    /// Returns Borrowed if no entities present (zero-copy).
    pub fn decode<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>, String> {
        // Fast path: check if there are any entities using SIMD
        if memchr(b'&', raw.as_bytes()).is_none() {
            return Ok(Cow::Borrowed(raw));
        }
        unescape_with(raw, |name| self.resolve(name)).map_err(|e| e.to_string())
    }

    /// Decode an attribute value
    ///
    /// Unlike character data, an attribute may not reference an external
    /// entity or an entity whose replacement text contains `<`.
    pub fn decode_attribute<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>, String> {
        if memchr(b'&', raw.as_bytes()).is_none() {
            return Ok(Cow::Borrowed(raw));
        }
        let mut forbidden = None;
        let decoded = unescape_with(raw, |name| match self.declared.get(name) {
            Some(None) => {
                forbidden = Some(format!("reference to external entity '{}' in attribute", name));
                None
            }
            Some(Some(value)) if value.contains('<') => {
                forbidden = Some(format!("'<' in replacement text of entity '{}' in attribute", name));
                None
            }
            _ => self.resolve(name),
        });
        decoded.map_err(|e| forbidden.take().unwrap_or_else(|| e.to_string()))
    }
}
