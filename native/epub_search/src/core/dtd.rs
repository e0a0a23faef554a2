//! DOCTYPE Declaration Reader
//!
//! Extracts the two things entity resolution needs from a DOCTYPE:
//! - whether it names an external subset (`SYSTEM` / `PUBLIC`) or uses
//!   parameter entity references, either of which means undeclared entity
//!   references can't be proven wrong and are skipped
//! - the general entities declared in the internal subset
//!
//! The external subset is never loaded. Element, attribute-list and
//! notation declarations are ignored.

use memchr::memchr3;
use quick_xml::escape::unescape_with;
use std::collections::HashMap;

use super::entities::predefined_entity;
use super::scanner::{is_name_char, is_name_start_char};

/// What a DOCTYPE contributes to entity resolution
#[derive(Debug, Default)]
pub struct DocTypeDecl {
    /// External ID present or parameter entities referenced
    pub has_external_subset: bool,
    /// General entities: name -> replacement text (None for external entities)
    pub entities: HashMap<String, Option<String>>,
}

/// Parse the content of a `<!DOCTYPE ...>` (everything after the keyword,
/// leading whitespace optional)
pub fn parse_doctype(content: &str) -> Result<DocTypeDecl, &'static str> {
    let mut cursor = Cursor::new(content);
    let mut decl = DocTypeDecl::default();

    cursor.skip_whitespace();
    cursor.name().ok_or("missing DOCTYPE name")?;
    cursor.skip_whitespace();

    if cursor.eat("SYSTEM") {
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing system literal")?;
        decl.has_external_subset = true;
    } else if cursor.eat("PUBLIC") {
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing public identifier")?;
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing system literal")?;
        decl.has_external_subset = true;
    }
    cursor.skip_whitespace();

    if cursor.eat("[") {
        parse_internal_subset(&mut cursor, &mut decl)?;
        cursor.skip_whitespace();
    }

    if !cursor.rest().is_empty() {
        return Err("unexpected content in DOCTYPE");
    }
    Ok(decl)
}

fn parse_internal_subset(cursor: &mut Cursor<'_>, decl: &mut DocTypeDecl) -> Result<(), &'static str> {
    loop {
        cursor.skip_whitespace();
        if cursor.eat("]") {
            return Ok(());
        }
        if cursor.eat("%") {
            cursor.name().ok_or("invalid parameter entity reference")?;
            if !cursor.eat(";") {
                return Err("unterminated parameter entity reference");
            }
            decl.has_external_subset = true;
        } else if cursor.eat("<!ENTITY") {
            cursor.require_whitespace()?;
            parse_entity_decl(cursor, decl)?;
        } else if cursor.eat("<!--") {
            cursor.skip_past("-->").ok_or("unterminated comment in DOCTYPE")?;
        } else if cursor.eat("<?") {
            cursor.skip_past("?>").ok_or("unterminated processing instruction in DOCTYPE")?;
        } else if cursor.eat("<!") {
            cursor.skip_markup_decl().ok_or("unterminated markup declaration")?;
        } else {
            return Err("invalid content in internal subset");
        }
    }
}

fn parse_entity_decl(cursor: &mut Cursor<'_>, decl: &mut DocTypeDecl) -> Result<(), &'static str> {
    let parameter = cursor.eat("%");
    if parameter {
        cursor.require_whitespace()?;
    }
    let name = cursor.name().ok_or("invalid entity name")?.to_string();
    cursor.require_whitespace()?;

    let value = if let Some(literal) = cursor.quoted() {
        Some(expand_entity_value(literal))
    } else if cursor.eat("SYSTEM") {
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing system literal")?;
        None
    } else if cursor.eat("PUBLIC") {
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing public identifier")?;
        cursor.require_whitespace()?;
        cursor.quoted().ok_or("missing system literal")?;
        None
    } else {
        return Err("invalid entity value");
    };

    cursor.skip_whitespace();
    if !cursor.eat(">") {
        // NDATA or garbage; unparsed entities can't be referenced from text anyway
        cursor.skip_past(">").ok_or("unterminated entity declaration")?;
    }

    // The first declaration of an entity is binding
    if !parameter {
        decl.entities.entry(name).or_insert(value);
    }
    Ok(())
}

/// Character references and predefined entities in a literal entity value
/// are expanded once; anything else is kept as written.
fn expand_entity_value(literal: &str) -> String {
    unescape_with(literal, predefined_entity)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| literal.to_string())
}

/// Byte cursor over the DOCTYPE content
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Returns true if any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r') {
            self.pos += 1;
        }
        self.pos > start
    }

    fn require_whitespace(&mut self) -> Result<(), &'static str> {
        if self.skip_whitespace() {
            Ok(())
        } else {
            Err("missing whitespace in DOCTYPE")
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn name(&mut self) -> Option<&'a str> {
        let bytes = self.rest().as_bytes();
        match bytes.first() {
            Some(&b) if is_name_start_char(b) => {}
            _ => return None,
        }
        let len = bytes.iter().take_while(|&&b| is_name_char(b)).count();
        let name = &self.rest()[..len];
        self.pos += len;
        Some(name)
    }

    /// A `"..."` or `'...'` literal, without the quotes
    fn quoted(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let quote = match rest.as_bytes().first() {
            Some(&q) if q == b'"' || q == b'\'' => q as char,
            _ => return None,
        };
        let end = rest[1..].find(quote)?;
        self.pos += end + 2;
        Some(&rest[1..end + 1])
    }

    fn skip_past(&mut self, terminator: &str) -> Option<()> {
        let offset = self.rest().find(terminator)?;
        self.pos += offset + terminator.len();
        Some(())
    }

    /// Skip an `<!ELEMENT`, `<!ATTLIST` or `<!NOTATION` declaration,
    /// honouring quoted literals
    fn skip_markup_decl(&mut self) -> Option<()> {
        loop {
            let offset = memchr3(b'>', b'"', b'\'', self.rest().as_bytes())?;
            self.pos += offset;
            if self.eat(">") {
                return Some(());
            }
            self.quoted()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html5_doctype() {
        let decl = parse_doctype("html").unwrap();
        assert!(!decl.has_external_subset);
        assert!(decl.entities.is_empty());
    }

    #[test]
    fn test_public_doctype() {
        let decl = parse_doctype(
            " html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\"",
        )
        .unwrap();
        assert!(decl.has_external_subset);
    }

    #[test]
    fn test_system_doctype() {
        assert!(parse_doctype(" html SYSTEM 'about:legacy-compat'").unwrap().has_external_subset);
    }

    #[test]
    fn test_internal_entities() {
        let decl = parse_doctype(
            " html [\n  <!ENTITY foo \"bar\">\n  <!ENTITY copy '&#169; &amp; co'>\n  <!ENTITY foo \"ignored\">\n]",
        )
        .unwrap();
        assert!(!decl.has_external_subset);
        assert_eq!(decl.entities["foo"].as_deref(), Some("bar"));
        assert_eq!(decl.entities["copy"].as_deref(), Some("\u{a9} & co"));
    }

    #[test]
    fn test_external_and_parameter_entities() {
        let decl = parse_doctype(
            " html [<!ENTITY chap SYSTEM \"chap.xml\"><!ENTITY % ext SYSTEM \"x.ent\"> %ext;]",
        )
        .unwrap();
        assert_eq!(decl.entities["chap"], None);
        assert!(!decl.entities.contains_key("ext"));
        assert!(decl.has_external_subset);
    }

    #[test]
    fn test_other_declarations_skipped() {
        let decl = parse_doctype(
            " a [<!ELEMENT a (#PCDATA)><!ATTLIST a t CDATA \"x>y\"><!-- c --><?pi x?><!ENTITY e \"v\">]",
        )
        .unwrap();
        assert_eq!(decl.entities["e"].as_deref(), Some("v"));
    }

    #[test]
    fn test_malformed_doctypes() {
        assert!(parse_doctype("").is_err());
        assert!(parse_doctype(" html PUBLIC").is_err());
        assert!(parse_doctype(" html [<!ENTITY foo>]").is_err());
        assert!(parse_doctype(" html [junk]").is_err());
    }
}
