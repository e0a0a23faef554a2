//! Core XML scanning primitives
//!
//! This module contains the building blocks the extractor runs on:
//! - Encoding: BOM handling and UTF-8 validation of the input
//! - Dtd: DOCTYPE parsing for entity declarations
//! - Entities: entity reference decoding for character data and attributes
//! - Text: line-ending normalization, newline folding and `Char` checks
//! - Scanner: ScanHandler-based well-formedness scanner over quick-xml

pub mod dtd;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod text;
