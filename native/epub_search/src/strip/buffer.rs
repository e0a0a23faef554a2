//! Pre-sized text accumulator
//!
//! The extracted text is the document's decoded character data plus one
//! `\n` per block end tag. Markup, references and block end tags all shrink
//! on the way out, so the input's length is enough for almost every
//! document; only entities declared in an internal DTD subset can expand
//! past it, in which case the buffer grows.

use crate::error::Result;

/// Output buffer for one extraction
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    /// Allocate room for `capacity` bytes up front
    ///
    /// Allocation failure is returned rather than aborting.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut text = String::new();
        text.try_reserve_exact(capacity)?;
        Ok(TextBuffer { text })
    }

    #[inline]
    pub fn push_str(&mut self, data: &str) {
        self.text.push_str(data);
    }

    #[inline]
    pub fn push_newline(&mut self) {
        self.text.push('\n');
    }

    /// Release the unused capacity and return the text
    pub fn finish(mut self) -> String {
        self.text.shrink_to_fit();
        self.text
    }
}
