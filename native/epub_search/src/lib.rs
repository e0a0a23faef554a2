//! epub_search - Native XHTML tag stripping for e-book search
//!
//! Turns XHTML chapter documents into plain text for indexing: markup is
//! removed, only the text of `body` is kept, and block elements end with a
//! newline so paragraph structure survives.
//!
//! Entry points:
//! - [`strip_tags`]: one document, default options
//! - [`strip_tags_with`] / [`TagStripper`]: one document, explicit options
//! - [`strip_tags_batch`]: many documents in parallel
//!
//! The same operations are exported as NIFs to `EpubSearch.Native`.

use rustler::{Binary, Env, NifResult, Term};

pub mod batch;
pub mod core;
pub mod error;
pub mod strip;
mod term;

pub use batch::strip_tags_batch;
pub use error::{Result, StripError};
pub use strip::{strip_tags, strip_tags_with, StripOptions, TagStripper};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// NIFs
// ============================================================================

/// Strip tags from one XHTML document
/// Returns {:ok, text} or {:error, :invalid_markup | :out_of_memory}
#[rustler::nif(name = "strip_tags", schedule = "DirtyCpu")]
fn nif_strip_tags<'a>(env: Env<'a>, input: Binary<'a>, fold_newlines: bool) -> NifResult<Term<'a>> {
    let options = StripOptions::new().fold_newlines(fold_newlines);
    let result = strip_tags_with(input.as_slice(), &options);
    Ok(term::result_to_term(env, &result))
}

/// Strip tags from a list of XHTML documents in parallel
/// Returns a list of result tuples in input order
#[rustler::nif(name = "strip_tags_batch", schedule = "DirtyCpu")]
fn nif_strip_tags_batch<'a>(
    env: Env<'a>,
    inputs: Vec<Binary<'a>>,
    fold_newlines: bool,
) -> NifResult<Term<'a>> {
    let options = StripOptions::new().fold_newlines(fold_newlines);
    let documents: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = strip_tags_batch(&documents, &options);
    Ok(term::results_to_term(env, &results))
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.EpubSearch.Native");
