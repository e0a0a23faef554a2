//! Elixir Term Conversion Utilities
//!
//! Converts strip results to Elixir terms.

use rustler::{Encoder, Env, NewBinary, Term};

use crate::error::{Result, StripError};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    invalid_markup,
    out_of_memory,
}

/// Copy bytes into a fresh Elixir binary
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Reason atom for an error
pub fn error_reason(err: &StripError) -> rustler::Atom {
    match err {
        StripError::InvalidMarkup { .. } => invalid_markup(),
        StripError::OutOfMemory(_) => out_of_memory(),
    }
}

/// `{:ok, text}` or `{:error, reason}`
pub fn result_to_term<'a>(env: Env<'a>, result: &Result<String>) -> Term<'a> {
    match result {
        Ok(text) => (ok(), bytes_to_binary(env, text.as_bytes())).encode(env),
        Err(e) => (error(), error_reason(e)).encode(env),
    }
}

/// List of result tuples, in order
pub fn results_to_term<'a>(env: Env<'a>, results: &[Result<String>]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for result in results.iter().rev() {
        list = list.list_prepend(result_to_term(env, result));
    }
    list
}
