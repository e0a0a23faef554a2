//! Error types for tag stripping

use std::collections::TryReserveError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, StripError>;

/// Failure of a single strip call
///
/// Every kind of malformed input collapses into `InvalidMarkup`; the
/// position and reason are informational only.
#[derive(Debug, Error)]
pub enum StripError {
    /// The input is not well-formed XML
    #[error("invalid XHTML at byte {position}: {reason}")]
    InvalidMarkup { position: usize, reason: String },

    /// The output buffer could not be allocated
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

impl StripError {
    pub(crate) fn invalid(position: usize, reason: impl Into<String>) -> Self {
        StripError::InvalidMarkup {
            position,
            reason: reason.into(),
        }
    }

    /// True for `InvalidMarkup`
    pub fn is_invalid_markup(&self) -> bool {
        matches!(self, StripError::InvalidMarkup { .. })
    }
}
