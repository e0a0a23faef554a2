//! Parallel stripping of many documents
//!
//! Uses rayon's work-stealing pool. Every document gets its own scanner and
//! output buffer; nothing is shared between in-flight documents, so one
//! malformed document only fails its own slot.

use rayon::prelude::*;

use crate::error::Result;
use crate::strip::{StripOptions, TagStripper};

/// Strip a batch of documents in parallel
///
/// Results are returned in input order.
pub fn strip_tags_batch<D>(documents: &[D], options: &StripOptions) -> Vec<Result<String>>
where
    D: AsRef<[u8]> + Sync,
{
    let stripper = TagStripper::with_options(*options);

    let results: Vec<Result<String>> = documents
        .par_iter()
        .map(|doc| stripper.strip(doc.as_ref()))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::debug!(documents = documents.len(), failed, "stripped batch");

    results
}
