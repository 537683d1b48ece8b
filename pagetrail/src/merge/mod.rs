//! PDF merging operations.
//!
//! This module provides the document merge engine:
//! - [`PdfDocument`]: page count, page insertion, serialization
//! - [`Merger`]: ordered, fail-fast concatenation of many inputs
//! - [`MergeRequest`] / [`MergeOutput`]: what goes in and what comes out
//!
//! # Examples
//!
//! ```no_run
//! use pagetrail::io::DocumentRef;
//! use pagetrail::merge::merge_documents;
//! use pagetrail::session::Session;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::in_memory();
//! let order = vec![DocumentRef::path("a.pdf"), DocumentRef::path("b.pdf")];
//! let output = merge_documents(&session, order, "merged").await?;
//! std::fs::write(&output.file_name, &output.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod merger;
pub(crate) mod pages;
pub mod request;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::PdfDocument;
pub use merger::Merger;
pub use request::{MergeOutput, MergeRequest, MergeStatistics, normalize_output_name};

use crate::error::Result;
use crate::io::DocumentRef;
use crate::session::Session;

/// Merge `order` into one PDF named after `output_name`.
///
/// Convenience function that builds a [`MergeRequest`] and runs a default
/// [`Merger`].
///
/// # Errors
///
/// Returns an error if the name is blank or any merge step fails.
pub async fn merge_documents(
    session: &Session,
    order: Vec<DocumentRef>,
    output_name: &str,
) -> Result<MergeOutput> {
    let request = MergeRequest::new(order, output_name)?;
    Merger::new().merge(session, &request).await
}
