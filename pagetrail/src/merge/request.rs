//! Merge inputs and outputs.

use std::path::Path;
use std::time::Duration;

use crate::error::{PageTrailError, Result};
use crate::io::DocumentRef;
use crate::utils::format_file_size;

/// Trim `name` and make sure it ends in `.pdf` (checked case-insensitively).
pub fn normalize_output_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.to_ascii_lowercase().ends_with(".pdf") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.pdf")
    }
}

/// Ordered inputs plus the name for the merged file.
///
/// List order is output page order.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    order: Vec<DocumentRef>,
    output_name: String,
}

impl MergeRequest {
    /// Build a request. The output name is normalized with
    /// [`normalize_output_name`].
    ///
    /// # Errors
    ///
    /// Returns [`PageTrailError::InvalidConfig`] when the name is blank.
    /// The input count is checked at merge time, not here.
    pub fn new(order: Vec<DocumentRef>, output_name: &str) -> Result<Self> {
        if output_name.trim().is_empty() {
            return Err(PageTrailError::invalid_config(
                "Output file name cannot be empty",
            ));
        }
        Ok(Self {
            order,
            output_name: normalize_output_name(output_name),
        })
    }

    /// Request over filesystem paths.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], output_name: &str) -> Result<Self> {
        Self::new(paths.iter().map(DocumentRef::path).collect(), output_name)
    }

    /// Inputs in merge order.
    pub fn order(&self) -> &[DocumentRef] {
        &self.order
    }

    /// Normalized output file name.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

/// Statistics about a merge operation.
#[derive(Debug, Clone, Default)]
pub struct MergeStatistics {
    /// Number of inputs merged.
    pub files_merged: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Total size of the input bytes.
    pub input_size: u64,

    /// Size of the serialized output.
    pub output_size: u64,

    /// Time spent loading inputs.
    pub load_time: Duration,

    /// Wall time of the whole merge.
    pub merge_time: Duration,

    /// Whether stream compression was applied.
    pub compressed: bool,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// A successful merge.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// Serialized PDF.
    pub bytes: Vec<u8>,

    /// Page count of the output, equal to the sum of `page_counts`.
    pub total_pages: usize,

    /// Suggested file name, always ending in `.pdf`.
    pub file_name: String,

    /// Page count of every input, in merge order.
    pub page_counts: Vec<usize>,

    /// Timing and size figures.
    pub statistics: MergeStatistics,
}
