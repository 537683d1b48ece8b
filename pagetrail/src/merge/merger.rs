//! Merge orchestration.
//!
//! [`Merger`] loads every input of a [`MergeRequest`] through the session,
//! appends each one to the first in list order and serializes the result.
//! The first failure aborts the merge; every document loaded so far is
//! dropped before the error is returned.

use std::pin::pin;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::task;
use tracing::{debug, info, instrument};

use crate::config::{CompressionLevel, Config};
use crate::error::{PageTrailError, Result};
use crate::io::DocumentReader;
use crate::merge::document::PdfDocument;
use crate::merge::request::{MergeOutput, MergeRequest, MergeStatistics};
use crate::session::Session;

/// Concatenates documents in list order.
#[derive(Debug, Clone)]
pub struct Merger {
    reader: DocumentReader,
    compression: CompressionLevel,
    jobs: usize,
}

impl Merger {
    /// Create a merger with standard compression and one load worker per core.
    pub fn new() -> Self {
        Self {
            reader: DocumentReader::new(),
            compression: CompressionLevel::default(),
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// Create a merger from CLI configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_compression(config.compression)
            .with_jobs(config.effective_jobs())
    }

    /// Set the output compression level.
    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Set how many inputs may load concurrently.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Merge the inputs of `request` into one PDF.
    ///
    /// Output pages are input 1's pages in order, then input 2's, and so on.
    ///
    /// # Errors
    ///
    /// - [`PageTrailError::InsufficientInputs`] for fewer than two inputs;
    ///   nothing is loaded in that case
    /// - [`PageTrailError::Load`] / [`PageTrailError::Insert`] naming the
    ///   1-based index of the first input that failed
    /// - [`PageTrailError::Serialize`] when the output cannot be written
    /// - [`PageTrailError::SessionClosed`] when the session was disposed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pagetrail::merge::{Merger, MergeRequest};
    /// # use pagetrail::session::Session;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::in_memory();
    /// let request = MergeRequest::from_paths(&["a.pdf", "b.pdf"], "merged")?;
    /// let output = Merger::new().merge(&session, &request).await?;
    /// println!("{} pages -> {}", output.total_pages, output.file_name);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all, fields(inputs = request.order().len(), output = request.output_name()))]
    pub async fn merge(&self, session: &Session, request: &MergeRequest) -> Result<MergeOutput> {
        let merge_start = Instant::now();
        let count = request.order().len();

        if count < 2 {
            return Err(PageTrailError::InsufficientInputs { count });
        }
        session.ensure_open()?;

        let mut destination: Option<PdfDocument> = None;
        let mut page_counts = Vec::with_capacity(count);
        let mut input_size = 0u64;
        let mut load_time = Duration::ZERO;

        let mut loads = pin!(self.reader.load_ordered(session, request.order(), self.jobs));
        while let Some(loaded) = loads.next().await {
            let loaded = loaded?;
            input_size += loaded.byte_size;
            load_time += loaded.load_time;
            page_counts.push(loaded.document.page_count());

            if let Some(merged) = destination.as_mut() {
                merged
                    .append(&loaded.document)
                    .map_err(|e| PageTrailError::insert(loaded.index, e))?;
                debug!(
                    index = loaded.index,
                    pages = merged.page_count(),
                    "input appended"
                );
            } else {
                destination = Some(loaded.document);
            }
        }

        let merged = destination.ok_or(PageTrailError::InsufficientInputs { count: 0 })?;
        let total_pages = merged.page_count();
        debug_assert_eq!(total_pages, page_counts.iter().sum::<usize>());

        let compression = self.compression;
        let bytes = task::spawn_blocking(move || {
            let mut merged = merged;
            merged.serialize(compression)
        })
        .await
        .map_err(|e| PageTrailError::serialize(format!("serialization task failed: {e}")))?
        .map_err(|e| PageTrailError::serialize(e.to_string()))?;

        let statistics = MergeStatistics {
            files_merged: count,
            total_pages,
            input_size,
            output_size: bytes.len() as u64,
            load_time,
            merge_time: merge_start.elapsed(),
            compressed: compression != CompressionLevel::None,
        };
        info!(
            files = count,
            pages = total_pages,
            output_size = statistics.output_size,
            merge_time = ?statistics.merge_time,
            "merge complete"
        );

        Ok(MergeOutput {
            bytes,
            total_pages,
            file_name: request.output_name().to_string(),
            page_counts,
            statistics,
        })
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}
