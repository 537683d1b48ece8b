//! Document loading.
//!
//! [`DocumentReader`] turns [`DocumentRef`]s into [`PdfDocument`]s:
//! - bytes come from the session's [`DocumentSource`](crate::io::DocumentSource)
//!   (or straight from memory for [`DocumentLocation::Bytes`])
//! - parsing runs on the blocking pool so the async caller stays responsive
//! - batches load with bounded concurrency but are yielded in list order
//!
//! # Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use pagetrail::io::{DocumentReader, DocumentRef};
//! use pagetrail::session::Session;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::in_memory();
//! let refs = vec![DocumentRef::path("a.pdf"), DocumentRef::path("b.pdf")];
//! let reader = DocumentReader::new();
//!
//! let mut loads = std::pin::pin!(reader.load_ordered(&session, &refs, 4));
//! while let Some(loaded) = loads.next().await {
//!     let loaded = loaded?;
//!     println!("#{}: {} pages", loaded.index, loaded.document.page_count());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, instrument};

use crate::error::{DocumentError, PageTrailError, Result};
use crate::io::source::{DocumentLocation, DocumentRef};
use crate::merge::document::{PdfDocument, parse_pdf};
use crate::session::Session;

/// A loaded document with load metadata.
#[derive(Debug)]
pub struct LoadedDocument {
    /// 1-based position of the input in its batch.
    pub index: usize,

    /// The parsed document.
    pub document: PdfDocument,

    /// Size of the raw input in bytes.
    pub byte_size: u64,

    /// Time taken to fetch and parse.
    pub load_time: Duration,
}

/// Loads documents through a [`Session`].
///
/// Documents without pages load like any other.
#[derive(Debug, Clone, Default)]
pub struct DocumentReader;

impl DocumentReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Load one document.
    ///
    /// `index` is the 1-based position reported in errors.
    ///
    /// # Errors
    ///
    /// Returns [`PageTrailError::Load`] when the format is unsupported, the
    /// source cannot produce bytes, or the bytes do not parse. Returns
    /// [`PageTrailError::SessionClosed`] when the session was disposed.
    #[instrument(skip(self, session, doc_ref), fields(name = %doc_ref.name()))]
    pub async fn load(
        &self,
        session: &Session,
        index: usize,
        doc_ref: &DocumentRef,
    ) -> Result<LoadedDocument> {
        let start = Instant::now();

        if !doc_ref.format().is_supported() {
            return Err(PageTrailError::load(
                index,
                DocumentError::UnsupportedFormat(doc_ref.format().to_string()),
            ));
        }

        let bytes: Arc<[u8]> = match doc_ref.location() {
            DocumentLocation::Bytes(data) => Arc::clone(data),
            location => session
                .source()?
                .fetch(location)
                .await
                .map_err(|e| PageTrailError::load(index, DocumentError::Io(e.to_string())))?
                .into(),
        };
        let byte_size = bytes.len() as u64;

        let document = tokio::task::spawn_blocking(move || parse_pdf(&bytes))
            .await
            .map_err(|e| {
                PageTrailError::load(index, DocumentError::Malformed(format!("parser aborted: {e}")))
            })?
            .map_err(|e| PageTrailError::load(index, e))?;

        // The session may have been disposed while we were parsing.
        session.ensure_open()?;
        let document =
            PdfDocument::from_parts(doc_ref.name().to_string(), document, session.lease());

        let load_time = start.elapsed();
        debug!(
            index,
            pages = document.page_count(),
            byte_size,
            ?load_time,
            "document loaded"
        );

        Ok(LoadedDocument {
            index,
            document,
            byte_size,
            load_time,
        })
    }

    /// Load `refs` with at most `workers` loads in flight.
    ///
    /// Results are yielded in list order regardless of which load finishes
    /// first. Dropping the stream cancels the loads still pending and
    /// releases every document not yet yielded.
    pub fn load_ordered<'a>(
        &'a self,
        session: &'a Session,
        refs: &'a [DocumentRef],
        workers: usize,
    ) -> impl Stream<Item = Result<LoadedDocument>> + 'a {
        stream::iter(refs.iter().enumerate())
            .map(move |(i, doc_ref)| self.load(session, i + 1, doc_ref))
            .buffered(workers.max(1))
    }
}
