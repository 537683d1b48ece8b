//! Paginated document abstraction.
//!
//! [`PdfDocument`] wraps a parsed `lopdf` document and exposes the three
//! operations the merge engine needs: page count, ordered page insertion at
//! a 1-based destination index, and serialization back to bytes.

use std::collections::BTreeSet;
use std::fmt;

use lopdf::{Document, Object, ObjectId};

use crate::config::CompressionLevel;
use crate::error::DocumentError;
use crate::merge::pages;
use crate::session::{DocumentLease, Session};
use crate::utils::copy_references;

/// A loaded, mutable PDF.
///
/// Counts against its [`Session`] until dropped.
pub struct PdfDocument {
    name: String,
    document: Document,
    _lease: DocumentLease,
}

impl PdfDocument {
    /// Parse `bytes` into a document owned by `session`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Malformed`] for unparseable input and
    /// [`DocumentError::Encrypted`] for password-protected files.
    pub fn from_bytes(
        session: &Session,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, DocumentError> {
        let document = parse_pdf(bytes)?;
        Ok(Self::from_parts(name.into(), document, session.lease()))
    }

    pub(crate) fn from_parts(name: String, document: Document, lease: DocumentLease) -> Self {
        Self {
            name,
            document,
            _lease: lease,
        }
    }

    /// Name of the input this document was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Underlying `lopdf` document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Insert `pages` (1-based, in the given order) of `source` so that the
    /// first of them becomes page `dest_index` of this document.
    ///
    /// `dest_index` may be at most `page_count() + 1`, which appends.
    /// Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::InvalidDestination`] for an out-of-range insertion point
    /// - [`DocumentError::PageOutOfRange`] for a page the source doesn't have
    /// - [`DocumentError::DuplicatePage`] when a page is listed twice
    /// - [`DocumentError::Structure`] when either page tree is broken
    pub fn insert_pages(
        &mut self,
        source: &PdfDocument,
        pages: &[u32],
        dest_index: u32,
    ) -> Result<(), DocumentError> {
        let at = pages::insertion_point(&self.document, dest_index)?;

        let source_count = source.page_count() as u32;
        let mut seen = BTreeSet::new();
        for &page in pages {
            if page == 0 || page > source_count {
                return Err(DocumentError::PageOutOfRange {
                    page,
                    page_count: source_count,
                });
            }
            if !seen.insert(page) {
                return Err(DocumentError::DuplicatePage(page));
            }
        }

        if pages.is_empty() {
            return Ok(());
        }

        let mut incoming = source.document.clone();
        incoming.renumber_objects_with(self.document.max_id + 1);
        let incoming_pages = incoming.get_pages();

        let mut staged: Vec<(ObjectId, lopdf::Dictionary)> = Vec::with_capacity(pages.len());
        for page in pages {
            let page_id = incoming_pages.get(page).copied().ok_or_else(|| {
                DocumentError::Structure(format!("page {page} vanished while renumbering"))
            })?;
            staged.push((page_id, pages::detached_page(&incoming, page_id)?));
        }

        let page_ids: Vec<ObjectId> = staged.iter().map(|(id, _)| *id).collect();
        for (page_id, page) in &staged {
            self.document
                .objects
                .insert(*page_id, Object::Dictionary(page.clone()));
        }
        for (_, page) in staged {
            copy_references(&mut self.document, &incoming, &Object::Dictionary(page));
        }
        self.document.max_id = self.document.max_id.max(incoming.max_id);

        pages::link_pages(&mut self.document, at, &page_ids)
    }

    /// Append every page of `source` after the current last page.
    pub fn append(&mut self, source: &PdfDocument) -> Result<(), DocumentError> {
        let all_pages: Vec<u32> = (1..=source.page_count() as u32).collect();
        let dest_index = self.page_count() as u32 + 1;
        self.insert_pages(source, &all_pages, dest_index)
    }

    /// Write the current state as a self-contained PDF byte stream.
    pub fn serialize(&mut self, compression: CompressionLevel) -> Result<Vec<u8>, DocumentError> {
        match compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => self.document.compress(),
            CompressionLevel::Maximum => {
                self.document.prune_objects();
                self.document.compress();
            }
        }

        self.document.renumber_objects();

        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("name", &self.name)
            .field("pages", &self.page_count())
            .finish()
    }
}

/// Parse PDF bytes, classifying encryption failures separately.
pub(crate) fn parse_pdf(bytes: &[u8]) -> Result<Document, DocumentError> {
    Document::load_mem(bytes).map_err(|e| {
        let message = e.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("encrypt") || lowered.contains("password") {
            DocumentError::Encrypted
        } else {
            DocumentError::Malformed(message)
        }
    })
}
