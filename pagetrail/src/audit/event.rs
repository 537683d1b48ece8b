//! Audit event model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PageTrailError;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// The viewer moved to another page.
    PageNavigation,
    /// An annotation was created.
    AnnotationAdded,
    /// An annotation was edited.
    AnnotationModified,
    /// An annotation was removed.
    AnnotationDeleted,
    /// A review comment was created.
    CommentAdded,
    /// A review comment was edited.
    CommentModified,
    /// A document was opened in the viewer.
    DocumentLoaded,
    /// A document was closed.
    DocumentUnloaded,
    /// Zoom level changed.
    ZoomChanged,
    /// Page rotation changed.
    RotationChanged,
    /// A text search ran.
    SearchPerformed,
    /// A bookmark was moved to another page.
    BookmarkMoved,
    /// Pages were reordered.
    PagesMoved,
    /// Several documents were merged into one.
    DocumentMerged,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 14] = [
        Self::PageNavigation,
        Self::AnnotationAdded,
        Self::AnnotationModified,
        Self::AnnotationDeleted,
        Self::CommentAdded,
        Self::CommentModified,
        Self::DocumentLoaded,
        Self::DocumentUnloaded,
        Self::ZoomChanged,
        Self::RotationChanged,
        Self::SearchPerformed,
        Self::BookmarkMoved,
        Self::PagesMoved,
        Self::DocumentMerged,
    ];

    /// Stable identifier, as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageNavigation => "page-navigation",
            Self::AnnotationAdded => "annotation-added",
            Self::AnnotationModified => "annotation-modified",
            Self::AnnotationDeleted => "annotation-deleted",
            Self::CommentAdded => "comment-added",
            Self::CommentModified => "comment-modified",
            Self::DocumentLoaded => "document-loaded",
            Self::DocumentUnloaded => "document-unloaded",
            Self::ZoomChanged => "zoom-changed",
            Self::RotationChanged => "rotation-changed",
            Self::SearchPerformed => "search-performed",
            Self::BookmarkMoved => "bookmark-moved",
            Self::PagesMoved => "pages-moved",
            Self::DocumentMerged => "document-merged",
        }
    }

    /// Short human-readable label for listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::PageNavigation => "Page navigation",
            Self::AnnotationAdded => "Annotation added",
            Self::AnnotationModified => "Annotation modified",
            Self::AnnotationDeleted => "Annotation deleted",
            Self::CommentAdded => "Comment added",
            Self::CommentModified => "Comment modified",
            Self::DocumentLoaded => "Document loaded",
            Self::DocumentUnloaded => "Document unloaded",
            Self::ZoomChanged => "Zoom changed",
            Self::RotationChanged => "Rotation changed",
            Self::SearchPerformed => "Search performed",
            Self::BookmarkMoved => "Bookmark moved",
            Self::PagesMoved => "Pages moved",
            Self::DocumentMerged => "Documents merged",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = PageTrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| PageTrailError::invalid_config(format!("Unknown event kind: {s}")))
    }
}

/// Page an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PageLocator {
    /// A single 1-based page.
    Page(u32),
    /// A move from one page to another.
    Range {
        /// Page the item came from.
        from: u32,
        /// Page the item went to.
        to: u32,
    },
    /// No page applies or the renderer did not say.
    #[default]
    Unknown,
}

impl PageLocator {
    /// Locator for an optional page.
    pub fn from_page(page: Option<u32>) -> Self {
        page.map_or(Self::Unknown, Self::Page).normalized()
    }

    /// Same locator with page `0` folded into [`PageLocator::Unknown`].
    ///
    /// Pages are 1-based; a renderer reporting `0` has no page to point at.
    pub fn normalized(self) -> Self {
        match self {
            Self::Page(0) => Self::Unknown,
            Self::Range { from, to } if from == 0 || to == 0 => Self::Unknown,
            other => other,
        }
    }

    fn is_valid(self) -> bool {
        self.normalized() == self
    }

    /// Parse any rendered locator, including ones carrying page `0`.
    fn parse_rendered(s: &str) -> Result<Self, PageTrailError> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(Self::Unknown);
        }

        let parse_page = |text: &str| {
            text.trim()
                .parse::<u32>()
                .map_err(|_| PageTrailError::invalid_config(format!("Invalid page locator: {s}")))
        };

        match s.split_once('→').or_else(|| s.split_once("->")) {
            Some((from, to)) => Ok(Self::Range {
                from: parse_page(from)?,
                to: parse_page(to)?,
            }),
            None => parse_page(s).map(Self::Page),
        }
    }
}

impl fmt::Display for PageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Range { from, to } => write!(f, "{from}→{to}"),
            Self::Unknown => f.write_str("-"),
        }
    }
}

/// Strict parse for user input: page numbers start at 1.
impl FromStr for PageLocator {
    type Err = PageTrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let locator = Self::parse_rendered(s)?;
        if locator.is_valid() {
            Ok(locator)
        } else {
            Err(PageTrailError::invalid_config(format!(
                "Invalid page locator: {}",
                s.trim()
            )))
        }
    }
}

impl From<PageLocator> for String {
    fn from(locator: PageLocator) -> Self {
        locator.to_string()
    }
}

// Stored logs may predate normalization, so reading is lenient.
impl TryFrom<String> for PageLocator {
    type Error = PageTrailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_rendered(&value).map(Self::normalized)
    }
}

/// An event before the store has numbered and timestamped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEvent {
    pub(crate) kind: EventKind,
    pub(crate) page: PageLocator,
    pub(crate) document: Option<String>,
    pub(crate) detail: String,
}

impl NewAuditEvent {
    /// Event of `kind` with no page and no detail.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            page: PageLocator::Unknown,
            document: None,
            detail: String::new(),
        }
    }

    /// Attach a single page. Page `0` is recorded as unknown.
    pub fn page(self, page: u32) -> Self {
        self.locator(PageLocator::Page(page))
    }

    /// Attach a from/to page pair. A pair containing `0` is recorded as
    /// unknown.
    pub fn range(self, from: u32, to: u32) -> Self {
        self.locator(PageLocator::Range { from, to })
    }

    /// Attach any locator, normalized with [`PageLocator::normalized`].
    pub fn locator(mut self, page: PageLocator) -> Self {
        self.page = page.normalized();
        self
    }

    /// Name the document the event happened in.
    pub fn document(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.document = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Document the event happened in, if known.
    pub fn document_name(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Attach a free-form description.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Kind of event.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// One persisted entry of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    sequence: u64,
    timestamp: DateTime<Utc>,
    page: PageLocator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(rename = "event")]
    kind: EventKind,
    #[serde(default)]
    detail: String,
}

impl AuditEvent {
    pub(crate) fn record(sequence: u64, timestamp: DateTime<Utc>, event: NewAuditEvent) -> Self {
        Self {
            sequence,
            timestamp,
            page: event.page.normalized(),
            document: event.document,
            kind: event.kind,
            detail: event.detail,
        }
    }

    /// Position in the log; strictly increasing across appends.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time the event was appended.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Page the event refers to.
    pub fn page(&self) -> PageLocator {
        self.page
    }

    /// Document the event happened in, if known.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// What happened.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Free-form description.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}
