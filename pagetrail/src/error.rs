//! Error types for pagetrail.
//!
//! This module defines every error that can surface from a merge, a
//! document operation or the audit trail. Merge failures always name the
//! 1-based position of the input that caused them so the caller can point
//! the user at the offending file.
//!
//! # Error Categories
//!
//! - **Merge Errors**: too few inputs, a source that fails to load or insert,
//!   output serialization
//! - **Document Errors**: malformed bytes, bad page indices, broken page trees
//! - **Audit Errors**: persistence failures in the audit log
//! - **Usage Errors**: invalid configuration, existing outputs, closed sessions

use std::io;
use std::path::PathBuf;

/// Result type alias for pagetrail operations.
pub type Result<T> = std::result::Result<T, PageTrailError>;

/// Failure of a single paginated-document operation.
///
/// These errors carry no input position; the merge orchestrator wraps them
/// in [`PageTrailError::Load`] or [`PageTrailError::Insert`] together with
/// the index of the source that produced them.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Raw bytes could not be fetched from the document source.
    #[error("could not read source: {0}")]
    Io(String),

    /// The declared format is not a paginated format we can load.
    #[error("unsupported document format '{0}'")]
    UnsupportedFormat(String),

    /// The bytes are not a parseable PDF.
    #[error("malformed PDF: {0}")]
    Malformed(String),

    /// The document is encrypted and cannot be processed.
    #[error("document is encrypted; decrypt it first (for example with 'qpdf --decrypt')")]
    Encrypted,

    /// Insertion point outside `1..=page_count + 1`.
    #[error("invalid insertion point {dest_index}: destination has {page_count} page(s)")]
    InvalidDestination {
        /// Requested 1-based insertion point.
        dest_index: u32,
        /// Current destination page count.
        page_count: u32,
    },

    /// A requested source page does not exist.
    #[error("page {page} is out of range: source has {page_count} page(s)")]
    PageOutOfRange {
        /// Requested 1-based page number.
        page: u32,
        /// Page count of the source document.
        page_count: u32,
    },

    /// The same source page was requested twice in one insertion.
    #[error("page {0} was requested more than once")]
    DuplicatePage(u32),

    /// The page tree is not shaped the way the PDF specification requires.
    #[error("broken page tree: {0}")]
    Structure(String),

    /// Writing the document to bytes failed.
    #[error("could not serialize document: {0}")]
    Serialize(String),
}

/// Main error type for pagetrail operations.
#[derive(Debug, thiserror::Error)]
pub enum PageTrailError {
    /// A merge needs at least two inputs.
    #[error("Select at least two documents to merge ({count} given)")]
    InsufficientInputs {
        /// Number of inputs that were supplied.
        count: usize,
    },

    /// An input could not be loaded.
    #[error("Failed to load input #{index}: {source}")]
    Load {
        /// 1-based position of the input in the merge order.
        index: usize,
        /// Underlying document failure.
        #[source]
        source: DocumentError,
    },

    /// An input's pages could not be inserted into the output.
    #[error("Failed to insert pages of input #{index}: {source}")]
    Insert {
        /// 1-based position of the input in the merge order.
        index: usize,
        /// Underlying document failure.
        #[source]
        source: DocumentError,
    },

    /// The merged output could not be written to bytes.
    #[error("Failed to serialize merged document: {reason}")]
    Serialize {
        /// Details about the failure.
        reason: String,
    },

    /// The audit log could not be read, written or cleared.
    #[error("Audit log persistence failed: {reason}")]
    Persist {
        /// Details about the failure.
        reason: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output name",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to write the merged output to disk.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The session was disposed before the operation ran.
    #[error("Session has been disposed")]
    SessionClosed,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<serde_json::Error> for PageTrailError {
    fn from(err: serde_json::Error) -> Self {
        Self::persist(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<lopdf::Error> for PageTrailError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(format!("PDF error: {err}"))
    }
}

impl PageTrailError {
    /// Create a Load error for the input at `index` (1-based).
    pub fn load(index: usize, source: DocumentError) -> Self {
        Self::Load { index, source }
    }

    /// Create an Insert error for the input at `index` (1-based).
    pub fn insert(index: usize, source: DocumentError) -> Self {
        Self::Insert { index, source }
    }

    /// Create a Serialize error.
    pub fn serialize(reason: impl Into<String>) -> Self {
        Self::Serialize {
            reason: reason.into(),
        }
    }

    /// Create a Persist error.
    pub fn persist(reason: impl Into<String>) -> Self {
        Self::Persist {
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// 1-based index of the merge input that caused this error, if any.
    pub fn failing_index(&self) -> Option<usize> {
        match self {
            Self::Load { index, .. } | Self::Insert { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Check if this error belongs to the audit trail.
    ///
    /// Audit failures never abort the user action that triggered them.
    pub fn is_audit_failure(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInputs { .. }
                | Self::Load { .. }
                | Self::Insert { .. }
                | Self::Serialize { .. }
                | Self::FailedToWrite { .. }
                | Self::SessionClosed
                | Self::Cancelled
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InsufficientInputs { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Load { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::Insert { .. } => 6,
            Self::Serialize { .. } => 6,
            Self::Persist { .. } => 7,
            Self::SessionClosed => 8,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Other { .. } => 1,
        }
    }
}
