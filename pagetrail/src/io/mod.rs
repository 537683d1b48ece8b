//! I/O for pagetrail.
//!
//! This module handles everything that touches bytes outside the PDF model:
//! - Naming inputs ([`DocumentRef`]) and fetching them ([`DocumentSource`])
//! - Loading and parsing inputs with bounded concurrency
//! - Writing merged output atomically

pub mod reader;
pub mod source;
pub mod writer;

pub use reader::{DocumentReader, LoadedDocument};
pub use source::{DocumentFormat, DocumentLocation, DocumentRef, DocumentSource, FsSource};
pub use writer::{PdfWriter, WriteStatistics};
