//! pagetrail - Merge PDF files and keep an audit trail of document review.
//!
//! The library has two independent halves that share a [`Session`]:
//!
//! - A document merge engine that concatenates an ordered list of PDFs into
//!   one document, failing fast with the 1-based index of the first bad input
//! - An audit trail that durably records viewer interaction events and
//!   reads them back newest first
//!
//! # Examples
//!
//! ## Merge
//!
//! ```no_run
//! use pagetrail::io::DocumentRef;
//! use pagetrail::merge::{MergeRequest, Merger};
//! use pagetrail::session::Session;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::in_memory();
//! let request = MergeRequest::new(
//!     vec![DocumentRef::path("a.pdf"), DocumentRef::path("b.pdf")],
//!     "combined",
//! )?;
//!
//! let output = Merger::new().merge(&session, &request).await?;
//! println!("{} pages in {}", output.total_pages, output.file_name);
//! session.dispose();
//! # Ok(())
//! # }
//! ```
//!
//! ## Capture viewer events
//!
//! ```no_run
//! use std::sync::Arc;
//! use pagetrail::audit::{CapabilitySet, EventCapture, EventHub, ViewerEvent};
//! use pagetrail::config::AuditConfig;
//! use pagetrail::session::Session;
//!
//! # fn example() -> pagetrail::Result<()> {
//! let session = Session::open(&AuditConfig::resolve(None))?;
//! let renderer = EventHub::new(CapabilitySet::all());
//! let capture = Arc::new(EventCapture::new(&session, CapabilitySet::all())?);
//! capture.attach(&renderer);
//!
//! renderer.emit(&ViewerEvent::PageChanged { page: 2 });
//! for event in session.audit_events()? {
//!     println!("{} {}", event.page(), event.kind().label());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::{AuditConfig, Config};
pub use error::{DocumentError, PageTrailError, Result};
pub use session::Session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
