//! Durable audit trail of document interactions.
//!
//! - [`AuditEventStore`]: append-only log, read back newest first, cleared atomically
//! - [`KeyValueStore`]: where the log is persisted ([`FileKvStore`] on disk)
//! - [`EventCapture`]: turns renderer [`ViewerEvent`]s into audit events
//! - [`export_events`]: JSON, JSON Lines or CSV dumps of the log
//!
//! # Examples
//!
//! ```no_run
//! use pagetrail::audit::{AuditEventStore, EventKind, FileKvStore, KvAuditStore, NewAuditEvent};
//!
//! # fn example() -> pagetrail::Result<()> {
//! let store = KvAuditStore::new(FileKvStore::open(".pagetrail")?);
//! store.append(NewAuditEvent::new(EventKind::PageNavigation).page(3))?;
//! for event in store.read_all()? {
//!     println!("{} {} {}", event.sequence(), event.page(), event.kind().label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod event;
pub mod export;
pub mod storage;
pub mod store;

pub use capture::{
    AnnotationAction, AnnotationInfo, Capability, CapabilitySet, EventCapture, EventHub,
    EventListener, EventSource, SubscriptionId, ViewerEvent,
};
pub use event::{AuditEvent, EventKind, NewAuditEvent, PageLocator};
pub use export::{ExportFormat, export_events};
pub use storage::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use store::{AuditEventStore, KvAuditStore};
