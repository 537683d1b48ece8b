//! Explicitly owned review session.
//!
//! A [`Session`] bundles the collaborators shared by the merge engine and
//! the event capture adapter: the [`DocumentSource`] that loads inputs and
//! the [`AuditEventStore`] that records activity. Callers create it with
//! [`Session::init`], pass it by reference, and end it with
//! [`Session::dispose`]. There is no module-level session state.
//!
//! Every loaded [`PdfDocument`](crate::merge::PdfDocument) holds a lease on
//! its session, so [`Session::open_documents`] reports exactly how many
//! documents are still alive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditEventStore, FileKvStore, KvAuditStore, MemoryKvStore};
use crate::config::AuditConfig;
use crate::error::{PageTrailError, Result};
use crate::io::{DocumentSource, FsSource};

/// Shared context for one review session.
pub struct Session {
    source: Arc<dyn DocumentSource>,
    audit: Arc<dyn AuditEventStore>,
    open_documents: Arc<AtomicUsize>,
    disposed: AtomicBool,
}

impl Session {
    /// Start a session over the given collaborators.
    pub fn init(source: Arc<dyn DocumentSource>, audit: Arc<dyn AuditEventStore>) -> Self {
        debug!("session initialized");
        Self {
            source,
            audit,
            open_documents: Arc::new(AtomicUsize::new(0)),
            disposed: AtomicBool::new(false),
        }
    }

    /// Start a session that reads from the filesystem and keeps the audit
    /// log under `config.data_dir`.
    pub fn open(config: &AuditConfig) -> Result<Self> {
        config.validate()?;
        let storage = FileKvStore::open(&config.data_dir)?;
        let audit = KvAuditStore::with_key(storage, config.storage_key.clone());
        info!(data_dir = %config.data_dir.display(), "session opened");
        Ok(Self::init(Arc::new(FsSource::new()), Arc::new(audit)))
    }

    /// Start a session with a volatile audit log.
    pub fn in_memory() -> Self {
        Self::init(
            Arc::new(FsSource::new()),
            Arc::new(KvAuditStore::new(MemoryKvStore::new())),
        )
    }

    /// Fail with [`PageTrailError::SessionClosed`] once disposed.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            Err(PageTrailError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Document source for this session.
    pub fn source(&self) -> Result<Arc<dyn DocumentSource>> {
        self.ensure_open()?;
        Ok(Arc::clone(&self.source))
    }

    /// Audit store for this session.
    pub fn audit_store(&self) -> Result<Arc<dyn AuditEventStore>> {
        self.ensure_open()?;
        Ok(Arc::clone(&self.audit))
    }

    /// Number of documents loaded through this session that are still alive.
    pub fn open_documents(&self) -> usize {
        self.open_documents.load(Ordering::Acquire)
    }

    /// All audit events, newest first.
    pub fn audit_events(&self) -> Result<Vec<AuditEvent>> {
        self.audit_store()?.read_all()
    }

    /// Remove every audit event.
    pub fn clear_audit_events(&self) -> Result<()> {
        self.audit_store()?.clear()
    }

    /// End the session. Further loads and audit access fail with
    /// [`PageTrailError::SessionClosed`]. Calling it twice is harmless.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let open = self.open_documents();
        if open > 0 {
            warn!(open, "session disposed with documents still loaded");
        } else {
            debug!("session disposed");
        }
    }

    pub(crate) fn lease(&self) -> DocumentLease {
        DocumentLease::new(Arc::clone(&self.open_documents))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open_documents", &self.open_documents())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Counts one live document against its session; released on drop.
#[derive(Debug)]
pub(crate) struct DocumentLease {
    counter: Arc<AtomicUsize>,
}

impl DocumentLease {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for DocumentLease {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventKind, NewAuditEvent};
    use tempfile::TempDir;

    #[test]
    fn test_leases_track_open_documents() {
        let session = Session::in_memory();
        assert_eq!(session.open_documents(), 0);

        let first = session.lease();
        let second = session.lease();
        assert_eq!(session.open_documents(), 2);

        drop(first);
        assert_eq!(session.open_documents(), 1);
        drop(second);
        assert_eq!(session.open_documents(), 0);
    }

    #[test]
    fn test_dispose_closes_session() {
        let session = Session::in_memory();
        assert!(session.ensure_open().is_ok());

        session.dispose();
        session.dispose();

        assert!(session.is_disposed());
        assert!(matches!(
            session.source(),
            Err(PageTrailError::SessionClosed)
        ));
        assert!(matches!(
            session.audit_events(),
            Err(PageTrailError::SessionClosed)
        ));
    }

    #[test]
    fn test_open_persists_under_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = AuditConfig::new(temp_dir.path());

        let session = Session::open(&config).unwrap();
        session
            .audit_store()
            .unwrap()
            .append(NewAuditEvent::new(EventKind::DocumentLoaded))
            .unwrap();
        session.dispose();

        let reopened = Session::open(&config).unwrap();
        assert_eq!(reopened.audit_events().unwrap().len(), 1);

        reopened.clear_audit_events().unwrap();
        assert!(reopened.audit_events().unwrap().is_empty());
    }
}
