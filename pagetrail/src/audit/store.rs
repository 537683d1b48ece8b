//! Append-only audit event store.
//!
//! The whole log is one JSON array, newest first, kept under a single key
//! of a [`KeyValueStore`]. Every append rewrites that value, so an append
//! either lands completely or leaves the previous log as it was.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::audit::event::{AuditEvent, NewAuditEvent};
use crate::audit::storage::KeyValueStore;
use crate::config::AUDIT_LOG_KEY;
use crate::error::{PageTrailError, Result};

/// Ordered, durable collection of audit events.
pub trait AuditEventStore: Send + Sync {
    /// Number, timestamp and persist `event` as the newest entry.
    fn append(&self, event: NewAuditEvent) -> Result<AuditEvent>;

    /// Every event, newest first.
    fn read_all(&self) -> Result<Vec<AuditEvent>>;

    /// Drop every event. Clearing an empty log succeeds.
    fn clear(&self) -> Result<()>;
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// [`AuditEventStore`] over any [`KeyValueStore`].
pub struct KvAuditStore<S> {
    storage: S,
    key: String,
    clock: Clock,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> KvAuditStore<S> {
    /// Store under the default key.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, AUDIT_LOG_KEY)
    }

    /// Store under `key`.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            clock: Box::new(Utc::now),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the wall clock used for timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Key the log lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Result<Vec<AuditEvent>> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let mut events: Vec<AuditEvent> = serde_json::from_str(&raw).map_err(|e| {
            PageTrailError::persist(format!("stored audit log under '{}' is corrupt: {e}", self.key))
        })?;
        events.sort_by(|a, b| b.sequence().cmp(&a.sequence()));
        Ok(events)
    }
}

impl<S: KeyValueStore> AuditEventStore for KvAuditStore<S> {
    #[instrument(skip(self, event), fields(kind = %event.kind()))]
    fn append(&self, event: NewAuditEvent) -> Result<AuditEvent> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut events = self.load()?;
        let sequence = match events.first() {
            Some(newest) => newest.sequence().checked_add(1).ok_or_else(|| {
                PageTrailError::persist(format!("audit log under '{}' is out of sequence numbers", self.key))
            })?,
            None => 1,
        };
        let recorded = AuditEvent::record(sequence, (self.clock)(), event);

        events.insert(0, recorded.clone());
        self.storage.put(&self.key, &serde_json::to_string(&events)?)?;

        debug!(sequence, "audit event appended");
        Ok(recorded)
    }

    fn read_all(&self) -> Result<Vec<AuditEvent>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    #[instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.storage.remove(&self.key)?;
        debug!("audit log cleared");
        Ok(())
    }
}

impl<S> fmt::Debug for KvAuditStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvAuditStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
