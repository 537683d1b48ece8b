#![no_main]

use libfuzzer_sys::fuzz_target;
use pagetrail::audit::{
    AuditEventStore, EventKind, KeyValueStore, KvAuditStore, MemoryKvStore, NewAuditEvent,
};
use pagetrail::config::AUDIT_LOG_KEY;

// Whatever is stored under the log key, reads either decode newest first or
// fail with a persistence error that appends also report. A log that reads
// back stays readable after an append.
fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data).into_owned();
    let storage = MemoryKvStore::new();
    storage.put(AUDIT_LOG_KEY, &raw).unwrap();
    let store = KvAuditStore::new(storage);

    match store.read_all() {
        Ok(events) => {
            assert!(events.windows(2).all(|w| w[0].sequence() >= w[1].sequence()));
            if let Ok(appended) = store.append(NewAuditEvent::new(EventKind::PageNavigation).page(0)) {
                let after = store.read_all().unwrap();
                assert_eq!(after.len(), events.len() + 1);
                assert_eq!(after[0], appended);
            }
        }
        Err(err) => {
            assert!(err.is_audit_failure());
            let appended = store.append(NewAuditEvent::new(EventKind::PageNavigation).page(1));
            assert!(appended.is_err());
        }
    }
});
