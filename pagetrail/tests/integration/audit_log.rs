//! Durable audit log behaviour across sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{TimeZone, Utc};
use pagetrail::audit::{
    AuditEventStore, EventKind, ExportFormat, FileKvStore, KvAuditStore, NewAuditEvent,
    PageLocator, export_events,
};
use pagetrail::config::AUDIT_LOG_KEY;
use pagetrail::error::PageTrailError;
use pagetrail::output::{EMPTY_LOG_MESSAGE, audit_table_lines};

use crate::common::{file_session, temp_dir};

#[test]
fn test_appends_read_back_newest_first() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    let store = session.audit_store().unwrap();

    for page in 1..=5 {
        store
            .append(NewAuditEvent::new(EventKind::PageNavigation).page(page))
            .unwrap();
    }

    let events = session.audit_events().unwrap();
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence()).collect();
    let pages: Vec<PageLocator> = events.iter().map(|e| e.page()).collect();
    assert_eq!(sequences, [5, 4, 3, 2, 1]);
    assert_eq!(
        pages,
        (1..=5).rev().map(PageLocator::Page).collect::<Vec<_>>()
    );
}

#[test]
fn test_log_survives_restart() {
    let dir = temp_dir();
    {
        let session = file_session(dir.path());
        let store = session.audit_store().unwrap();
        store
            .append(NewAuditEvent::new(EventKind::DocumentLoaded).detail("Game.pdf (12 pages)"))
            .unwrap();
        store
            .append(NewAuditEvent::new(EventKind::PagesMoved).range(2, 7))
            .unwrap();
        session.dispose();
    }

    let session = file_session(dir.path());
    let events = session.audit_events().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), EventKind::PagesMoved);
    assert_eq!(events[0].page(), PageLocator::Range { from: 2, to: 7 });
    assert_eq!(events[1].detail(), "Game.pdf (12 pages)");

    // Numbering continues where the previous session stopped.
    let next = session
        .audit_store()
        .unwrap()
        .append(NewAuditEvent::new(EventKind::ZoomChanged))
        .unwrap();
    assert_eq!(next.sequence(), 3);
}

#[test]
fn test_clear_is_durable_and_idempotent() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    session.clear_audit_events().unwrap();

    let store = session.audit_store().unwrap();
    store
        .append(NewAuditEvent::new(EventKind::SearchPerformed))
        .unwrap();
    session.clear_audit_events().unwrap();
    assert!(session.audit_events().unwrap().is_empty());

    let reopened = file_session(dir.path());
    assert!(reopened.audit_events().unwrap().is_empty());

    let lines = audit_table_lines(&reopened.audit_events().unwrap());
    assert_eq!(lines.last().map(String::as_str), Some(EMPTY_LOG_MESSAGE));
}

#[test]
fn test_corrupt_log_is_reported_not_replaced() {
    let dir = temp_dir();
    let storage = FileKvStore::open(dir.path()).unwrap();
    let log_path = storage.path_for(AUDIT_LOG_KEY);
    std::fs::write(&log_path, "{ definitely not a list").unwrap();

    let store = KvAuditStore::new(storage);
    let err = store.read_all().unwrap_err();
    assert!(matches!(err, PageTrailError::Persist { .. }));

    let err = store
        .append(NewAuditEvent::new(EventKind::PageNavigation).page(1))
        .unwrap_err();
    assert!(err.is_audit_failure());
    assert_eq!(
        std::fs::read_to_string(&log_path).unwrap(),
        "{ definitely not a list"
    );
}

#[test]
fn test_timestamps_come_from_the_clock() {
    let dir = temp_dir();
    let seconds = Arc::new(AtomicI64::new(1_700_000_000));
    let clock_seconds = Arc::clone(&seconds);
    let store = KvAuditStore::new(FileKvStore::open(dir.path()).unwrap()).with_clock(move || {
        let secs = clock_seconds.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    });

    store
        .append(NewAuditEvent::new(EventKind::RotationChanged).page(1))
        .unwrap();
    // A clock stepping backwards must not reorder the log.
    seconds.store(1_600_000_000, Ordering::SeqCst);
    store
        .append(NewAuditEvent::new(EventKind::RotationChanged).page(2))
        .unwrap();

    let events = store.read_all().unwrap();
    assert_eq!(events[0].page(), PageLocator::Page(2));
    assert_eq!(events[0].timestamp().timestamp(), 1_600_000_000);
    assert_eq!(events[1].timestamp().timestamp(), 1_700_000_000);
}

#[test]
fn test_export_matches_stored_log() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    let store = session.audit_store().unwrap();
    store
        .append(
            NewAuditEvent::new(EventKind::CommentAdded)
                .page(3)
                .document("Contract.pdf")
                .detail("Note #7, \"urgent\""),
        )
        .unwrap();
    store
        .append(NewAuditEvent::new(EventKind::PageNavigation).page(4))
        .unwrap();
    let events = session.audit_events().unwrap();

    let mut json = Vec::new();
    assert_eq!(export_events(&events, ExportFormat::Json, &mut json).unwrap(), 2);
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value[0]["event"], "page-navigation");
    assert_eq!(value[1]["page"], "3");
    assert_eq!(value[1]["document"], "Contract.pdf");
    assert!(value[0].get("document").is_none());

    let mut csv = Vec::new();
    export_events(&events, ExportFormat::Csv, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.contains(",3,Contract.pdf,comment-added,\"Note #7, \"\"urgent\"\"\""));

    let mut lines = Vec::new();
    export_events(&events, ExportFormat::JsonLines, &mut lines).unwrap();
    assert_eq!(String::from_utf8(lines).unwrap().lines().count(), 2);
}
