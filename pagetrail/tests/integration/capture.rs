//! Viewer events flowing through a capture adapter into the durable log.

use std::sync::Arc;

use pagetrail::audit::{
    AnnotationAction, AnnotationInfo, Capability, CapabilitySet, EventCapture, EventHub,
    EventKind, EventSource, PageLocator, ViewerEvent,
};

use crate::common::{file_session, temp_dir};

fn comment(id: &str, page: u32, state: Option<&str>) -> AnnotationInfo {
    AnnotationInfo {
        id: id.into(),
        page: Some(page),
        subject: Some("Comment".into()),
        state: state.map(Into::into),
        kind: Some("Text".into()),
    }
}

#[test]
fn test_review_session_is_recorded_in_order() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    let viewer = EventHub::new(CapabilitySet::all());
    let capture = Arc::new(EventCapture::new(&session, CapabilitySet::all()).unwrap());
    capture.attach(&viewer);

    viewer.emit(&ViewerEvent::DocumentLoaded {
        name: "Game.pdf".into(),
        page_count: 12,
    });
    viewer.emit(&ViewerEvent::PageChanged { page: 3 });
    viewer.emit(&ViewerEvent::AnnotationChanged {
        action: AnnotationAction::Add,
        annotations: vec![comment("c1", 3, Some("Accepted"))],
    });
    viewer.emit(&ViewerEvent::PagesMoved { from: 3, to: 1 });

    let events = session.audit_events().unwrap();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        [
            EventKind::PagesMoved,
            EventKind::CommentAdded,
            EventKind::AnnotationAdded,
            EventKind::PageNavigation,
            EventKind::DocumentLoaded,
        ]
    );
    assert_eq!(events[0].page(), PageLocator::Range { from: 3, to: 1 });
    assert_eq!(events[1].detail(), "Comment #c1 (state: Accepted)");
    assert_eq!(events[3].detail(), "Viewed page 3");
    assert_eq!(events[4].detail(), "Game.pdf (12 pages)");
    assert!(events.iter().all(|e| e.document() == Some("Game.pdf")));
    assert_eq!(capture.recorded(), 5);
    assert_eq!(capture.failed_appends(), 0);
}

#[test]
fn test_uninteresting_events_are_not_recorded() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    let viewer = EventHub::new(CapabilitySet::all());
    let interests = CapabilitySet::empty().with(Capability::PageNavigation);
    let capture = Arc::new(EventCapture::new(&session, interests).unwrap());
    capture.attach(&viewer);

    viewer.emit(&ViewerEvent::ZoomChanged {
        zoom: 1.5,
        page: Some(2),
    });
    viewer.emit(&ViewerEvent::PageChanged { page: 2 });

    let events = session.audit_events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::PageNavigation);
}

#[test]
fn test_unsubscribed_capture_stops_recording() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    let viewer = EventHub::new(CapabilitySet::all());
    let capture = Arc::new(EventCapture::new(&session, CapabilitySet::all()).unwrap());
    let id = capture.attach(&viewer);

    viewer.emit(&ViewerEvent::PageChanged { page: 1 });
    assert!(viewer.unsubscribe(id));
    viewer.emit(&ViewerEvent::PageChanged { page: 2 });

    assert_eq!(viewer.listener_count(), 0);
    assert_eq!(session.audit_events().unwrap().len(), 1);
}

#[test]
fn test_capture_after_dispose_is_refused() {
    let dir = temp_dir();
    let session = file_session(dir.path());
    session.dispose();

    assert!(EventCapture::new(&session, CapabilitySet::all()).is_err());
}
