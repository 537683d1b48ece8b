//! Viewer event capture.
//!
//! Renderers implement [`EventSource`] and push [`ViewerEvent`]s to every
//! subscribed [`EventListener`]. [`EventCapture`] is the listener that turns
//! those raw events into [`NewAuditEvent`]s and appends them to the session's
//! audit store. Events are tagged with the document open at the time.
//! Store failures are logged and counted; the renderer never sees them.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::audit::event::{EventKind, NewAuditEvent};
use crate::audit::store::AuditEventStore;
use crate::error::Result;
use crate::session::Session;

/// Class of viewer events a renderer can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Page changes.
    PageNavigation,
    /// Annotation create / edit / delete.
    AnnotationLifecycle,
    /// Document open / close.
    DocumentLifecycle,
    /// Zoom changes.
    Zoom,
    /// Rotation changes.
    Rotation,
    /// Text searches.
    Search,
    /// Bookmark moves.
    BookmarkMove,
    /// Page reordering.
    PageMove,
}

impl Capability {
    /// Every capability.
    pub const ALL: [Capability; 8] = [
        Self::PageNavigation,
        Self::AnnotationLifecycle,
        Self::DocumentLifecycle,
        Self::Zoom,
        Self::Rotation,
        Self::Search,
        Self::BookmarkMove,
        Self::PageMove,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of [`Capability`] values.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// No capabilities.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every capability.
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    /// Add `capability`.
    pub fn with(mut self, capability: Capability) -> Self {
        self.0 |= capability.bit();
        self
    }

    /// Whether `capability` is in the set.
    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Capabilities in both sets.
    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Whether the set has no members.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Annotation lifecycle step reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationAction {
    /// Created.
    Add,
    /// Edited.
    Modify,
    /// Removed.
    Delete,
}

/// What the renderer tells us about one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnotationInfo {
    /// Renderer-assigned identifier.
    pub id: String,
    /// 1-based page, if known.
    pub page: Option<u32>,
    /// Subject line such as `Comment`, `Note` or `Highlight`.
    pub subject: Option<String>,
    /// Review state such as `Accepted`.
    pub state: Option<String>,
    /// Annotation type such as `Text` or `Square`.
    pub kind: Option<String>,
}

impl AnnotationInfo {
    /// Whether this annotation is a review comment.
    pub fn is_comment(&self) -> bool {
        let commented_subject = self.subject.as_deref().is_some_and(|subject| {
            let subject = subject.trim();
            subject.eq_ignore_ascii_case("comment") || subject.eq_ignore_ascii_case("note")
        });
        let has_state = self
            .state
            .as_deref()
            .is_some_and(|state| !state.trim().is_empty());
        commented_subject || has_state
    }

    fn describe(&self) -> String {
        let label = self
            .subject
            .as_deref()
            .or(self.kind.as_deref())
            .filter(|label| !label.trim().is_empty())
            .unwrap_or("Annotation");
        if self.id.is_empty() {
            label.to_string()
        } else {
            format!("{label} #{}", self.id)
        }
    }
}

/// Raw interaction event raised by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The current page changed.
    PageChanged {
        /// New 1-based page.
        page: u32,
    },
    /// One or more annotations changed.
    AnnotationChanged {
        /// What happened to them.
        action: AnnotationAction,
        /// The annotations involved.
        annotations: Vec<AnnotationInfo>,
    },
    /// A document finished loading.
    DocumentLoaded {
        /// Display name.
        name: String,
        /// Number of pages.
        page_count: usize,
    },
    /// A document was closed.
    DocumentUnloaded {
        /// Display name.
        name: String,
    },
    /// Zoom changed; `zoom` is a factor where 1.0 is 100%.
    ZoomChanged {
        /// New zoom factor.
        zoom: f64,
        /// Current page, if known.
        page: Option<u32>,
    },
    /// Page rotation changed.
    RotationChanged {
        /// New rotation in degrees.
        degrees: i32,
        /// Rotated page, if known.
        page: Option<u32>,
    },
    /// A text search ran.
    SearchPerformed {
        /// Query text.
        query: String,
        /// Page the search started from, if known.
        page: Option<u32>,
        /// Number of matches.
        hits: usize,
    },
    /// A bookmark was moved.
    BookmarkMoved {
        /// Bookmark title.
        title: String,
        /// Page it pointed at.
        from: u32,
        /// Page it points at now.
        to: u32,
    },
    /// Pages were reordered.
    PagesMoved {
        /// Original 1-based position.
        from: u32,
        /// New 1-based position.
        to: u32,
    },
}

impl ViewerEvent {
    /// Capability a renderer needs to raise this event.
    pub fn capability(&self) -> Capability {
        match self {
            Self::PageChanged { .. } => Capability::PageNavigation,
            Self::AnnotationChanged { .. } => Capability::AnnotationLifecycle,
            Self::DocumentLoaded { .. } | Self::DocumentUnloaded { .. } => {
                Capability::DocumentLifecycle
            }
            Self::ZoomChanged { .. } => Capability::Zoom,
            Self::RotationChanged { .. } => Capability::Rotation,
            Self::SearchPerformed { .. } => Capability::Search,
            Self::BookmarkMoved { .. } => Capability::BookmarkMove,
            Self::PagesMoved { .. } => Capability::PageMove,
        }
    }
}

/// Receives viewer events.
pub trait EventListener: Send + Sync {
    /// Capabilities this listener wants delivered.
    fn interests(&self) -> CapabilitySet;

    /// Handle one event. Must not panic or block for long.
    fn on_event(&self, event: &ViewerEvent);
}

/// Handle returned by [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Something that raises viewer events, usually a renderer.
pub trait EventSource {
    /// Events this source can raise.
    fn capabilities(&self) -> CapabilitySet;

    /// Register `listener`; it receives events matching its interests.
    fn subscribe(&self, listener: Arc<dyn EventListener>) -> SubscriptionId;

    /// Remove a listener. Returns whether it was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-process [`EventSource`] that fans events out to its listeners.
///
/// Renderer bindings can wrap one of these; tests use it as a stand-in
/// renderer.
pub struct EventHub {
    capabilities: CapabilitySet,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Arc<dyn EventListener>)>>,
}

impl EventHub {
    /// Hub able to raise `capabilities`.
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities,
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Deliver `event` to every interested listener.
    ///
    /// Events outside the hub's own capabilities are dropped. Returns the
    /// number of listeners that received it.
    pub fn emit(&self, event: &ViewerEvent) -> usize {
        let capability = event.capability();
        if !self.capabilities.contains(capability) {
            debug!(?capability, "event outside hub capabilities dropped");
            return 0;
        }

        let listeners: Vec<_> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, listener)| listener.interests().contains(capability))
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener.on_event(event);
        }
        listeners.len()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventSource for EventHub {
    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn subscribe(&self, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("capabilities", &self.capabilities)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Normalizes viewer events and records them in an audit store.
pub struct EventCapture {
    store: Arc<dyn AuditEventStore>,
    interests: CapabilitySet,
    current_document: Mutex<Option<String>>,
    recorded: AtomicUsize,
    failed: AtomicUsize,
}

impl EventCapture {
    /// Capture `interests` into the session's audit store.
    pub fn new(session: &Session, interests: CapabilitySet) -> Result<Self> {
        Ok(Self::with_store(session.audit_store()?, interests))
    }

    /// Capture `interests` into `store`.
    pub fn with_store(store: Arc<dyn AuditEventStore>, interests: CapabilitySet) -> Self {
        Self {
            store,
            interests,
            current_document: Mutex::new(None),
            recorded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Subscribe to `source`.
    ///
    /// Wanted capabilities the source cannot raise are logged and otherwise
    /// ignored.
    pub fn attach(self: &Arc<Self>, source: &dyn EventSource) -> SubscriptionId {
        let offered = source.capabilities();
        let missing: Vec<_> = self
            .interests
            .iter()
            .filter(|c| !offered.contains(*c))
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "event source lacks requested capabilities");
        }
        source.subscribe(Arc::clone(self) as Arc<dyn EventListener>)
    }

    /// Audit events describing `event`, in append order.
    pub fn normalize(event: &ViewerEvent) -> Vec<NewAuditEvent> {
        match event {
            ViewerEvent::PageChanged { page } => vec![
                NewAuditEvent::new(EventKind::PageNavigation)
                    .page(*page)
                    .detail(format!("Viewed page {page}")),
            ],
            ViewerEvent::AnnotationChanged {
                action,
                annotations,
            } => annotations
                .iter()
                .flat_map(|annotation| annotation_events(*action, annotation))
                .collect(),
            ViewerEvent::DocumentLoaded { name, page_count } => vec![
                NewAuditEvent::new(EventKind::DocumentLoaded)
                    .document(name.as_str())
                    .detail(format!("{name} ({page_count} pages)")),
            ],
            ViewerEvent::DocumentUnloaded { name } => vec![
                NewAuditEvent::new(EventKind::DocumentUnloaded)
                    .document(name.as_str())
                    .detail(name.clone()),
            ],
            ViewerEvent::ZoomChanged { zoom, page } => vec![
                with_page(NewAuditEvent::new(EventKind::ZoomChanged), *page)
                    .detail(format!("Zoom {:.0}%", zoom * 100.0)),
            ],
            ViewerEvent::RotationChanged { degrees, page } => vec![
                with_page(NewAuditEvent::new(EventKind::RotationChanged), *page)
                    .detail(format!("Rotated to {degrees}°")),
            ],
            ViewerEvent::SearchPerformed { query, page, hits } => vec![
                with_page(NewAuditEvent::new(EventKind::SearchPerformed), *page)
                    .detail(format!("\"{query}\" ({hits} hits)")),
            ],
            ViewerEvent::BookmarkMoved { title, from, to } => vec![
                NewAuditEvent::new(EventKind::BookmarkMoved)
                    .range(*from, *to)
                    .detail(title.clone()),
            ],
            ViewerEvent::PagesMoved { from, to } => vec![
                NewAuditEvent::new(EventKind::PagesMoved)
                    .range(*from, *to)
                    .detail(format!("Moved page {from} to {to}")),
            ],
        }
    }

    /// Record `event` if it matches our interests.
    ///
    /// Returns how many audit events were appended.
    pub fn capture(&self, event: &ViewerEvent) -> usize {
        if !self.interests.contains(event.capability()) {
            return 0;
        }

        let document = self.track_document(event);
        let mut appended = 0;
        for mut audit_event in Self::normalize(event) {
            if audit_event.document_name().is_none()
                && let Some(name) = &document
            {
                audit_event = audit_event.document(name.as_str());
            }
            let kind = audit_event.kind();
            match self.store.append(audit_event) {
                Ok(recorded) => {
                    appended += 1;
                    debug!(sequence = recorded.sequence(), %kind, "viewer event captured");
                }
                Err(error) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(%kind, %error, "failed to record audit event");
                }
            }
        }
        self.recorded.fetch_add(appended, Ordering::Relaxed);
        appended
    }

    /// Document the viewer currently shows, as last reported.
    pub fn current_document(&self) -> Option<String> {
        self.current_document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // Returns the document `event` belongs to.
    fn track_document(&self, event: &ViewerEvent) -> Option<String> {
        let mut current = self
            .current_document
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match event {
            ViewerEvent::DocumentLoaded { name, .. } => {
                *current = Some(name.clone());
                current.clone()
            }
            ViewerEvent::DocumentUnloaded { .. } => current.take(),
            _ => current.clone(),
        }
    }

    /// Audit events appended so far.
    pub fn recorded(&self) -> usize {
        self.recorded.load(Ordering::Relaxed)
    }

    /// Audit events lost to store failures so far.
    pub fn failed_appends(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl EventListener for EventCapture {
    fn interests(&self) -> CapabilitySet {
        self.interests
    }

    fn on_event(&self, event: &ViewerEvent) {
        self.capture(event);
    }
}

impl fmt::Debug for EventCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCapture")
            .field("interests", &self.interests)
            .field("document", &self.current_document())
            .field("recorded", &self.recorded())
            .field("failed", &self.failed_appends())
            .finish_non_exhaustive()
    }
}

fn with_page(event: NewAuditEvent, page: Option<u32>) -> NewAuditEvent {
    match page {
        Some(page) => event.page(page),
        None => event,
    }
}

fn annotation_events(action: AnnotationAction, annotation: &AnnotationInfo) -> Vec<NewAuditEvent> {
    let (generic, comment) = match action {
        AnnotationAction::Add => (EventKind::AnnotationAdded, Some(EventKind::CommentAdded)),
        AnnotationAction::Modify => (
            EventKind::AnnotationModified,
            Some(EventKind::CommentModified),
        ),
        AnnotationAction::Delete => (EventKind::AnnotationDeleted, None),
    };

    let description = annotation.describe();
    let mut events =
        vec![with_page(NewAuditEvent::new(generic), annotation.page).detail(description.clone())];

    if let Some(comment) = comment
        && annotation.is_comment()
    {
        let detail = match annotation.state.as_deref().map(str::trim) {
            Some(state) if !state.is_empty() => format!("{description} (state: {state})"),
            _ => description,
        };
        events.push(with_page(NewAuditEvent::new(comment), annotation.page).detail(detail));
    }
    events
}
