use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use zendriver_types::{Method, Request};

use crate::cmd::CommandChain;
use crate::error::{CdpError, ErrorContext};
use zendriver_cdp::cdp::browser_protocol::network::LoaderId;
use zendriver_cdp::cdp::browser_protocol::page::{
    self, EventFrameAttached, EventFrameDetached, EventFrameNavigated, EventFrameStartedLoading,
    EventFrameStoppedLoading, EventLifecycleEvent, EventNavigatedWithinDocument, FrameId,
    FrameTree,
};
use zendriver_cdp::cdp::js_protocol::runtime;
use zendriver_cdp::cdp::CdpEvent;

/// The handler-internal identifier for a navigation in flight.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct NavigationId(pub usize);

/// A navigation request as issued by a tab, waiting to be put on the wire.
#[derive(Debug)]
pub struct FrameRequestedNavigation {
    pub id: NavigationId,
    pub req: Request,
}

impl FrameRequestedNavigation {
    pub fn new(id: NavigationId, req: Request) -> Self {
        Self { id, req }
    }
}

/// A completed navigation.
#[derive(Debug)]
pub struct NavigationOk {
    pub id: NavigationId,
    pub frame: FrameId,
}

impl NavigationOk {
    pub fn navigation_id(&self) -> &NavigationId {
        &self.id
    }
}

/// A navigation that will never complete.
#[derive(Debug)]
pub enum NavigationError {
    /// The watched lifecycle event did not arrive in time.
    Timeout { id: NavigationId },
    /// A newer navigation for the same frame took over.
    Superseded { id: NavigationId },
    /// No main frame is known for this target.
    NoMainFrame { id: NavigationId },
}

impl NavigationError {
    pub fn navigation_id(&self) -> &NavigationId {
        match self {
            NavigationError::Timeout { id }
            | NavigationError::Superseded { id }
            | NavigationError::NoMainFrame { id } => id,
        }
    }
}

impl From<NavigationError> for CdpError {
    fn from(err: NavigationError) -> Self {
        let ctx = ErrorContext::for_method(page::NavigateParams::IDENTIFIER);
        match err {
            NavigationError::Timeout { .. } => CdpError::Timeout(ctx),
            NavigationError::Superseded { .. } => CdpError::NavigationSuperseded(ctx),
            NavigationError::NoMainFrame { .. } => CdpError::NoMainFrame(ctx),
        }
    }
}

/// Outbound work produced by the frame manager for the handler.
#[derive(Debug)]
pub enum FrameEvent {
    /// Put this navigation request on the wire.
    NavigationRequest(NavigationId, Request),
    /// A watched navigation finished, one way or the other.
    NavigationResult(Result<NavigationOk, NavigationError>),
}

#[derive(Debug)]
pub struct Frame {
    pub parent_frame: Option<FrameId>,
    pub id: FrameId,
    pub loader_id: Option<LoaderId>,
    pub url: Option<String>,
    pub child_frames: HashSet<FrameId>,
    pub name: Option<String>,
    pub lifecycle_events: HashSet<String>,
}

impl Frame {
    pub fn new(id: FrameId) -> Self {
        Self {
            parent_frame: None,
            id,
            loader_id: None,
            url: None,
            child_frames: Default::default(),
            name: None,
            lifecycle_events: Default::default(),
        }
    }

    pub fn with_parent(id: FrameId, parent: &mut Frame) -> Self {
        parent.child_frames.insert(id.clone());
        Self {
            parent_frame: Some(parent.id.clone()),
            ..Frame::new(id)
        }
    }

    fn navigated(&mut self, frame: &page::Frame) {
        self.name = frame.name.clone();
        let url = if let Some(ref fragment) = frame.url_fragment {
            format!("{}{}", frame.url, fragment)
        } else {
            frame.url.clone()
        };
        self.url = Some(url);
    }

    fn navigated_within_url(&mut self, url: String) {
        self.url = Some(url)
    }

    fn on_loading_stopped(&mut self) {
        self.lifecycle_events.insert("DOMContentLoaded".to_string());
        self.lifecycle_events.insert("load".to_string());
    }
}

/// Maintains the state of the page's frames and decides when a navigation is
/// complete: the main frame's `Page.frameStoppedLoading` is authoritative,
/// same-document navigations complete on `Page.navigatedWithinDocument`.
#[derive(Debug)]
pub struct FrameManager {
    main_frame: Option<FrameId>,
    frames: HashMap<FrameId, Frame>,
    /// Window in which the watched navigation event must arrive
    timeout: Duration,
    /// The currently tracked navigation; a frame has at most one.
    watcher: Option<NavigationWatcher>,
    /// Work queued for the handler
    pending_events: VecDeque<FrameEvent>,
}

impl FrameManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            main_frame: None,
            frames: Default::default(),
            timeout,
            watcher: None,
            pending_events: Default::default(),
        }
    }

    /// The commands to execute in order to initialize this frame manager
    pub fn init_commands(timeout: Duration) -> CommandChain {
        let enable = page::EnableParams::default();
        let get_tree = page::GetFrameTreeParams::default();
        let set_lifecycle = page::SetLifecycleEventsEnabledParams::new(true);
        let enable_runtime = runtime::EnableParams::default();
        CommandChain::new(
            vec![
                (enable.identifier(), serde_json::to_value(enable).unwrap()),
                (
                    get_tree.identifier(),
                    serde_json::to_value(get_tree).unwrap(),
                ),
                (
                    set_lifecycle.identifier(),
                    serde_json::to_value(set_lifecycle).unwrap(),
                ),
                (
                    enable_runtime.identifier(),
                    serde_json::to_value(enable_runtime).unwrap(),
                ),
            ],
            timeout,
        )
    }

    pub fn main_frame(&self) -> Option<&Frame> {
        self.main_frame.as_ref().and_then(|id| self.frames.get(id))
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.frames.values()
    }

    pub fn frame(&self, id: &FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    /// Seed the frame table from the `Page.getFrameTree` response issued
    /// during initialization. The frame without a parent is the main frame.
    pub fn on_frame_tree(&mut self, tree: FrameTree) {
        if tree.frame.parent_id.is_none() {
            self.main_frame = Some(tree.frame.id.clone());
        }
        self.insert_tree(tree);
    }

    fn insert_tree(&mut self, tree: FrameTree) {
        let mut frame = Frame::new(tree.frame.id.clone());
        frame.parent_frame = tree.frame.parent_id.clone();
        frame.navigated(&tree.frame);
        for child in tree.child_frames.into_iter().flatten() {
            frame.child_frames.insert(child.frame.id.clone());
            self.insert_tree(child);
        }
        self.frames.insert(frame.id.clone(), frame);
    }

    /// Track a new navigation of the main frame.
    ///
    /// A navigation already in flight is superseded: its waiter resolves with
    /// an error and the new navigation takes over the watch.
    pub fn navigate(&mut self, nav: FrameRequestedNavigation, now: Instant) {
        let Some(main_frame) = self.main_frame.clone() else {
            self.pending_events
                .push_back(FrameEvent::NavigationResult(Err(
                    NavigationError::NoMainFrame { id: nav.id },
                )));
            return;
        };

        if let Some(prev) = self.watcher.replace(NavigationWatcher {
            id: nav.id,
            frame: main_frame,
            deadline: now + self.timeout,
        }) {
            self.pending_events
                .push_back(FrameEvent::NavigationResult(Err(
                    NavigationError::Superseded { id: prev.id },
                )));
        }
        self.pending_events
            .push_back(FrameEvent::NavigationRequest(nav.id, nav.req));
    }

    /// Give up on the tracked navigation, e.g. because the target went away.
    pub fn abort_watcher(&mut self) -> Option<NavigationId> {
        self.watcher.take().map(|watcher| watcher.id)
    }

    /// Advance: expire the watcher if its deadline passed, then surface
    /// queued work.
    pub fn poll(&mut self, now: Instant) -> Option<FrameEvent> {
        if let Some(watcher) = self.watcher.as_ref() {
            if now > watcher.deadline {
                let watcher = self.watcher.take().expect("watcher is present");
                return Some(FrameEvent::NavigationResult(Err(
                    NavigationError::Timeout { id: watcher.id },
                )));
            }
        }
        self.pending_events.pop_front()
    }

    pub fn on_event(&mut self, event: &CdpEvent) {
        match event {
            CdpEvent::PageFrameAttached(ev) => self.on_frame_attached(ev),
            CdpEvent::PageFrameDetached(ev) => self.on_frame_detached(ev),
            CdpEvent::PageFrameNavigated(ev) => self.on_frame_navigated(ev),
            CdpEvent::PageFrameStartedLoading(ev) => self.on_frame_started_loading(ev),
            CdpEvent::PageFrameStoppedLoading(ev) => self.on_frame_stopped_loading(ev),
            CdpEvent::PageLifecycleEvent(ev) => self.on_page_lifecycle_event(ev),
            CdpEvent::PageNavigatedWithinDocument(ev) => {
                self.on_frame_navigated_within_document(ev)
            }
            _ => {}
        }
    }

    fn on_frame_attached(&mut self, event: &EventFrameAttached) {
        if self.frames.contains_key(&event.frame_id) {
            return;
        }
        if let Some(parent_frame) = self.frames.get_mut(&event.parent_frame_id) {
            let frame = Frame::with_parent(event.frame_id.clone(), parent_frame);
            self.frames.insert(event.frame_id.clone(), frame);
        }
    }

    fn on_frame_detached(&mut self, event: &EventFrameDetached) {
        self.remove_frames_recursively(&event.frame_id);
    }

    fn on_frame_navigated(&mut self, event: &EventFrameNavigated) {
        if event.frame.parent_id.is_some() {
            if let Some((id, mut frame)) = self.frames.remove_entry(&event.frame.id) {
                for child in std::mem::take(&mut frame.child_frames) {
                    self.remove_frames_recursively(&child);
                }
                frame.navigated(&event.frame);
                self.frames.insert(id, frame);
            }
        } else {
            let mut frame = if let Some(main) = self.main_frame.take() {
                // update the existing main frame, it may have been given a
                // new id by a cross-process navigation
                let mut main_frame = self.frames.remove(&main).expect("main frame is tracked");
                for child in std::mem::take(&mut main_frame.child_frames) {
                    self.remove_frames_recursively(&child);
                }
                main_frame.id = event.frame.id.clone();
                main_frame
            } else {
                // initial main frame navigation
                Frame::new(event.frame.id.clone())
            };
            frame.navigated(&event.frame);
            self.main_frame = Some(frame.id.clone());
            self.frames.insert(frame.id.clone(), frame);
        }
    }

    fn on_frame_started_loading(&mut self, event: &EventFrameStartedLoading) {
        if let Some(frame) = self.frames.get_mut(&event.frame_id) {
            frame.lifecycle_events.clear();
        }
    }

    fn on_frame_stopped_loading(&mut self, event: &EventFrameStoppedLoading) {
        if let Some(frame) = self.frames.get_mut(&event.frame_id) {
            frame.on_loading_stopped();
        }
        self.complete_watched(&event.frame_id);
    }

    fn on_frame_navigated_within_document(&mut self, event: &EventNavigatedWithinDocument) {
        if let Some(frame) = self.frames.get_mut(&event.frame_id) {
            frame.navigated_within_url(event.url.clone());
        }
        // same-document navigations emit no frameStoppedLoading
        self.complete_watched(&event.frame_id);
    }

    fn on_page_lifecycle_event(&mut self, event: &EventLifecycleEvent) {
        if let Some(frame) = self.frames.get_mut(&event.frame_id) {
            if event.name == "init" {
                frame.loader_id = Some(event.loader_id.clone());
                frame.lifecycle_events.clear();
            }
            frame.lifecycle_events.insert(event.name.clone());
        }
    }

    fn complete_watched(&mut self, frame_id: &FrameId) {
        if self.watcher.as_ref().map(|w| &w.frame) == Some(frame_id) {
            let watcher = self.watcher.take().expect("watcher is present");
            self.pending_events
                .push_back(FrameEvent::NavigationResult(Ok(NavigationOk {
                    id: watcher.id,
                    frame: watcher.frame,
                })));
        }
    }

    /// Detach all child frames
    fn remove_frames_recursively(&mut self, id: &FrameId) -> Option<Frame> {
        if let Some(mut frame) = self.frames.remove(id) {
            for child in std::mem::take(&mut frame.child_frames) {
                self.remove_frames_recursively(&child);
            }
            if let Some(parent_id) = frame.parent_frame.take() {
                if let Some(parent) = self.frames.get_mut(&parent_id) {
                    parent.child_frames.remove(&frame.id);
                }
            }
            Some(frame)
        } else {
            None
        }
    }
}

/// Tracks the progress of an issued `Page.navigate` request until the watched
/// lifecycle event arrives.
#[derive(Debug)]
struct NavigationWatcher {
    id: NavigationId,
    frame: FrameId,
    /// When the navigation is considered failed
    deadline: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_main_frame() -> FrameManager {
        let mut fm = FrameManager::new(Duration::from_secs(30));
        fm.on_frame_tree(FrameTree {
            frame: page::Frame {
                id: "MAIN".into(),
                parent_id: None,
                loader_id: None,
                name: None,
                url: "about:blank".to_string(),
                url_fragment: None,
            },
            child_frames: Some(vec![FrameTree {
                frame: page::Frame {
                    id: "CHILD".into(),
                    parent_id: Some("MAIN".into()),
                    loader_id: None,
                    name: None,
                    url: "about:blank".to_string(),
                    url_fragment: None,
                },
                child_frames: None,
            }]),
        });
        fm
    }

    fn nav_request(id: usize) -> FrameRequestedNavigation {
        FrameRequestedNavigation::new(
            NavigationId(id),
            Request::new(
                "Page.navigate".into(),
                serde_json::json!({"url": "https://example.com"}),
            ),
        )
    }

    #[test]
    fn frame_tree_discovers_main_frame() {
        let fm = manager_with_main_frame();
        assert_eq!(fm.main_frame().unwrap().id.as_str(), "MAIN");
        assert_eq!(fm.frames().count(), 2);
        assert_eq!(
            fm.frame(&"CHILD".into()).unwrap().parent_frame,
            Some("MAIN".into())
        );
    }

    #[test]
    fn navigation_completes_on_main_frame_stopped_loading() {
        let now = Instant::now();
        let mut fm = manager_with_main_frame();
        fm.navigate(nav_request(1), now);

        match fm.poll(now) {
            Some(FrameEvent::NavigationRequest(id, _)) => assert_eq!(id, NavigationId(1)),
            other => panic!("expected request, got {other:?}"),
        }
        assert!(fm.poll(now).is_none());

        // a child frame finishing does not end the navigation
        fm.on_event(&CdpEvent::PageFrameStoppedLoading(EventFrameStoppedLoading {
            frame_id: "CHILD".into(),
        }));
        assert!(fm.poll(now).is_none());

        fm.on_event(&CdpEvent::PageFrameStoppedLoading(EventFrameStoppedLoading {
            frame_id: "MAIN".into(),
        }));
        match fm.poll(now) {
            Some(FrameEvent::NavigationResult(Ok(ok))) => assert_eq!(ok.id, NavigationId(1)),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn newer_navigation_supersedes_the_previous_one() {
        let now = Instant::now();
        let mut fm = manager_with_main_frame();
        fm.navigate(nav_request(1), now);
        let _ = fm.poll(now);
        fm.navigate(nav_request(2), now);

        match fm.poll(now) {
            Some(FrameEvent::NavigationResult(Err(NavigationError::Superseded { id }))) => {
                assert_eq!(id, NavigationId(1))
            }
            other => panic!("expected superseded, got {other:?}"),
        }
        match fm.poll(now) {
            Some(FrameEvent::NavigationRequest(id, _)) => assert_eq!(id, NavigationId(2)),
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn navigation_times_out_at_the_deadline() {
        let now = Instant::now();
        let mut fm = FrameManager::new(Duration::from_millis(10));
        fm.on_frame_tree(FrameTree {
            frame: page::Frame {
                id: "MAIN".into(),
                parent_id: None,
                loader_id: None,
                name: None,
                url: "about:blank".to_string(),
                url_fragment: None,
            },
            child_frames: None,
        });
        fm.navigate(nav_request(1), now);
        let _ = fm.poll(now);

        let later = now + Duration::from_millis(50);
        match fm.poll(later) {
            Some(FrameEvent::NavigationResult(Err(NavigationError::Timeout { id }))) => {
                assert_eq!(id, NavigationId(1))
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn navigation_without_main_frame_fails() {
        let now = Instant::now();
        let mut fm = FrameManager::new(Duration::from_secs(30));
        fm.navigate(nav_request(7), now);
        match fm.poll(now) {
            Some(FrameEvent::NavigationResult(Err(NavigationError::NoMainFrame { id }))) => {
                assert_eq!(id, NavigationId(7))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn same_document_navigation_completes_the_watch() {
        let now = Instant::now();
        let mut fm = manager_with_main_frame();
        fm.navigate(nav_request(3), now);
        let _ = fm.poll(now);

        fm.on_event(&CdpEvent::PageNavigatedWithinDocument(
            EventNavigatedWithinDocument {
                frame_id: "MAIN".into(),
                url: "about:blank#anchor".to_string(),
            },
        ));
        match fm.poll(now) {
            Some(FrameEvent::NavigationResult(Ok(ok))) => assert_eq!(ok.id, NavigationId(3)),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(
            fm.main_frame().unwrap().url.as_deref(),
            Some("about:blank#anchor")
        );
    }
}
