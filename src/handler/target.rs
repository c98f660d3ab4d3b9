use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::channel::mpsc::{channel, Receiver};
use futures::channel::oneshot::Sender as OneshotSender;
use futures::task::{Context, Poll};
use futures::StreamExt;

use zendriver_types::{Method, Request, Response};

use crate::cmd::{to_command_response, CommandChain, CommandMessage};
use crate::error::{CdpError, ErrorContext, Result};
use crate::handler::frame::{
    FrameEvent, FrameManager, FrameRequestedNavigation, NavigationError, NavigationId,
    NavigationOk,
};
use crate::listeners::{EventHandlerRequest, EventListenerRequest};
use crate::tab::{Tab, TabInner};
use zendriver_cdp::cdp::browser_protocol::page::GetFrameTreeParams;
use zendriver_cdp::cdp::browser_protocol::{network, security};
use zendriver_cdp::cdp::browser_protocol::target::{
    AttachToTargetParams, SessionId, TargetId, TargetInfo,
};
use zendriver_cdp::cdp::CdpEventMessage;

/// How a target initializes itself once a user needs it.
#[derive(Debug)]
pub(crate) struct TargetConfig {
    pub ignore_https_errors: bool,
    pub request_timeout: Duration,
    pub navigation_timeout: Duration,
}

/// Messages a tab handle sends to its target.
#[derive(Debug)]
pub(crate) enum TargetMessage {
    Command(CommandMessage),
    AddEventListener(EventListenerRequest),
    AddEventHandler(EventHandlerRequest),
}

/// Work a target surfaces to the handler when polled.
#[derive(Debug)]
pub(crate) enum TargetEvent {
    /// An initialization request scoped to this target.
    Request(Request),
    /// A command issued by the tab handle.
    Command(CommandMessage),
    /// A navigation request ready to be put on the wire.
    NavigationRequest(NavigationId, Request),
    /// A watched navigation finished.
    NavigationResult(Result<NavigationOk, NavigationError>),
    /// A subscription registration from the tab handle.
    AddEventListener(EventListenerRequest),
    /// A callback registration from the tab handle.
    AddEventHandler(EventHandlerRequest),
}

/// Lazy, idempotent initialization: attach is requested the first time a
/// caller needs the page and happens at most once; every concurrent caller
/// parks in `initiators` and receives the same handle.
#[derive(Debug)]
enum TargetInit {
    /// Nobody asked for this target yet.
    Idle,
    /// A caller wants the page, the attach request is not on the wire yet.
    AttachQueued,
    /// `Target.attachToTarget` submitted, waiting for the attached event.
    Attaching,
    InitializingFrame(CommandChain),
    InitializingNetwork(CommandChain),
    Ready,
}

#[derive(Debug)]
pub(crate) struct Target {
    info: TargetInfo,
    config: TargetConfig,
    frame_manager: FrameManager,
    session_id: Option<SessionId>,
    init: TargetInit,
    /// The page handle handed out to user code, once initialized.
    page: Option<Arc<TabInner>>,
    /// Receiving end of the page handle's command channel.
    tab_rx: Option<Receiver<TargetMessage>>,
    /// Callers waiting for the page handle.
    initiators: Vec<OneshotSender<Result<Tab>>>,
    /// Flipped once the target is destroyed; every tab handle observes it.
    gone: Arc<AtomicBool>,
}

impl Target {
    pub fn new(info: TargetInfo, config: TargetConfig) -> Self {
        let frame_manager = FrameManager::new(config.navigation_timeout);
        Self {
            info,
            config,
            frame_manager,
            session_id: None,
            init: TargetInit::Idle,
            page: None,
            tab_rx: None,
            initiators: Vec::new(),
            gone: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn target_id(&self) -> &TargetId {
        &self.info.target_id
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn is_page(&self) -> bool {
        self.info.is_page()
    }

    pub fn info(&self) -> &TargetInfo {
        &self.info
    }

    /// Update the cached info from a `Target.targetInfoChanged` event.
    pub fn on_info_changed(&mut self, info: TargetInfo) {
        self.info = info;
    }

    /// A session was attached to this target; kick off initialization if we
    /// asked for it. On a same-target reattach the existing page handle is
    /// rebound to the new session.
    pub fn set_session_id(&mut self, id: SessionId) {
        if let Some(page) = self.page.as_ref() {
            page.set_session(id.clone());
        }
        self.session_id = Some(id);
        if matches!(self.init, TargetInit::Attaching) {
            self.init = TargetInit::InitializingFrame(FrameManager::init_commands(
                self.config.request_timeout,
            ));
        }
    }

    /// The session detached without the target going away. Existing tab
    /// handles stay valid and are rebound on the next attach.
    pub fn clear_session(&mut self) {
        self.session_id = None;
        if matches!(self.init, TargetInit::Ready) {
            self.init = TargetInit::Idle;
        }
    }

    /// Park a caller until the page handle is ready, requesting attach on
    /// first use. Repeated and concurrent calls collapse onto the single
    /// in-flight initialization.
    pub fn request_page(&mut self, tx: OneshotSender<Result<Tab>>) {
        if self.gone.load(Ordering::Relaxed) {
            let _ = tx.send(Err(CdpError::TargetGone(self.error_context())));
            return;
        }
        if let Some(page) = self.page.as_ref() {
            if self.session_id.is_some() {
                let _ = tx.send(Ok(Tab::from(Arc::clone(page))));
                return;
            }
            // detached in between; reattach and serve the same handle after
        }
        self.initiators.push(tx);
        if matches!(self.init, TargetInit::Idle) {
            self.init = TargetInit::AttachQueued;
        }
    }

    /// Track a navigation requested by the tab handle.
    pub fn goto(&mut self, nav: FrameRequestedNavigation, now: Instant) {
        self.frame_manager.navigate(nav, now);
    }

    /// Received a response to an initialization command issued by this target.
    pub fn on_response(&mut self, resp: Response, method: &str) {
        if method == GetFrameTreeParams::IDENTIFIER {
            match to_command_response::<GetFrameTreeParams>(resp, method.to_string().into()) {
                Ok(resp) => self.frame_manager.on_frame_tree(resp.result.frame_tree),
                Err(err) => {
                    tracing::warn!(target_id = %self.info.target_id, "failed to read frame tree: {err}")
                }
            }
        } else if let Some(err) = resp.error {
            tracing::warn!(
                target_id = %self.info.target_id,
                method,
                "target init command failed: {err}"
            );
        }

        let chain = match &mut self.init {
            TargetInit::InitializingFrame(chain) | TargetInit::InitializingNetwork(chain) => chain,
            _ => return,
        };
        chain.received_response(method);
    }

    /// An event scoped to this target's session.
    pub fn on_event(&mut self, event: &CdpEventMessage) {
        self.frame_manager.on_event(&event.params);
    }

    /// The target was destroyed in the browser. Invalidates the page handle
    /// and returns the id of a navigation that can no longer complete.
    pub fn closed(&mut self) -> Option<NavigationId> {
        self.gone.store(true, Ordering::Relaxed);
        let error_context = self.error_context();
        for tx in self.initiators.drain(..) {
            let _ = tx.send(Err(CdpError::TargetGone(error_context.clone())));
        }
        // dropping the receiver makes every pending tab send fail
        self.tab_rx.take();
        self.frame_manager.abort_watcher()
    }

    /// The connection is gone. The target itself may still be alive in the
    /// browser, so handles fail with `ConnectionClosed` rather than
    /// `TargetGone` from now on.
    pub fn dispose(&mut self) {
        let error_context = self.error_context();
        for tx in self.initiators.drain(..) {
            let _ = tx.send(Err(CdpError::ConnectionClosed(error_context.clone())));
        }
        self.tab_rx.take();
        self.frame_manager.abort_watcher();
    }

    /// Advance towards a ready page and surface work for the handler.
    pub fn poll(&mut self, cx: &mut Context<'_>, now: Instant) -> Option<TargetEvent> {
        loop {
            match &mut self.init {
                TargetInit::Idle | TargetInit::Attaching | TargetInit::Ready => break,
                TargetInit::AttachQueued => {
                    let attach = AttachToTargetParams::new(self.info.target_id.clone());
                    let req = Request::new(
                        attach.identifier(),
                        serde_json::to_value(&attach).expect("attach params serialize"),
                    );
                    self.init = TargetInit::Attaching;
                    return Some(TargetEvent::Request(req));
                }
                TargetInit::InitializingFrame(chain) => match chain.poll(now) {
                    Poll::Ready(Some(Ok((method, params)))) => {
                        return Some(TargetEvent::Request(self.session_request(method, params)));
                    }
                    Poll::Ready(Some(Err(_))) => {
                        let ctx = self.error_context();
                        self.fail_initiators(move || CdpError::Timeout(ctx.clone()));
                        self.init = TargetInit::Idle;
                        break;
                    }
                    Poll::Ready(None) => {
                        self.init = TargetInit::InitializingNetwork(self.network_init_commands());
                    }
                    Poll::Pending => break,
                },
                TargetInit::InitializingNetwork(chain) => match chain.poll(now) {
                    Poll::Ready(Some(Ok((method, params)))) => {
                        return Some(TargetEvent::Request(self.session_request(method, params)));
                    }
                    Poll::Ready(Some(Err(_))) => {
                        let ctx = self.error_context();
                        self.fail_initiators(move || CdpError::Timeout(ctx.clone()));
                        self.init = TargetInit::Idle;
                        break;
                    }
                    Poll::Ready(None) => {
                        self.init = TargetInit::Ready;
                        self.create_page();
                    }
                    Poll::Pending => break,
                },
            }
        }

        if let Some(rx) = self.tab_rx.as_mut() {
            if let Poll::Ready(Some(msg)) = rx.poll_next_unpin(cx) {
                return Some(match msg {
                    TargetMessage::Command(cmd) => TargetEvent::Command(cmd),
                    TargetMessage::AddEventListener(req) => TargetEvent::AddEventListener(req),
                    TargetMessage::AddEventHandler(req) => TargetEvent::AddEventHandler(req),
                });
            }
        }

        match self.frame_manager.poll(now)? {
            FrameEvent::NavigationRequest(id, req) => Some(TargetEvent::NavigationRequest(id, req)),
            FrameEvent::NavigationResult(res) => Some(TargetEvent::NavigationResult(res)),
        }
    }

    fn session_request(&self, method: zendriver_types::MethodId, params: serde_json::Value) -> Request {
        let mut req = Request::new(method, params);
        req.session_id = self.session_id.clone().map(Into::into);
        req
    }

    fn create_page(&mut self) {
        let session_id = match self.session_id.clone() {
            Some(id) => id,
            None => {
                self.fail_initiators(|| CdpError::msg("session vanished during initialization"));
                return;
            }
        };
        if let Some(inner) = self.page.as_ref() {
            // reattach: same handle, fresh session
            inner.set_session(session_id);
            let inner = Arc::clone(inner);
            for tx in self.initiators.drain(..) {
                let _ = tx.send(Ok(Tab::from(Arc::clone(&inner))));
            }
            return;
        }
        let (commands, rx) = channel(256);
        let inner = Arc::new(TabInner::new(
            self.info.target_id.clone(),
            session_id,
            commands,
            Arc::clone(&self.gone),
            self.config.navigation_timeout,
        ));
        self.tab_rx = Some(rx);
        self.page = Some(Arc::clone(&inner));
        for tx in self.initiators.drain(..) {
            let _ = tx.send(Ok(Tab::from(Arc::clone(&inner))));
        }
    }

    /// What this target enables network-wise once its session is up. Driven
    /// by the handler config rather than a manager of its own; certificate
    /// errors are only worth a command when they are to be ignored.
    fn network_init_commands(&self) -> CommandChain {
        let enable = network::EnableParams::default();
        let mut cmds = vec![(enable.identifier(), serde_json::to_value(enable).unwrap())];
        if self.config.ignore_https_errors {
            let ignore = security::SetIgnoreCertificateErrorsParams::new(true);
            cmds.push((ignore.identifier(), serde_json::to_value(ignore).unwrap()));
        }
        CommandChain::new(cmds, self.config.request_timeout)
    }

    fn error_context(&self) -> ErrorContext {
        ErrorContext::for_target(self.info.target_id.clone())
    }

    fn fail_initiators(&mut self, err: impl Fn() -> CdpError) {
        for tx in self.initiators.drain(..) {
            let _ = tx.send(Err(err()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot::channel as oneshot_channel;
    use futures::task::noop_waker;
    use zendriver_types::CallId;

    fn page_target() -> Target {
        let info: TargetInfo = serde_json::from_value(serde_json::json!({
            "targetId": "TARGET",
            "type": "page",
            "title": "",
            "url": "about:blank",
            "attached": false
        }))
        .unwrap();
        Target::new(
            info,
            TargetConfig {
                ignore_https_errors: true,
                request_timeout: Duration::from_secs(30),
                navigation_timeout: Duration::from_secs(30),
            },
        )
    }

    fn ok_response() -> Response {
        Response {
            id: CallId::new(1),
            result: Some(serde_json::json!({})),
            error: None,
        }
    }

    fn frame_tree_response() -> Response {
        Response {
            id: CallId::new(1),
            result: Some(serde_json::json!({
                "frameTree": {
                    "frame": {"id": "MAIN", "url": "about:blank"}
                }
            })),
            error: None,
        }
    }

    #[test]
    fn concurrent_page_requests_collapse_onto_one_attach() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let now = Instant::now();
        let mut target = page_target();

        let (tx1, mut rx1) = oneshot_channel();
        let (tx2, mut rx2) = oneshot_channel();
        target.request_page(tx1);
        target.request_page(tx2);

        // exactly one attach goes on the wire, no matter how many callers
        match target.poll(&mut cx, now) {
            Some(TargetEvent::Request(req)) => {
                assert_eq!(req.method, "Target.attachToTarget");
                assert_eq!(req.params["flatten"], true);
            }
            other => panic!("expected attach request, got {other:?}"),
        }
        assert!(target.poll(&mut cx, now).is_none());

        target.set_session_id("SESSION".into());

        // drive the initialization chains to completion
        let mut seen = Vec::new();
        while let Some(event) = target.poll(&mut cx, now) {
            match event {
                TargetEvent::Request(req) => {
                    assert_eq!(req.session_id.as_deref(), Some("SESSION"));
                    let method = req.method.to_string();
                    let resp = if method == "Page.getFrameTree" {
                        frame_tree_response()
                    } else {
                        ok_response()
                    };
                    target.on_response(resp, &method);
                    seen.push(method);
                }
                other => panic!("unexpected event during init: {other:?}"),
            }
        }
        assert_eq!(
            seen,
            vec![
                "Page.enable",
                "Page.getFrameTree",
                "Page.setLifecycleEventsEnabled",
                "Runtime.enable",
                "Network.enable",
                "Security.setIgnoreCertificateErrors",
            ]
        );

        // both callers receive a handle to the same session
        let tab1 = rx1.try_recv().unwrap().expect("first caller served").unwrap();
        let tab2 = rx2.try_recv().unwrap().expect("second caller served").unwrap();
        assert_eq!(tab1.session_id(), tab2.session_id());
        assert_eq!(tab1.session_id().as_str(), "SESSION");

        // a later caller is served straight from the existing page
        let (tx3, mut rx3) = oneshot_channel();
        target.request_page(tx3);
        let tab3 = rx3.try_recv().unwrap().expect("third caller served").unwrap();
        assert_eq!(tab3.session_id(), tab1.session_id());
    }

    #[test]
    fn destroyed_target_fails_waiters_with_target_gone() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let now = Instant::now();
        let mut target = page_target();

        let (tx, mut rx) = oneshot_channel();
        target.request_page(tx);
        let _ = target.poll(&mut cx, now);

        assert!(target.closed().is_none());
        match rx.try_recv().unwrap().expect("waiter resolved") {
            Err(CdpError::TargetGone(ctx)) => {
                assert_eq!(ctx.target_id.as_deref(), Some("TARGET"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // and new callers fail immediately
        let (tx, mut rx) = oneshot_channel();
        target.request_page(tx);
        assert!(matches!(
            rx.try_recv().unwrap().expect("resolved"),
            Err(CdpError::TargetGone(_))
        ));
    }
}
