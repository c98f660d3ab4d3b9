use std::collections::HashMap;
use std::pin::Pin;
use std::time::{Duration, Instant};

use fnv::FnvHashMap;
use futures::channel::mpsc::Receiver;
use futures::channel::oneshot::Sender as OneshotSender;
use futures::stream::{Fuse, Stream, StreamExt};
use futures::task::{Context, Poll};

use zendriver_types::{CallId, Message, Method, MethodId, Request as CdpRequest, Response};

use crate::cmd::{to_command_response, CommandMessage};
use crate::conn::Connection;
use crate::error::{CdpError, ErrorContext, Result};
use crate::handler::frame::{FrameRequestedNavigation, NavigationError, NavigationId, NavigationOk};
use crate::handler::job::PeriodicJob;
use crate::handler::session::Session;
use crate::handler::target::{Target, TargetConfig, TargetEvent};
use crate::listeners::{EventHandlerRequest, EventListenerRequest, EventListeners};
use crate::tab::Tab;
use zendriver_cdp::cdp::browser_protocol::browser::CloseParams;
use zendriver_cdp::cdp::browser_protocol::page::NavigateParams;
use zendriver_cdp::cdp::browser_protocol::target::{
    CreateTargetParams, GetTargetsParams, SessionId, SetDiscoverTargetsParams, TargetId,
    TargetInfo,
};
use zendriver_cdp::cdp::{CdpEvent, CdpEventMessage};

pub(crate) mod frame;
mod job;
mod session;
pub(crate) mod target;

/// Default window a command response must arrive in.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default window a navigation must complete in.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the handler wakes itself up to sweep deadlines even when the
/// socket is quiet.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How the handler configures targets.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Whether targets should ignore https errors.
    pub ignore_https_errors: bool,
    /// Response window for any single cdp command.
    pub request_timeout: Duration,
    /// Window for a whole navigation to finish loading.
    pub navigation_timeout: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            ignore_https_errors: true,
            request_timeout: REQUEST_TIMEOUT,
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }
}

impl HandlerConfig {
    fn target_config(&self) -> TargetConfig {
        TargetConfig {
            ignore_https_errors: self.ignore_https_errors,
            request_timeout: self.request_timeout,
            navigation_timeout: self.navigation_timeout,
        }
    }
}

/// The handler that monitors the state of the chromium browser and drives all
/// requests and events over the single websocket.
///
/// It is a [`Stream`] the caller must poll continuously; all protocol state
/// (the in-flight command table, the target table, the session map, the event
/// bus) lives on whichever task does so.
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct Handler {
    /// Commands awaiting a response, with the method and the instant the
    /// request was put on the wire.
    pending_commands: FnvHashMap<CallId, (PendingRequest, MethodId, Instant)>,
    from_browser: Fuse<Receiver<HandlerMessage>>,
    /// Used to loop over all targets in a consistent manner.
    target_ids: Vec<TargetId>,
    /// The targets the browser reported, keyed by their id.
    targets: HashMap<TargetId, Target>,
    /// Page waiters keyed by the target they wait for, parked until the
    /// `Target.targetCreated` event arrives.
    pending_create_waiters: HashMap<TargetId, Vec<OneshotSender<Result<Tab>>>>,
    /// Currently queued navigations.
    navigations: FnvHashMap<NavigationId, NavigationRequest>,
    /// All active sessions. Exactly one per attached target (flatten mode).
    sessions: HashMap<String, Session>,
    /// The websocket connection to the chromium instance.
    conn: Connection<CdpEventMessage>,
    /// Periodic deadline sweep.
    tick: PeriodicJob,
    next_navigation_id: usize,
    config: HandlerConfig,
    event_listeners: EventListeners,
    /// Set once `Browser.close` was acknowledged or the socket died.
    closing: bool,
    /// Everything has been torn down; the stream is finished.
    disposed: bool,
}

impl Handler {
    /// Create a new `Handler` that drives the connection and listens for
    /// messages on the receiver `rx`.
    ///
    /// Immediately turns on target discovery and requests the already
    /// existing targets.
    pub(crate) fn new(
        mut conn: Connection<CdpEventMessage>,
        rx: Receiver<HandlerMessage>,
        config: HandlerConfig,
    ) -> Self {
        let mut pending_commands = FnvHashMap::default();

        let discover = SetDiscoverTargetsParams::new(true);
        if let Ok(call_id) = conn.submit_command(
            discover.identifier(),
            None,
            serde_json::to_value(&discover).expect("discover params serialize"),
        ) {
            pending_commands.insert(
                call_id,
                (PendingRequest::Init, discover.identifier(), Instant::now()),
            );
        }

        let get_targets = GetTargetsParams::default();
        if let Ok(call_id) = conn.submit_command(
            get_targets.identifier(),
            None,
            serde_json::to_value(&get_targets).expect("get targets params serialize"),
        ) {
            pending_commands.insert(
                call_id,
                (
                    PendingRequest::GetTargets(None),
                    get_targets.identifier(),
                    Instant::now(),
                ),
            );
        }

        Self {
            pending_commands,
            from_browser: rx.fuse(),
            target_ids: Default::default(),
            targets: Default::default(),
            pending_create_waiters: Default::default(),
            navigations: Default::default(),
            sessions: Default::default(),
            conn,
            tick: PeriodicJob::new(TICK_INTERVAL),
            next_navigation_id: 0,
            config,
            event_listeners: Default::default(),
            closing: false,
            disposed: false,
        }
    }

    /// Received a response to a previously submitted request.
    fn on_response(&mut self, resp: Response) {
        let Some((req, method, _)) = self.pending_commands.remove(&resp.id) else {
            tracing::warn!(id = %resp.id, "dropping orphan response");
            return;
        };
        match req {
            PendingRequest::CreateTarget(tx) => {
                match to_command_response::<CreateTargetParams>(resp, method) {
                    Ok(resp) => {
                        let target_id = resp.result.target_id.clone();
                        if let Some(target) = self.targets.get_mut(&target_id) {
                            target.request_page(tx);
                        } else {
                            // response outran the targetCreated event
                            self.pending_create_waiters
                                .entry(target_id)
                                .or_default()
                                .push(tx);
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                    }
                }
            }
            PendingRequest::GetTargets(tx) => {
                match to_command_response::<GetTargetsParams>(resp, method) {
                    Ok(resp) => {
                        let infos = resp.result.target_infos;
                        for info in &infos {
                            self.on_target_created(info.clone());
                        }
                        if let Some(tx) = tx {
                            let _ = tx.send(Ok(infos));
                        }
                    }
                    Err(err) => {
                        if let Some(tx) = tx {
                            let _ = tx.send(Err(err));
                        }
                    }
                }
            }
            PendingRequest::Init => {
                if let Some(err) = resp.error {
                    tracing::warn!(method = %method, "startup command failed: {err}");
                }
            }
            PendingRequest::Navigate(id) => self.on_navigation_response(id, resp),
            PendingRequest::ExternalCommand(tx) => {
                if tx.send(Ok(resp)).is_err() {
                    tracing::debug!(method = %method, "waiter cancelled before the reply arrived");
                }
            }
            PendingRequest::InternalCommand(target_id) => {
                if let Some(target) = self.targets.get_mut(&target_id) {
                    target.on_response(resp, method.as_ref());
                }
            }
            PendingRequest::CloseBrowser(tx) => {
                self.closing = true;
                let _ = tx.send(Ok(()));
            }
        }
    }

    /// received a response to a navigation request like `Page.navigate`
    fn on_navigation_response(&mut self, id: NavigationId, resp: Response) {
        if let Some(NavigationRequest::Navigate(mut nav)) = self.navigations.remove(&id) {
            if let Some(err) = resp.error {
                // the navigation request itself was rejected; the lifecycle
                // will never complete
                let _ = nav.tx.send(Err(err.into()));
            } else if nav.navigated {
                let _ = nav.tx.send(Ok(resp));
            } else {
                nav.set_response(resp);
                self.navigations.insert(id, NavigationRequest::Navigate(nav));
            }
        }
    }

    /// A navigation lifecycle completed (or failed for good).
    fn on_navigation_lifecycle_completed(&mut self, res: Result<NavigationOk, NavigationError>) {
        match res {
            Ok(ok) => {
                let id = *ok.navigation_id();
                if let Some(NavigationRequest::Navigate(mut nav)) = self.navigations.remove(&id) {
                    if let Some(resp) = nav.response.take() {
                        let _ = nav.tx.send(Ok(resp));
                    } else {
                        nav.set_navigated();
                        self.navigations.insert(id, NavigationRequest::Navigate(nav));
                    }
                }
            }
            Err(err) => {
                if let Some(NavigationRequest::Navigate(nav)) =
                    self.navigations.remove(err.navigation_id())
                {
                    let _ = nav.tx.send(Err(err.into()));
                }
            }
        }
    }

    /// Submit a command initiated via a user channel.
    fn submit_external_command(&mut self, msg: CommandMessage, now: Instant) -> Result<()> {
        let call_id = self
            .conn
            .submit_command(msg.method.clone(), msg.session_id, msg.params)?;
        self.pending_commands.insert(
            call_id,
            (PendingRequest::ExternalCommand(msg.sender), msg.method, now),
        );
        Ok(())
    }

    /// Submit a request initiated by a target itself (initialization).
    fn submit_internal_command(
        &mut self,
        target_id: TargetId,
        req: CdpRequest,
        now: Instant,
    ) -> Result<()> {
        let call_id = self.conn.submit_command(
            req.method.clone(),
            req.session_id.map(Into::into),
            req.params,
        )?;
        self.pending_commands.insert(
            call_id,
            (PendingRequest::InternalCommand(target_id), req.method, now),
        );
        Ok(())
    }

    /// Send the navigation request over the wire and register its waiter.
    fn submit_navigation(&mut self, id: NavigationId, req: CdpRequest, now: Instant) {
        if let Ok(call_id) = self.conn.submit_command(
            req.method.clone(),
            req.session_id.map(Into::into),
            req.params,
        ) {
            self.pending_commands
                .insert(call_id, (PendingRequest::Navigate(id), req.method, now));
        }
    }

    fn submit_fetch_targets(&mut self, tx: OneshotSender<Result<Vec<TargetInfo>>>, now: Instant) {
        let msg = GetTargetsParams::default();
        let method = msg.identifier();
        match self.conn.submit_command(
            method.clone(),
            None,
            serde_json::to_value(&msg).expect("get targets params serialize"),
        ) {
            Ok(call_id) => {
                self.pending_commands
                    .insert(call_id, (PendingRequest::GetTargets(Some(tx)), method, now));
            }
            Err(err) => {
                let _ = tx.send(Err(err.into()));
            }
        }
    }

    fn submit_close(&mut self, tx: OneshotSender<Result<()>>, now: Instant) {
        let msg = CloseParams::default();
        let method = msg.identifier();
        match self
            .conn
            .submit_command(method.clone(), None, serde_json::json!({}))
        {
            Ok(call_id) => {
                self.pending_commands
                    .insert(call_id, (PendingRequest::CloseBrowser(tx), method, now));
            }
            Err(err) => {
                let _ = tx.send(Err(err.into()));
            }
        }
    }

    /// Create a new target; its page handle is delivered once initialized.
    fn create_page(&mut self, params: CreateTargetParams, tx: OneshotSender<Result<Tab>>) {
        let method = params.identifier();
        match serde_json::to_value(params) {
            Ok(params) => match self.conn.submit_command(method.clone(), None, params) {
                Ok(call_id) => {
                    self.pending_commands.insert(
                        call_id,
                        (PendingRequest::CreateTarget(tx), method, Instant::now()),
                    );
                }
                Err(err) => {
                    let _ = tx.send(Err(err.into()));
                }
            },
            Err(err) => {
                let _ = tx.send(Err(err.into()));
            }
        }
    }

    /// Park a page waiter on the target, attaching it on first use.
    fn get_page(&mut self, target_id: TargetId, tx: OneshotSender<Result<Tab>>) {
        match self.targets.get_mut(&target_id) {
            Some(target) => target.request_page(tx),
            None => {
                let _ = tx.send(Err(CdpError::TargetGone(ErrorContext::for_target(target_id))));
            }
        }
    }

    /// Process a command issued by a tab handle. Navigations are held back
    /// until the page finished loading; everything else goes straight out.
    fn on_target_message(&mut self, target: &mut Target, msg: CommandMessage, now: Instant) {
        if msg.is_navigation() {
            let (req, tx) = msg.split();
            let id = self.next_navigation_id();
            target.goto(FrameRequestedNavigation::new(id, req), now);
            self.navigations.insert(
                id,
                NavigationRequest::Navigate(NavigationInProgress::new(tx)),
            );
        } else if let Err(err) = self.submit_external_command(msg, now) {
            tracing::warn!("failed to submit command: {err}");
        }
    }

    fn next_navigation_id(&mut self) -> NavigationId {
        let id = NavigationId(self.next_navigation_id);
        self.next_navigation_id = self.next_navigation_id.wrapping_add(1);
        id
    }

    /// Process an incoming event read from the websocket.
    fn on_event(&mut self, event: CdpEventMessage) {
        // session-scoped frame bookkeeping
        if let Some(session_id) = event.session_id.as_deref() {
            if let Some(target_id) = self.sessions.get(session_id).map(|s| s.target_id().clone()) {
                if let Some(target) = self.targets.get_mut(&target_id) {
                    target.on_event(&event);
                }
            }
        }

        // publish before lifecycle mutation so a session still observes its
        // own terminal event; the mutation below then closes its sinks
        let arc = event.params.clone().into_event();
        self.event_listeners
            .publish(event.method.as_ref(), event.session_id.as_deref(), &arc);

        match event.params {
            CdpEvent::TargetTargetCreated(ev) => self.on_target_created(ev.target_info),
            CdpEvent::TargetTargetInfoChanged(ev) => self.on_target_info_changed(ev.target_info),
            CdpEvent::TargetAttachedToTarget(ev) => {
                self.on_attached_to_target(ev.session_id, ev.target_info.target_id)
            }
            CdpEvent::TargetDetachedFromTarget(ev) => self.on_detached_from_target(&ev.session_id),
            CdpEvent::TargetTargetDestroyed(ev) => self.on_target_destroyed(&ev.target_id),
            CdpEvent::TargetTargetCrashed(ev) => {
                tracing::warn!(target_id = %ev.target_id, status = %ev.status, "target crashed");
                self.on_target_destroyed(&ev.target_id);
            }
            _ => {}
        }
    }

    /// A new target exists in the browser; track it.
    fn on_target_created(&mut self, info: TargetInfo) {
        let target_id = info.target_id.clone();
        if let Some(target) = self.targets.get_mut(&target_id) {
            target.on_info_changed(info);
            return;
        }
        let mut target = Target::new(info, self.config.target_config());
        if let Some(waiters) = self.pending_create_waiters.remove(&target_id) {
            for tx in waiters {
                target.request_page(tx);
            }
        }
        self.target_ids.push(target_id.clone());
        self.targets.insert(target_id, target);
    }

    fn on_target_info_changed(&mut self, info: TargetInfo) {
        if let Some(target) = self.targets.get_mut(&info.target_id) {
            target.on_info_changed(info);
        }
    }

    /// A session was attached to a target.
    fn on_attached_to_target(&mut self, session_id: SessionId, target_id: TargetId) {
        if let Some(target) = self.targets.get_mut(&target_id) {
            target.set_session_id(session_id.clone());
        }
        self.sessions.insert(
            session_id.as_str().to_string(),
            Session::new(session_id, target_id),
        );
    }

    /// The session was detached from its target. After this returns no
    /// further event for that sessionId is published.
    fn on_detached_from_target(&mut self, session_id: &SessionId) {
        if let Some(session) = self.sessions.remove(session_id.as_str()) {
            if let Some(target) = self.targets.get_mut(session.target_id()) {
                target.clear_session();
            }
        }
        self.event_listeners.close_session(session_id);
    }

    /// The target was destroyed in the browser; every handle bound to it is
    /// now invalid.
    fn on_target_destroyed(&mut self, target_id: &TargetId) {
        if let Some(mut target) = self.targets.remove(target_id) {
            if let Some(nav_id) = target.closed() {
                if let Some(NavigationRequest::Navigate(nav)) = self.navigations.remove(&nav_id) {
                    let _ = nav
                        .tx
                        .send(Err(CdpError::TargetGone(ErrorContext::for_target(
                            target_id.clone(),
                        ))));
                }
            }
            if let Some(session_id) = target.session_id().cloned() {
                self.sessions.remove(session_id.as_str());
                self.event_listeners.close_session(&session_id);
            }
            self.target_ids.retain(|id| id != target_id);
        }
        self.pending_create_waiters.remove(target_id);
    }

    /// Remove all commands that outlived the request timeout and fail their
    /// waiters, so no waiter sits in the in-flight table forever.
    fn evict_timed_out_commands(&mut self, now: Instant) {
        let timed_out: Vec<_> = self
            .pending_commands
            .iter()
            .filter(|(_, (_, _, sent))| now > *sent + self.config.request_timeout)
            .map(|(k, _)| *k)
            .collect();

        for call in timed_out {
            if let Some((req, method, _)) = self.pending_commands.remove(&call) {
                tracing::warn!(method = %method, "command timed out");
                let timed_out = || CdpError::Timeout(ErrorContext::for_method(method.clone()));
                match req {
                    PendingRequest::Init => {}
                    PendingRequest::CreateTarget(tx) => {
                        let _ = tx.send(Err(timed_out()));
                    }
                    PendingRequest::GetTargets(tx) => {
                        if let Some(tx) = tx {
                            let _ = tx.send(Err(timed_out()));
                        }
                    }
                    PendingRequest::Navigate(id) => {
                        if let Some(NavigationRequest::Navigate(nav)) = self.navigations.remove(&id)
                        {
                            let _ = nav.tx.send(Err(timed_out()));
                        }
                    }
                    PendingRequest::ExternalCommand(tx) => {
                        let _ = tx.send(Err(timed_out()));
                    }
                    PendingRequest::InternalCommand(_) => {}
                    PendingRequest::CloseBrowser(tx) => {
                        let _ = tx.send(Err(timed_out()));
                    }
                }
            }
        }
    }

    /// Tear everything down: every in-flight waiter resolves with
    /// `ConnectionClosed`, every subscription terminates, every tab handle is
    /// dead. Terminal.
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.closing = true;

        for (_, (req, method, _)) in self.pending_commands.drain() {
            let closed = || CdpError::ConnectionClosed(ErrorContext::for_method(method.clone()));
            match req {
                PendingRequest::CreateTarget(tx) => {
                    let _ = tx.send(Err(closed()));
                }
                PendingRequest::GetTargets(Some(tx)) => {
                    let _ = tx.send(Err(closed()));
                }
                PendingRequest::Init
                | PendingRequest::GetTargets(None)
                | PendingRequest::InternalCommand(_) => {}
                PendingRequest::Navigate(_) => {}
                PendingRequest::ExternalCommand(tx) => {
                    let _ = tx.send(Err(closed()));
                }
                PendingRequest::CloseBrowser(tx) => {
                    let _ = tx.send(Ok(()));
                }
            }
        }
        for (_, nav) in self.navigations.drain() {
            let NavigationRequest::Navigate(nav) = nav;
            let _ = nav
                .tx
                .send(Err(CdpError::ConnectionClosed(ErrorContext::for_method(
                    NavigateParams::IDENTIFIER,
                ))));
        }
        for (target_id, waiters) in std::mem::take(&mut self.pending_create_waiters) {
            for tx in waiters {
                let _ = tx.send(Err(CdpError::ConnectionClosed(ErrorContext::for_target(
                    target_id.clone(),
                ))));
            }
        }
        for (_, mut target) in self.targets.drain() {
            target.dispose();
        }
        self.target_ids.clear();
        self.sessions.clear();
        self.event_listeners.close_all();
    }
}

impl Stream for Handler {
    type Item = Result<()>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let pin = self.get_mut();

        if pin.disposed {
            return Poll::Ready(None);
        }

        loop {
            let now = Instant::now();

            while let Poll::Ready(Some(msg)) = Pin::new(&mut pin.from_browser).poll_next(cx) {
                match msg {
                    HandlerMessage::Command(cmd) => {
                        if let Err(err) = pin.submit_external_command(cmd, now) {
                            tracing::warn!("failed to submit command: {err}");
                        }
                    }
                    HandlerMessage::CreatePage(params, tx) => pin.create_page(params, tx),
                    HandlerMessage::GetPage(target_id, tx) => pin.get_page(target_id, tx),
                    HandlerMessage::FetchTargets(tx) => pin.submit_fetch_targets(tx, now),
                    HandlerMessage::AddEventListener(req) => {
                        pin.event_listeners.add_listener(req)
                    }
                    HandlerMessage::AddEventHandler(req) => pin.event_listeners.add_handler(req),
                    HandlerMessage::CloseBrowser(tx) => pin.submit_close(tx, now),
                }
            }

            for n in (0..pin.target_ids.len()).rev() {
                let target_id = pin.target_ids.swap_remove(n);
                if let Some((id, mut target)) = pin.targets.remove_entry(&target_id) {
                    while let Some(event) = target.poll(cx, now) {
                        match event {
                            TargetEvent::Request(req) => {
                                let _ =
                                    pin.submit_internal_command(target.target_id().clone(), req, now);
                            }
                            TargetEvent::Command(msg) => {
                                pin.on_target_message(&mut target, msg, now);
                            }
                            TargetEvent::NavigationRequest(id, req) => {
                                pin.submit_navigation(id, req, now);
                            }
                            TargetEvent::NavigationResult(res) => {
                                pin.on_navigation_lifecycle_completed(res);
                            }
                            TargetEvent::AddEventListener(req) => {
                                pin.event_listeners.add_listener(req);
                            }
                            TargetEvent::AddEventHandler(req) => {
                                pin.event_listeners.add_handler(req);
                            }
                        }
                    }
                    pin.targets.insert(id, target);
                    pin.target_ids.push(target_id);
                }
            }

            let mut done = true;

            while let Poll::Ready(msg) = Pin::new(&mut pin.conn).poll_next(cx) {
                match msg {
                    Some(Ok(Message::Response(resp))) => {
                        pin.on_response(resp);
                        done = false;
                    }
                    Some(Ok(Message::Event(ev))) => {
                        pin.on_event(ev);
                        done = false;
                    }
                    Some(Err(err @ CdpError::Serde(_))) => {
                        // a single malformed frame does not poison the
                        // connection
                        tracing::error!("failed to decode frame: {err}");
                        done = false;
                    }
                    Some(Err(err)) => {
                        tracing::error!("connection error: {err}");
                        pin.dispose();
                        return Poll::Ready(Some(Err(err)));
                    }
                    None => {
                        pin.dispose();
                        return Poll::Ready(None);
                    }
                }
            }

            if pin.tick.is_ready(cx) {
                pin.evict_timed_out_commands(now);
                // loop once more so targets sweep their own deadlines
                done = false;
            }

            if pin.closing {
                pin.dispose();
                return Poll::Ready(None);
            }

            if done {
                return Poll::Pending;
            }
        }
    }
}

/// Wraps the sender half of the channel who requested a navigation
#[derive(Debug)]
struct NavigationInProgress<T> {
    /// Whether the navigation lifecycle has completed.
    navigated: bool,
    /// The response to the issued navigation request.
    response: Option<Response>,
    /// Sender who initiated the navigation request.
    tx: OneshotSender<T>,
}

impl<T> NavigationInProgress<T> {
    fn new(tx: OneshotSender<T>) -> Self {
        Self {
            navigated: false,
            response: None,
            tx,
        }
    }

    fn set_response(&mut self, resp: Response) {
        self.response = Some(resp);
    }

    fn set_navigated(&mut self) {
        self.navigated = true;
    }
}

/// Request type for navigation.
///
/// Navigation requests are not completed when the raw `Page.navigate`
/// response arrives but only after the target observed the page finishing to
/// load, which comes later.
#[derive(Debug)]
enum NavigationRequest {
    Navigate(NavigationInProgress<Result<Response>>),
}

/// The different kinds of submitted requests waiting for a response.
#[derive(Debug)]
enum PendingRequest {
    /// A fire-and-forget startup command; only failures are interesting.
    Init,
    /// Creating a new target; results in a page handle once initialized.
    CreateTarget(OneshotSender<Result<Tab>>),
    /// Refreshing the target table; `None` for the startup population.
    GetTargets(Option<OneshotSender<Result<Vec<TargetInfo>>>>),
    /// A navigation; completion is gated on the load lifecycle.
    Navigate(NavigationId),
    /// A command received via a user channel.
    ExternalCommand(OneshotSender<Result<Response>>),
    /// A request initiated by a target itself (initialization commands).
    InternalCommand(TargetId),
    /// The request to close the browser.
    CloseBrowser(OneshotSender<Result<()>>),
}

/// Messages used to communicate with the handler from the user-facing
/// handles.
#[derive(Debug)]
pub(crate) enum HandlerMessage {
    Command(CommandMessage),
    CreatePage(CreateTargetParams, OneshotSender<Result<Tab>>),
    GetPage(TargetId, OneshotSender<Result<Tab>>),
    FetchTargets(OneshotSender<Result<Vec<TargetInfo>>>),
    AddEventListener(EventListenerRequest),
    AddEventHandler(EventHandlerRequest),
    CloseBrowser(OneshotSender<Result<()>>),
}
