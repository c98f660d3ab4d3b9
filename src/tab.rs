use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::channel::mpsc::Sender;
use futures::channel::oneshot::channel as oneshot_channel;
use futures::SinkExt;

use zendriver_types::{Command, CommandResponse, MethodId};

use crate::cmd::{to_command_response, CommandMessage};
use crate::element::Element;
use crate::error::{CdpError, ErrorContext, Result};
use crate::fetch::{RequestHandler, RequestInterceptor};
use crate::handler::target::TargetMessage;
use crate::js::EvaluationResult;
use crate::keys;
use crate::listeners::{
    subscription, subscription_raw, EventCallback, EventHandlerRequest, EventListenerRequest,
    EventStream, SessionFilter,
};
use zendriver_cdp::cdp::browser_protocol::dom::{
    GetDocumentParams, GetOuterHtmlParams, Node, QuerySelectorAllParams, QuerySelectorParams,
};
use zendriver_cdp::cdp::browser_protocol::fetch::{
    EnableParams as FetchEnableParams, RequestPattern,
};
use zendriver_cdp::cdp::browser_protocol::input::{
    DispatchMouseEventParams, InsertTextParams, MouseButton, MouseEventType,
};
use zendriver_cdp::cdp::browser_protocol::page::{
    BringToFrontParams, GetFrameTreeParams, GetNavigationHistoryParams, NavigateParams,
    NavigateToHistoryEntryParams, ReloadParams,
};
use zendriver_cdp::cdp::browser_protocol::target::{
    ActivateTargetParams, CloseTargetParams, DetachFromTargetParams, SessionId, TargetId,
};
use zendriver_cdp::cdp::js_protocol::runtime::{EvaluateParams, ExceptionDetails};
use zendriver_cdp::cdp::EventKind;
use zendriver_types::CdpJsonEventMessage;

/// Default deadline for `wait_for`.
pub const WAIT_FOR_TIMEOUT: Duration = Duration::from_secs(10);
/// How often `wait_for` re-queries the page.
const WAIT_FOR_POLL: Duration = Duration::from_millis(100);
/// How long `close` waits for the destroyed notification.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// The inner state of a tab handle, shared with every [`Element`] spawned
/// from it. Commands travel through the target's channel, session-scoped.
///
/// The session is interior-mutable: a tab outlives its session across a
/// same-target reattach, the target simply rebinds the new id.
#[derive(Debug)]
pub(crate) struct TabInner {
    target_id: TargetId,
    session_id: std::sync::Mutex<SessionId>,
    commands: Sender<TargetMessage>,
    /// Flipped by the handler when the target is destroyed.
    gone: Arc<AtomicBool>,
    navigation_timeout: Duration,
}

impl TabInner {
    pub(crate) fn new(
        target_id: TargetId,
        session_id: SessionId,
        commands: Sender<TargetMessage>,
        gone: Arc<AtomicBool>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            target_id,
            session_id: std::sync::Mutex::new(session_id),
            commands,
            gone,
            navigation_timeout,
        }
    }

    pub(crate) fn target_id(&self) -> &TargetId {
        &self.target_id
    }

    pub(crate) fn session_id(&self) -> SessionId {
        self.session_id.lock().expect("session id poisoned").clone()
    }

    /// Rebind the session after a same-target reattach.
    pub(crate) fn set_session(&self, session_id: SessionId) {
        *self.session_id.lock().expect("session id poisoned") = session_id;
    }

    pub(crate) fn sender(&self) -> Sender<TargetMessage> {
        self.commands.clone()
    }

    fn dead_error(&self) -> CdpError {
        let ctx = ErrorContext::for_target(self.target_id.clone());
        if self.gone.load(Ordering::Relaxed) {
            CdpError::TargetGone(ctx)
        } else {
            CdpError::ConnectionClosed(ctx)
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.gone.load(Ordering::Relaxed) {
            Err(self.dead_error())
        } else {
            Ok(())
        }
    }

    /// Execute a command scoped to this tab's session.
    pub(crate) async fn execute<T: Command>(&self, cmd: T) -> Result<CommandResponse<T::Response>> {
        self.execute_with_session(cmd, Some(self.session_id()))
            .await
    }

    /// Execute a command with an explicit session scope; `None` addresses the
    /// browser itself.
    pub(crate) async fn execute_with_session<T: Command>(
        &self,
        cmd: T,
        session_id: Option<SessionId>,
    ) -> Result<CommandResponse<T::Response>> {
        self.ensure_alive()?;
        let (tx, rx) = oneshot_channel();
        let method = cmd.identifier();
        let msg = CommandMessage::with_session(cmd, tx, session_id)?;

        self.commands
            .clone()
            .send(TargetMessage::Command(msg))
            .await
            .map_err(|_| self.dead_error())?;
        let resp = rx.await.map_err(|_| self.dead_error())??;
        to_command_response::<T>(resp, method)
    }

    pub(crate) async fn add_listener(&self, req: EventListenerRequest) -> Result<()> {
        self.ensure_alive()?;
        self.commands
            .clone()
            .send(TargetMessage::AddEventListener(req))
            .await
            .map_err(|_| self.dead_error())
    }

    async fn add_handler(&self, req: EventHandlerRequest) -> Result<()> {
        self.ensure_alive()?;
        self.commands
            .clone()
            .send(TargetMessage::AddEventHandler(req))
            .await
            .map_err(|_| self.dead_error())
    }

    pub(crate) fn is_gone(&self) -> bool {
        self.gone.load(Ordering::Relaxed)
    }
}

/// The user-facing handle for a page target.
///
/// A `Tab` stays cheap to clone; all clones drive the same page. Once the
/// underlying target is destroyed every operation fails with
/// [`CdpError::TargetGone`].
#[derive(Debug, Clone)]
pub struct Tab {
    inner: Arc<TabInner>,
}

impl From<Arc<TabInner>> for Tab {
    fn from(inner: Arc<TabInner>) -> Self {
        Self { inner }
    }
}

impl Tab {
    /// The identifier of the target this tab drives.
    pub fn target_id(&self) -> &TargetId {
        &self.inner.target_id
    }

    /// The identifier of the session this tab is currently attached
    /// through.
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id()
    }

    /// Execute a command scoped to this tab's session.
    pub async fn execute<T: Command>(&self, cmd: T) -> Result<CommandResponse<T::Response>> {
        self.inner.execute(cmd).await
    }

    /// Navigate to the given URL.
    ///
    /// Resolves once the main frame stopped loading, or fails with
    /// [`CdpError::Timeout`] after the default navigation deadline. A second
    /// `get` while this one is in flight supersedes it.
    pub async fn get(&self, url: impl Into<String>) -> Result<&Self> {
        self.get_with_timeout(url, self.inner.navigation_timeout)
            .await
    }

    /// Navigate with a caller-supplied deadline.
    pub async fn get_with_timeout(
        &self,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<&Self> {
        let params = NavigateParams::new(url);
        let resp = tokio::time::timeout(timeout, self.execute(params))
            .await
            .map_err(|_| {
                CdpError::Timeout(
                    ErrorContext::for_method(NavigateParams::IDENTIFIER)
                        .with_session(self.inner.session_id()),
                )
            })??;
        if let Some(err) = resp.result.error_text.clone() {
            return Err(CdpError::ChromeMessage(err));
        }
        Ok(self)
    }

    /// Reload the page, bypassing nothing.
    pub async fn reload(&self) -> Result<&Self> {
        self.execute(ReloadParams::default()).await?;
        Ok(self)
    }

    /// Navigate one entry back in this tab's history.
    pub async fn back(&self) -> Result<&Self> {
        self.history_step(-1).await?;
        Ok(self)
    }

    /// Navigate one entry forward in this tab's history.
    pub async fn forward(&self) -> Result<&Self> {
        self.history_step(1).await?;
        Ok(self)
    }

    async fn history_step(&self, delta: i64) -> Result<()> {
        let history = self
            .execute(GetNavigationHistoryParams::default())
            .await?
            .result;
        let index = history.current_index + delta;
        let entry = usize::try_from(index)
            .ok()
            .and_then(|index| history.entries.get(index))
            .ok_or_else(|| CdpError::msg("no history entry to navigate to"))?;
        self.execute(NavigateToHistoryEntryParams::new(entry.id))
            .await?;
        Ok(())
    }

    /// The current URL of the main frame.
    pub async fn url(&self) -> Result<String> {
        let resp = self.execute(GetFrameTreeParams::default()).await?;
        Ok(resp.result.frame_tree.frame.url)
    }

    /// The title of the document.
    pub async fn title(&self) -> Result<String> {
        self.evaluate("document.title").await?.into_value()
    }

    /// The full serialized HTML of the page.
    pub async fn content(&self) -> Result<String> {
        let root = self.document().await?;
        let resp = self
            .execute(GetOuterHtmlParams::with_backend_node_id(
                root.backend_node_id,
            ))
            .await?;
        Ok(resp.result.outer_html)
    }

    /// Evaluates the expression on the page's global object and returns the
    /// result as a neutral value tree, or an opaque object reference when it
    /// has no json representation. Promises are awaited.
    pub async fn evaluate(&self, expression: impl Into<String>) -> Result<EvaluationResult> {
        let mut params = EvaluateParams::new(expression);
        params.return_by_value = Some(true);
        params.await_promise = Some(true);
        self.evaluate_params(params).await
    }

    /// Evaluates fully caller-specified parameters.
    pub async fn evaluate_params(&self, params: EvaluateParams) -> Result<EvaluationResult> {
        let resp = self.execute(params).await?.result;
        if let Some(details) = resp.exception_details {
            return Err(CdpError::Evaluation(format_exception(&details)));
        }
        Ok(EvaluationResult::new(
            resp.result,
            self.inner.session_id(),
            self.inner.sender(),
        ))
    }

    /// The root document node.
    pub async fn document(&self) -> Result<Node> {
        let resp = self.execute(GetDocumentParams::default()).await?;
        Ok(resp.result.root)
    }

    /// Returns the first element matching the given CSS selector.
    pub async fn query(&self, selector: impl Into<String>) -> Result<Element> {
        let selector = selector.into();
        let root = self.document().await?;
        let resp = self
            .execute(QuerySelectorParams::new(root.node_id, selector.clone()))
            .await?;
        if resp.result.node_id.inner() == 0 {
            return Err(CdpError::NotFound { selector });
        }
        Element::new(Arc::clone(&self.inner), resp.result.node_id).await
    }

    /// Returns all elements matching the given CSS selector.
    pub async fn query_all(&self, selector: impl Into<String>) -> Result<Vec<Element>> {
        let root = self.document().await?;
        let resp = self
            .execute(QuerySelectorAllParams::new(root.node_id, selector))
            .await?;
        let mut elements = Vec::with_capacity(resp.result.node_ids.len());
        for node_id in resp.result.node_ids {
            elements.push(Element::new(Arc::clone(&self.inner), node_id).await?);
        }
        Ok(elements)
    }

    /// Repeatedly queries the selector until it matches or `timeout` (default
    /// 10 s) elapses.
    pub async fn wait_for(
        &self,
        selector: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let selector = selector.into();
        let deadline = tokio::time::Instant::now() + timeout.unwrap_or(WAIT_FOR_TIMEOUT);
        loop {
            match self.query(selector.clone()).await {
                Ok(element) => return Ok(element),
                Err(CdpError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CdpError::Timeout(ErrorContext::for_target(
                    self.inner.target_id.clone(),
                )));
            }
            tokio::time::sleep(WAIT_FOR_POLL).await;
        }
    }

    /// Moves the mouse to the viewport position.
    pub async fn mouse_move(&self, x: f64, y: f64) -> Result<&Self> {
        self.execute(DispatchMouseEventParams::new(
            MouseEventType::MouseMoved,
            x,
            y,
        ))
        .await?;
        Ok(self)
    }

    /// Performs a full left click at the viewport position: press, then
    /// release, acknowledged in order.
    pub async fn mouse_click(&self, x: f64, y: f64) -> Result<&Self> {
        self.execute(
            DispatchMouseEventParams::new(MouseEventType::MousePressed, x, y)
                .button(MouseButton::Left)
                .click_count(1),
        )
        .await?;
        self.execute(
            DispatchMouseEventParams::new(MouseEventType::MouseReleased, x, y)
                .button(MouseButton::Left)
                .click_count(1),
        )
        .await?;
        Ok(self)
    }

    /// Presses and releases a single key, e.g. `"Escape"`, `"Enter"` or a
    /// printable character.
    pub async fn key_press(&self, key: &str) -> Result<&Self> {
        let key = keys::resolve(key)?;
        for event in key.events() {
            self.execute(event).await?;
        }
        Ok(self)
    }

    /// Types text as a sequence of per-character key events, each
    /// acknowledged before the next is sent.
    pub async fn type_text(&self, text: &str) -> Result<&Self> {
        for c in text.chars() {
            for event in keys::for_char(c).events() {
                self.execute(event).await?;
            }
        }
        Ok(self)
    }

    /// Inserts text into the focused element without synthesizing key events,
    /// the way an IME would.
    pub async fn insert_text(&self, text: impl Into<String>) -> Result<&Self> {
        self.execute(InsertTextParams::new(text)).await?;
        Ok(self)
    }

    /// Activates (focuses) the target.
    pub async fn activate(&self) -> Result<&Self> {
        self.inner
            .execute_with_session(
                ActivateTargetParams::new(self.inner.target_id.clone()),
                None,
            )
            .await?;
        Ok(self)
    }

    /// Brings the page to front.
    pub async fn bring_to_front(&self) -> Result<&Self> {
        self.execute(BringToFrontParams::default()).await?;
        Ok(self)
    }

    /// Detaches the debugging session from this tab without closing it. No
    /// further event for the session is delivered once the detach
    /// notification is processed; the handle itself stays valid and
    /// reattaches on its next use through the browser.
    pub async fn detach(&self) -> Result<()> {
        self.inner
            .execute_with_session(
                DetachFromTargetParams::new(self.inner.session_id()),
                None,
            )
            .await?;
        Ok(())
    }

    /// Closes the target and waits until the browser confirmed its
    /// destruction.
    pub async fn close(self) -> Result<()> {
        self.inner
            .execute_with_session(CloseTargetParams::new(self.inner.target_id.clone()), None)
            .await?;
        let deadline = tokio::time::Instant::now() + CLOSE_TIMEOUT;
        while !self.inner.is_gone() {
            if tokio::time::Instant::now() >= deadline {
                return Err(CdpError::Timeout(ErrorContext::for_target(
                    self.inner.target_id.clone(),
                )));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(())
    }

    /// A stream of typed events from this tab's session.
    pub async fn event_stream<T: EventKind + Unpin>(&self) -> Result<EventStream<T>> {
        let (req, stream) =
            subscription::<T>(SessionFilter::Session(self.inner.session_id()));
        self.inner.add_listener(req).await?;
        Ok(stream)
    }

    /// A stream of raw json events for a method outside the typed set.
    pub async fn raw_event_stream(
        &self,
        method: impl Into<MethodId>,
    ) -> Result<EventStream<CdpJsonEventMessage>> {
        let (req, stream) = subscription_raw(
            method.into(),
            SessionFilter::Session(self.inner.session_id()),
        );
        self.inner.add_listener(req).await?;
        Ok(stream)
    }

    /// Attaches a fire-and-forget callback for a typed event kind on this
    /// tab's session. The callback must not block; a returned future is
    /// spawned onto the runtime.
    pub async fn add_event_handler<T: EventKind>(&self, callback: EventCallback) -> Result<()> {
        self.inner
            .add_handler(EventHandlerRequest {
                method: T::event_identifier(),
                filter: SessionFilter::Session(self.inner.session_id()),
                callback,
            })
            .await
    }

    /// Enables fetch interception for the given patterns and returns the
    /// stream of paused requests. Every yielded record must be resolved
    /// exactly once; unresolved records are auto-continued after a deadline.
    pub async fn intercept(&self, patterns: Vec<RequestPattern>) -> Result<RequestInterceptor> {
        // subscribe before enabling so no paused event is missed
        let events = self.event_stream().await?;
        self.execute(FetchEnableParams::new(patterns)).await?;
        Ok(RequestInterceptor::new(events, Arc::clone(&self.inner)))
    }

    /// Enables interception and drives the ordered handler chain on a
    /// background task: the first handler that resolves a record wins,
    /// later handlers never see it.
    pub async fn intercept_with(
        &self,
        patterns: Vec<RequestPattern>,
        handlers: Vec<Box<dyn RequestHandler>>,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let interceptor = self.intercept(patterns).await?;
        Ok(tokio::spawn(interceptor.run(handlers)))
    }

    /// Disables fetch interception.
    pub async fn disable_intercept(&self) -> Result<&Self> {
        self.execute(zendriver_cdp::cdp::browser_protocol::fetch::DisableParams::default())
            .await?;
        Ok(self)
    }
}

fn format_exception(details: &ExceptionDetails) -> String {
    details
        .exception
        .as_ref()
        .and_then(|obj| obj.description.clone())
        .unwrap_or_else(|| details.text.clone())
}
