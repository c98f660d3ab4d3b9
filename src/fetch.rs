//! Request interception over the `Fetch` domain.
//!
//! Every paused request yields an [`InterceptedRequest`] record that must be
//! resolved exactly once with continue, fulfill or fail. A record nobody
//! resolves is continued unchanged after a deadline, so the browser never
//! hangs on a forgotten pause.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use futures::future::BoxFuture;
use futures::StreamExt;

use crate::error::{CdpError, Result};
use crate::listeners::{EventDelivery, EventStream};
use crate::tab::TabInner;
use zendriver_cdp::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams, FulfillRequestParams,
    HeaderEntry, RequestId,
};
use zendriver_cdp::cdp::browser_protocol::network::{ErrorReason, Headers, ResourceType};

/// How long a paused request may stay unresolved before it is continued
/// unchanged.
pub const AUTO_CONTINUE_TIMEOUT: Duration = Duration::from_secs(20);

/// The stream of paused requests for one `Fetch.enable` installation.
#[must_use = "paused requests pile up unless pulled"]
#[derive(Debug)]
pub struct RequestInterceptor {
    events: EventStream<EventRequestPaused>,
    tab: Arc<TabInner>,
    auto_continue: Duration,
}

impl RequestInterceptor {
    pub(crate) fn new(events: EventStream<EventRequestPaused>, tab: Arc<TabInner>) -> Self {
        Self {
            events,
            tab,
            auto_continue: AUTO_CONTINUE_TIMEOUT,
        }
    }

    /// Override the auto-continue deadline.
    pub fn auto_continue_after(mut self, timeout: Duration) -> Self {
        self.auto_continue = timeout;
        self
    }

    /// The next paused request, or `None` once the session or connection
    /// ended.
    pub async fn next(&mut self) -> Option<InterceptedRequest> {
        loop {
            match self.events.next().await? {
                EventDelivery::Event(event) => {
                    return Some(InterceptedRequest::new(
                        event,
                        Arc::clone(&self.tab),
                        self.auto_continue,
                    ));
                }
                EventDelivery::Dropped(n) => {
                    tracing::warn!(
                        dropped = n,
                        "interception fell behind, paused requests were lost to the watchdog"
                    );
                }
            }
        }
    }

    /// Feeds every record through the handlers in registration order. The
    /// first handler that resolves a record wins; later handlers never see
    /// it. Records no handler resolves are left to the auto-continue
    /// watchdog.
    pub async fn run(mut self, handlers: Vec<Box<dyn RequestHandler>>) {
        while let Some(request) = self.next().await {
            for handler in &handlers {
                if request.is_resolved() {
                    break;
                }
                handler.handle(&request).await;
            }
        }
    }
}

/// An ordered interception handler. Resolve the record (or don't) and
/// return; the chain stops at the first resolution.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle<'a>(&'a self, request: &'a InterceptedRequest) -> BoxFuture<'a, ()>;
}

impl<F> RequestHandler for F
where
    F: for<'a> Fn(&'a InterceptedRequest) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, request: &'a InterceptedRequest) -> BoxFuture<'a, ()> {
        (self)(request)
    }
}

/// A single paused network request.
///
/// Must be resolved exactly once: the second resolution attempt fails with
/// [`CdpError::AlreadyResolved`]. If nobody resolves it within the
/// interceptor's deadline it is continued unchanged and a warning is logged.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    event: Arc<EventRequestPaused>,
    tab: Arc<TabInner>,
    resolved: Arc<AtomicBool>,
}

impl InterceptedRequest {
    fn new(event: Arc<EventRequestPaused>, tab: Arc<TabInner>, auto_continue: Duration) -> Self {
        let request = Self {
            event,
            tab,
            resolved: Arc::new(AtomicBool::new(false)),
        };

        let watchdog = request.clone();
        tokio::spawn(async move {
            tokio::time::sleep(auto_continue).await;
            if !watchdog.resolved.swap(true, Ordering::SeqCst) {
                tracing::warn!(
                    url = %watchdog.event.request.url,
                    "intercepted request left unresolved, continuing unchanged"
                );
                let _ = watchdog
                    .tab
                    .execute(ContinueRequestParams::new(
                        watchdog.event.request_id.clone(),
                    ))
                    .await;
            }
        });

        request
    }

    pub fn request_id(&self) -> &RequestId {
        &self.event.request_id
    }

    pub fn url(&self) -> &str {
        &self.event.request.url
    }

    pub fn method(&self) -> &str {
        &self.event.request.method
    }

    pub fn headers(&self) -> &Headers {
        &self.event.request.headers
    }

    pub fn resource_type(&self) -> ResourceType {
        self.event.resource_type
    }

    /// Whether this pause happened at the response stage.
    pub fn is_response_stage(&self) -> bool {
        self.event.is_response_stage()
    }

    /// The full paused event.
    pub fn event(&self) -> &EventRequestPaused {
        &self.event
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }

    fn take_resolution(&self) -> Result<()> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            Err(CdpError::AlreadyResolved {
                request_id: self.event.request_id.as_str().to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Lets the request proceed unchanged.
    pub async fn continue_request(&self) -> Result<()> {
        self.take_resolution()?;
        self.tab
            .execute(ContinueRequestParams::new(self.event.request_id.clone()))
            .await?;
        Ok(())
    }

    /// Lets the request proceed with overridden url, method, headers or
    /// body. The record's request id always wins over the one in `overrides`.
    pub async fn continue_with(&self, mut overrides: ContinueRequestParams) -> Result<()> {
        self.take_resolution()?;
        overrides.request_id = self.event.request_id.clone();
        self.tab.execute(overrides).await?;
        Ok(())
    }

    /// Answers the request from the client side; nothing leaves the browser.
    pub async fn fulfill(
        &self,
        status: i64,
        headers: Vec<(String, String)>,
        body: &[u8],
    ) -> Result<()> {
        self.take_resolution()?;
        let mut params = FulfillRequestParams::new(self.event.request_id.clone(), status);
        params.response_headers = Some(
            headers
                .into_iter()
                .map(|(name, value)| HeaderEntry::new(name, value))
                .collect(),
        );
        params.body = Some(base64::engine::general_purpose::STANDARD.encode(body).into());
        self.tab.execute(params).await?;
        Ok(())
    }

    /// Fails the request with the given network error.
    pub async fn fail(&self, reason: ErrorReason) -> Result<()> {
        self.take_resolution()?;
        self.tab
            .execute(FailRequestParams::new(
                self.event.request_id.clone(),
                reason,
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::target::TargetMessage;
    use futures::channel::mpsc::Receiver;
    use futures::StreamExt;
    use std::sync::atomic::AtomicBool;
    use zendriver_types::{CallId, Response};

    fn paused_event() -> Arc<EventRequestPaused> {
        Arc::new(
            serde_json::from_value(serde_json::json!({
                "requestId": "interception-1",
                "request": {
                    "url": "http://example.com/api/v1/ping",
                    "method": "GET",
                    "headers": {}
                },
                "frameId": "FRAME",
                "resourceType": "Fetch"
            }))
            .unwrap(),
        )
    }

    fn tab_inner() -> (Arc<TabInner>, Receiver<TargetMessage>) {
        let (tx, rx) = futures::channel::mpsc::channel(8);
        let inner = Arc::new(TabInner::new(
            "TARGET".into(),
            "SESSION".into(),
            tx,
            Arc::new(AtomicBool::new(false)),
            Duration::from_secs(30),
        ));
        (inner, rx)
    }

    /// Replies ok to the next command on the channel and returns its method.
    async fn answer_next(rx: &mut Receiver<TargetMessage>) -> String {
        match rx.next().await.expect("a command arrives") {
            TargetMessage::Command(cmd) => {
                let method = cmd.method.to_string();
                let _ = cmd.sender.send(Ok(Response {
                    id: CallId::new(1),
                    result: Some(serde_json::json!({})),
                    error: None,
                }));
                method
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn record_resolves_exactly_once() {
        let (inner, mut rx) = tab_inner();
        let record = InterceptedRequest::new(paused_event(), inner, Duration::from_secs(600));

        let answer = tokio::spawn(async move { answer_next(&mut rx).await });
        record.continue_request().await.unwrap();
        assert_eq!(answer.await.unwrap(), "Fetch.continueRequest");
        assert!(record.is_resolved());

        // the second resolution must be rejected locally
        let err = record.fail(ErrorReason::Aborted).await.unwrap_err();
        assert!(matches!(err, CdpError::AlreadyResolved { .. }));
        let err = record.fulfill(200, vec![], b"{}").await.unwrap_err();
        assert!(matches!(err, CdpError::AlreadyResolved { .. }));
    }

    #[tokio::test]
    async fn unresolved_record_is_auto_continued() {
        let (inner, mut rx) = tab_inner();
        let record = InterceptedRequest::new(paused_event(), inner, Duration::from_millis(20));

        let method = answer_next(&mut rx).await;
        assert_eq!(method, "Fetch.continueRequest");
        assert!(record.is_resolved());

        // a late user resolution loses against the watchdog
        let err = record.continue_request().await.unwrap_err();
        assert!(matches!(err, CdpError::AlreadyResolved { .. }));
    }

    #[tokio::test]
    async fn fulfill_carries_headers_and_base64_body() {
        let (inner, mut rx) = tab_inner();
        let record = InterceptedRequest::new(paused_event(), inner, Duration::from_secs(600));

        let answer = tokio::spawn(async move {
            match rx.next().await.expect("a command arrives") {
                TargetMessage::Command(cmd) => {
                    assert_eq!(cmd.method, "Fetch.fulfillRequest");
                    assert_eq!(cmd.params["responseCode"], 200);
                    assert_eq!(
                        cmd.params["responseHeaders"][0]["name"],
                        "content-type"
                    );
                    // `{"ok":true}` in base64
                    assert_eq!(cmd.params["body"], "eyJvayI6dHJ1ZX0=");
                    let _ = cmd.sender.send(Ok(Response {
                        id: CallId::new(1),
                        result: Some(serde_json::json!({})),
                        error: None,
                    }));
                }
                other => panic!("unexpected message: {other:?}"),
            }
        });

        record
            .fulfill(
                200,
                vec![("content-type".to_string(), "application/json".to_string())],
                br#"{"ok":true}"#,
            )
            .await
            .unwrap();
        answer.await.unwrap();
    }
}
