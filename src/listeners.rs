//! In-process pub/sub over cdp events.
//!
//! Each subscription owns a bounded buffer: a subscriber that falls behind
//! loses its own oldest events (announced in-stream as
//! [`EventDelivery::Dropped`]), never anyone else's. Callback handlers run on
//! the dispatch turn; panics are caught and logged, returned futures are
//! spawned detached.

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use futures::future::BoxFuture;
use futures::Stream;

use zendriver_cdp::cdp::browser_protocol::target::SessionId;
use zendriver_cdp::cdp::{Event, EventKind};
use zendriver_types::MethodId;

/// Events buffered per subscription before the oldest is dropped.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// What session traffic a subscription observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionFilter {
    /// The event across all sessions.
    Any,
    /// Only browser-level events, i.e. events carrying no session.
    Browser,
    /// Only events from this session.
    Session(SessionId),
}

impl SessionFilter {
    fn matches(&self, session_id: Option<&str>) -> bool {
        match self {
            SessionFilter::Any => true,
            SessionFilter::Browser => session_id.is_none(),
            SessionFilter::Session(id) => session_id == Some(id.as_str()),
        }
    }
}

#[derive(Debug)]
struct SubscriptionSink {
    buf: VecDeque<Arc<dyn Event>>,
    capacity: usize,
    /// Events shed from this buffer since the subscriber last pulled.
    dropped: u64,
    waker: Option<Waker>,
    /// Publisher gone, drain and finish.
    closed: bool,
    /// Receiver gone, publisher may gc the entry.
    detached: bool,
}

impl SubscriptionSink {
    fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            capacity,
            dropped: 0,
            waker: None,
            closed: false,
            detached: false,
        }
    }

    fn push(&mut self, event: Arc<dyn Event>) {
        if self.closed || self.detached {
            return;
        }
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
            self.dropped += 1;
        }
        self.buf.push_back(event);
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }

    fn close(&mut self) {
        self.closed = true;
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

/// What an [`EventStream`] yields.
#[derive(Debug)]
pub enum EventDelivery<T> {
    Event(Arc<T>),
    /// This subscriber fell behind and `n` of its oldest events were shed.
    Dropped(u64),
}

/// The receiver half of an event subscription.
///
/// Yields events of type `T` until cancelled (dropped) or the connection
/// terminates.
#[must_use = "streams do nothing unless polled"]
pub struct EventStream<T> {
    sink: Arc<Mutex<SubscriptionSink>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

impl<T: Event> Stream for EventStream<T> {
    type Item = EventDelivery<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut sink = self.sink.lock().expect("subscription sink poisoned");
        loop {
            if sink.dropped > 0 {
                let n = std::mem::take(&mut sink.dropped);
                return Poll::Ready(Some(EventDelivery::Dropped(n)));
            }
            match sink.buf.pop_front() {
                Some(event) => {
                    if let Ok(event) = event.into_any_arc().downcast::<T>() {
                        return Poll::Ready(Some(EventDelivery::Event(event)));
                    }
                    // not of this stream's type (raw subscription to a typed
                    // event); skip it
                }
                None => {
                    if sink.closed {
                        return Poll::Ready(None);
                    }
                    sink.waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            }
        }
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        if let Ok(mut sink) = self.sink.lock() {
            sink.detached = true;
            sink.buf.clear();
        }
    }
}

/// Registration payload for a stream subscription, routed to the handler.
#[derive(Debug)]
pub(crate) struct EventListenerRequest {
    pub method: MethodId,
    pub filter: SessionFilter,
    sink: Arc<Mutex<SubscriptionSink>>,
}

/// A fire-and-forget callback. Must not block; a returned future is spawned
/// onto the runtime instead of being awaited on the dispatch task.
pub type EventCallback =
    Box<dyn FnMut(&Arc<dyn Event>) -> Option<BoxFuture<'static, ()>> + Send + 'static>;

pub(crate) struct EventHandlerRequest {
    pub method: MethodId,
    pub filter: SessionFilter,
    pub callback: EventCallback,
}

impl fmt::Debug for EventHandlerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerRequest")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Creates a subscription for a typed event kind.
pub(crate) fn subscription<T: EventKind>(
    filter: SessionFilter,
) -> (EventListenerRequest, EventStream<T>) {
    subscription_raw(T::event_identifier(), filter)
}

/// Creates a subscription keyed on an explicit method identifier.
pub(crate) fn subscription_raw<T>(
    method: MethodId,
    filter: SessionFilter,
) -> (EventListenerRequest, EventStream<T>) {
    subscription_with_capacity(method, filter, DEFAULT_EVENT_BUFFER)
}

pub(crate) fn subscription_with_capacity<T>(
    method: MethodId,
    filter: SessionFilter,
    capacity: usize,
) -> (EventListenerRequest, EventStream<T>) {
    let sink = Arc::new(Mutex::new(SubscriptionSink::new(capacity.max(1))));
    (
        EventListenerRequest {
            method,
            filter,
            sink: Arc::clone(&sink),
        },
        EventStream {
            sink,
            _marker: PhantomData,
        },
    )
}

struct SubscriptionEntry {
    method: MethodId,
    filter: SessionFilter,
    sink: Arc<Mutex<SubscriptionSink>>,
}

struct CallbackEntry {
    method: MethodId,
    filter: SessionFilter,
    callback: EventCallback,
}

/// All registered event subscriptions and callback handlers of a connection.
#[derive(Default)]
pub(crate) struct EventListeners {
    subscriptions: Vec<SubscriptionEntry>,
    handlers: Vec<CallbackEntry>,
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("subscriptions", &self.subscriptions.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventListeners {
    pub fn add_listener(&mut self, req: EventListenerRequest) {
        self.subscriptions.push(SubscriptionEntry {
            method: req.method,
            filter: req.filter,
            sink: req.sink,
        });
    }

    pub fn add_handler(&mut self, req: EventHandlerRequest) {
        self.handlers.push(CallbackEntry {
            method: req.method,
            filter: req.filter,
            callback: req.callback,
        });
    }

    /// Deliver one event to every matching subscription and handler.
    pub fn publish(&mut self, method: &str, session_id: Option<&str>, event: &Arc<dyn Event>) {
        self.subscriptions.retain(|entry| {
            let mut sink = match entry.sink.lock() {
                Ok(sink) => sink,
                Err(_) => return false,
            };
            if sink.detached {
                return false;
            }
            if entry.method == method && entry.filter.matches(session_id) {
                sink.push(Arc::clone(event));
            }
            true
        });

        for entry in self.handlers.iter_mut() {
            if entry.method != method || !entry.filter.matches(session_id) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| (entry.callback)(event))) {
                Ok(Some(fut)) => {
                    tokio::spawn(fut);
                }
                Ok(None) => {}
                Err(_) => {
                    tracing::error!(method = %method, "event handler panicked");
                }
            }
        }
    }

    /// Terminate every subscription; streams yield their buffered events and
    /// then end.
    pub fn close_all(&mut self) {
        for entry in self.subscriptions.drain(..) {
            if let Ok(mut sink) = entry.sink.lock() {
                sink.close();
            }
        }
        self.handlers.clear();
    }

    /// Terminate all subscriptions scoped to the given session. Called once a
    /// session detached; no further event for it will be published.
    pub fn close_session(&mut self, session_id: &SessionId) {
        let filter = SessionFilter::Session(session_id.clone());
        self.subscriptions.retain(|entry| {
            if entry.filter == filter {
                if let Ok(mut sink) = entry.sink.lock() {
                    sink.close();
                }
                false
            } else {
                true
            }
        });
        self.handlers.retain(|entry| entry.filter != filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zendriver_cdp::cdp::browser_protocol::page::EventFrameStoppedLoading;

    fn stopped_loading(frame: &str) -> Arc<dyn Event> {
        Arc::new(EventFrameStoppedLoading {
            frame_id: frame.into(),
        })
    }

    #[test]
    fn stream_receives_matching_events_in_order() {
        let mut listeners = EventListeners::default();
        let (req, mut stream) =
            subscription::<EventFrameStoppedLoading>(SessionFilter::Session("S1".into()));
        listeners.add_listener(req);

        listeners.publish("Page.frameStoppedLoading", Some("S1"), &stopped_loading("A"));
        listeners.publish("Page.frameStoppedLoading", Some("S2"), &stopped_loading("B"));
        listeners.publish("Page.loadEventFired", Some("S1"), &stopped_loading("C"));
        listeners.publish("Page.frameStoppedLoading", Some("S1"), &stopped_loading("D"));

        let first = futures::executor::block_on(stream.next()).unwrap();
        let second = futures::executor::block_on(stream.next()).unwrap();
        match (first, second) {
            (EventDelivery::Event(a), EventDelivery::Event(d)) => {
                assert_eq!(a.frame_id.as_str(), "A");
                assert_eq!(d.frame_id.as_str(), "D");
            }
            other => panic!("unexpected deliveries: {other:?}"),
        }
    }

    #[test]
    fn browser_filter_only_sees_unscoped_events() {
        let mut listeners = EventListeners::default();
        let (req, mut stream) = subscription::<EventFrameStoppedLoading>(SessionFilter::Browser);
        listeners.add_listener(req);

        listeners.publish("Page.frameStoppedLoading", Some("S1"), &stopped_loading("A"));
        listeners.publish("Page.frameStoppedLoading", None, &stopped_loading("B"));
        listeners.close_all();

        let delivered: Vec<_> = futures::executor::block_on(stream.collect::<Vec<_>>());
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            EventDelivery::Event(ev) => assert_eq!(ev.frame_id.as_str(), "B"),
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[test]
    fn overflow_drops_oldest_and_reports_count() {
        let mut listeners = EventListeners::default();
        let (req, mut stream) = subscription_with_capacity::<EventFrameStoppedLoading>(
            "Page.frameStoppedLoading".into(),
            SessionFilter::Any,
            2,
        );
        listeners.add_listener(req);

        for frame in ["A", "B", "C", "D"] {
            listeners.publish("Page.frameStoppedLoading", None, &stopped_loading(frame));
        }

        match futures::executor::block_on(stream.next()).unwrap() {
            EventDelivery::Dropped(n) => assert_eq!(n, 2),
            other => panic!("expected drop marker, got {other:?}"),
        }
        match futures::executor::block_on(stream.next()).unwrap() {
            EventDelivery::Event(ev) => assert_eq!(ev.frame_id.as_str(), "C"),
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[test]
    fn dropped_stream_is_garbage_collected() {
        let mut listeners = EventListeners::default();
        let (req, stream) = subscription::<EventFrameStoppedLoading>(SessionFilter::Any);
        listeners.add_listener(req);
        drop(stream);

        listeners.publish("Page.frameStoppedLoading", None, &stopped_loading("A"));
        assert_eq!(listeners.subscriptions.len(), 0);
    }

    #[test]
    fn close_session_ends_scoped_subscriptions_only() {
        let mut listeners = EventListeners::default();
        let (req, mut scoped) =
            subscription::<EventFrameStoppedLoading>(SessionFilter::Session("S1".into()));
        listeners.add_listener(req);
        let (req, mut any) = subscription::<EventFrameStoppedLoading>(SessionFilter::Any);
        listeners.add_listener(req);

        listeners.close_session(&"S1".into());
        assert!(futures::executor::block_on(scoped.next()).is_none());

        listeners.publish("Page.frameStoppedLoading", None, &stopped_loading("A"));
        assert!(matches!(
            futures::executor::block_on(any.next()),
            Some(EventDelivery::Event(_))
        ));
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let mut listeners = EventListeners::default();
        let hits = Arc::new(AtomicUsize::new(0));

        listeners.add_handler(EventHandlerRequest {
            method: "Page.frameStoppedLoading".into(),
            filter: SessionFilter::Any,
            callback: Box::new(|_| panic!("handler bug")),
        });
        let counter = Arc::clone(&hits);
        listeners.add_handler(EventHandlerRequest {
            method: "Page.frameStoppedLoading".into(),
            filter: SessionFilter::Any,
            callback: Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                None
            }),
        });

        listeners.publish("Page.frameStoppedLoading", None, &stopped_loading("A"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
