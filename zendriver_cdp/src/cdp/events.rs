//! The tagged union of all typed cdp events and the envelope that carries
//! them off the wire.

use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

use crate::cdp::browser_protocol::{fetch, network, page, target};
use crate::cdp::js_protocol::runtime;
use crate::cdp::Event;
use zendriver_types::{CdpJsonEventMessage, EventMessage, Method, MethodId};

macro_rules! cdp_events {
    ($( $identifier:literal => $variant:ident($ty:path), )*) => {
        /// All cdp events the driver understands, one variant per typed
        /// event. Events outside the typed set are carried as raw json in
        /// [`CdpEvent::Other`].
        #[derive(Debug, Clone, PartialEq)]
        #[allow(clippy::large_enum_variant)]
        pub enum CdpEvent {
            $( $variant($ty), )*
            Other(CdpJsonEventMessage),
        }

        impl CdpEvent {
            /// The `Domain.event` identifier of this event.
            pub fn identifier(&self) -> MethodId {
                match self {
                    $( CdpEvent::$variant(_) => $identifier.into(), )*
                    CdpEvent::Other(ev) => ev.method.clone(),
                }
            }

            /// Moves the payload onto the bus as a shareable `dyn Event`.
            pub fn into_event(self) -> Arc<dyn Event> {
                match self {
                    $( CdpEvent::$variant(ev) => Arc::new(ev), )*
                    CdpEvent::Other(ev) => Arc::new(ev),
                }
            }

            /// The params serialized back to json, as sent by the browser.
            pub fn params_to_value(&self) -> serde_json::Result<serde_json::Value> {
                match self {
                    $( CdpEvent::$variant(ev) => serde_json::to_value(ev), )*
                    CdpEvent::Other(ev) => Ok(ev.params.clone()),
                }
            }

            fn parse(
                method: &str,
                session_id: Option<&str>,
                params: serde_json::Value,
            ) -> serde_json::Result<Self> {
                Ok(match method {
                    $( $identifier => CdpEvent::$variant(serde_json::from_value(params)?), )*
                    _ => CdpEvent::Other(CdpJsonEventMessage {
                        method: method.to_string().into(),
                        session_id: session_id.map(str::to_string),
                        params,
                    }),
                })
            }
        }
    };
}

cdp_events! {
    "Target.targetCreated" => TargetTargetCreated(target::EventTargetCreated),
    "Target.targetInfoChanged" => TargetTargetInfoChanged(target::EventTargetInfoChanged),
    "Target.targetDestroyed" => TargetTargetDestroyed(target::EventTargetDestroyed),
    "Target.targetCrashed" => TargetTargetCrashed(target::EventTargetCrashed),
    "Target.attachedToTarget" => TargetAttachedToTarget(target::EventAttachedToTarget),
    "Target.detachedFromTarget" => TargetDetachedFromTarget(target::EventDetachedFromTarget),
    "Page.frameAttached" => PageFrameAttached(page::EventFrameAttached),
    "Page.frameDetached" => PageFrameDetached(page::EventFrameDetached),
    "Page.frameNavigated" => PageFrameNavigated(page::EventFrameNavigated),
    "Page.frameStartedLoading" => PageFrameStartedLoading(page::EventFrameStartedLoading),
    "Page.frameStoppedLoading" => PageFrameStoppedLoading(page::EventFrameStoppedLoading),
    "Page.lifecycleEvent" => PageLifecycleEvent(page::EventLifecycleEvent),
    "Page.loadEventFired" => PageLoadEventFired(page::EventLoadEventFired),
    "Page.domContentEventFired" => PageDomContentEventFired(page::EventDomContentEventFired),
    "Page.navigatedWithinDocument" => PageNavigatedWithinDocument(page::EventNavigatedWithinDocument),
    "Network.responseReceived" => NetworkResponseReceived(network::EventResponseReceived),
    "Network.loadingFailed" => NetworkLoadingFailed(network::EventLoadingFailed),
    "Fetch.requestPaused" => FetchRequestPaused(fetch::EventRequestPaused),
    "Runtime.executionContextCreated" => RuntimeExecutionContextCreated(runtime::EventExecutionContextCreated),
    "Runtime.executionContextDestroyed" => RuntimeExecutionContextDestroyed(runtime::EventExecutionContextDestroyed),
    "Runtime.executionContextsCleared" => RuntimeExecutionContextsCleared(runtime::EventExecutionContextsCleared),
}

/// The envelope for an inbound event frame: `{method, params, [sessionId]}`
/// with the params already dispatched into the matching [`CdpEvent`] variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CdpEventMessage {
    /// Name of the method.
    pub method: MethodId,
    /// The session this event is meant for, absent for browser-level events.
    pub session_id: Option<String>,
    /// The parsed params.
    pub params: CdpEvent,
}

impl Method for CdpEventMessage {
    fn identifier(&self) -> MethodId {
        self.method.clone()
    }
}

impl EventMessage for CdpEventMessage {
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

impl<'de> Deserialize<'de> for CdpEventMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            method: String,
            #[serde(rename = "sessionId")]
            session_id: Option<String>,
            #[serde(default)]
            params: serde_json::Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let params = CdpEvent::parse(&raw.method, raw.session_id.as_deref(), raw.params)
            .map_err(serde::de::Error::custom)?;
        Ok(Self {
            method: raw.method.into(),
            session_id: raw.session_id,
            params,
        })
    }
}

impl Serialize for CdpEventMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let params = self
            .params
            .params_to_value()
            .map_err(serde::ser::Error::custom)?;
        let len = if self.session_id.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("method", self.method.as_ref())?;
        if let Some(ref session_id) = self.session_id {
            map.serialize_entry("sessionId", session_id)?;
        }
        map.serialize_entry("params", &params)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_event_round_trips() {
        let raw = serde_json::json!({
            "method": "Page.frameStoppedLoading",
            "sessionId": "SESSION",
            "params": {"frameId": "FRAME"}
        });
        let msg: CdpEventMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.session_id(), Some("SESSION"));
        match &msg.params {
            CdpEvent::PageFrameStoppedLoading(ev) => {
                assert_eq!(ev.frame_id.as_str(), "FRAME");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn unknown_event_falls_back_to_other() {
        let raw = serde_json::json!({
            "method": "Animation.animationStarted",
            "params": {"animation": {}}
        });
        let msg: CdpEventMessage = serde_json::from_value(raw.clone()).unwrap();
        match &msg.params {
            CdpEvent::Other(ev) => {
                assert_eq!(ev.method, "Animation.animationStarted");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(msg.identifier(), "Animation.animationStarted");
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn malformed_known_event_is_a_decode_error() {
        let raw = serde_json::json!({
            "method": "Target.targetDestroyed",
            "params": {"bogus": 1}
        });
        assert!(serde_json::from_value::<CdpEventMessage>(raw).is_err());
    }

    #[test]
    fn into_event_preserves_identifier() {
        let msg: CdpEventMessage = serde_json::from_value(serde_json::json!({
            "method": "Target.targetDestroyed",
            "params": {"targetId": "T"}
        }))
        .unwrap();
        let event = msg.params.into_event();
        assert_eq!(event.identifier(), "Target.targetDestroyed");
    }
}
