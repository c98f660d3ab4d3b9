use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The identifier of a method: `Domain.command`
pub type MethodId = Cow<'static, str>;

/// A Message sent by the client to the chromium instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Identifier for this method call
    ///
    /// [`MethodCall`] ids must be unique for every connection
    pub id: CallId,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub method: MethodId,
    pub params: serde_json::Value,
}

/// Unique, monotonically increasing identifier for a [`MethodCall`] within a
/// connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(usize);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallId({})", self.0)
    }
}

impl CallId {
    pub fn new(id: usize) -> Self {
        CallId(id)
    }
}

/// A cdp command: the parameter type knows the shape of its response.
pub trait Command: serde::ser::Serialize + Method {
    type Response: DeserializeOwned + fmt::Debug;
}

/// The successful response to a [`Command`], paired with the call it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse<T>
where
    T: fmt::Debug,
{
    pub id: CallId,
    pub result: T,
    pub method: MethodId,
}

pub type CommandResult<T> = Result<CommandResponse<T>, Error>;

impl<T: fmt::Debug> Deref for CommandResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.result
    }
}

/// An event received from the chromium instance with its params left as raw
/// json. Fallback representation for events outside the typed set.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CdpJsonEventMessage {
    /// Name of the method
    pub method: MethodId,
    /// The session this event is meant for, if any
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Json params
    pub params: serde_json::Value,
}

impl Method for CdpJsonEventMessage {
    fn identifier(&self) -> MethodId {
        self.method.clone()
    }
}

impl EventMessage for CdpJsonEventMessage {
    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

/// The deserializable event envelope half of a [`Message`].
pub trait EventMessage: Method + DeserializeOwned {
    /// The identifier of the session the event occurred in, absent for
    /// browser-level events.
    fn session_id(&self) -> Option<&str>;
}

pub trait Method {
    /// The whole string identifier for this method like: `DOM.removeNode`
    fn identifier(&self) -> MethodId;

    /// The name of the domain this method belongs to: `DOM`
    fn domain_name(&self) -> MethodId {
        self.split().0
    }

    /// The standalone identifier of the method inside the domain: `removeNode`
    fn method_name(&self) -> MethodId {
        self.split().1
    }

    /// Tuple of (`domain_name`, `method_name`) : (`DOM`, `removeNode`)
    fn split(&self) -> (MethodId, MethodId) {
        match self.identifier() {
            Cow::Borrowed(id) => {
                let mut iter = id.split('.');
                (iter.next().unwrap().into(), iter.next().unwrap().into())
            }
            Cow::Owned(id) => {
                let mut iter = id.split('.');
                (
                    Cow::Owned(iter.next().unwrap().into()),
                    Cow::Owned(iter.next().unwrap().into()),
                )
            }
        }
    }
}

/// A not yet identified cdp request: method + params, optionally scoped to a
/// session.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Request {
    pub method: MethodId,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub params: serde_json::Value,
}

impl Request {
    pub fn new(method: MethodId, params: serde_json::Value) -> Self {
        Self {
            method,
            params,
            session_id: None,
        }
    }

    pub fn with_session(
        method: MethodId,
        params: serde_json::Value,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            method,
            params,
            session_id: Some(session_id.into()),
        }
    }
}

/// A response to a [`MethodCall`] from the chromium instance
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Response {
    /// Numeric identifier for the exact request
    pub id: CallId,
    /// The response payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The reason why the [`MethodCall`] failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

/// An incoming message read from the websocket: either a response to a method
/// call or an event.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Message<T = CdpJsonEventMessage> {
    Response(Response),
    Event(T),
}

/// Error object a failed [`MethodCall`] carries, as defined by the devtools
/// protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    /// Error code
    pub code: i64,
    /// Error Message
    pub message: String,
    /// Additional protocol-supplied detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

/// Represents a binary type as defined in CDP: base64 encoded payload inside
/// json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Binary(String);

impl Binary {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Binary {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Binary> for String {
    fn from(b: Binary) -> String {
        b.0
    }
}

impl From<String> for Binary {
    fn from(expr: String) -> Self {
        Self(expr)
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_call_serializes_session_only_when_set() {
        let call = MethodCall {
            id: CallId::new(1),
            session_id: None,
            method: "Page.enable".into(),
            params: serde_json::json!({}),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert!(json.get("sessionId").is_none());

        let call = MethodCall {
            session_id: Some("ABC".to_string()),
            ..call
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["sessionId"], "ABC");
    }

    #[test]
    fn message_distinguishes_response_and_event() {
        let msg: Message = serde_json::from_str(r#"{"id":2,"result":{"ok":true}}"#).unwrap();
        assert!(matches!(msg, Message::Response(_)));

        let msg: Message = serde_json::from_str(
            r#"{"method":"Target.targetCrashed","params":{"targetId":"T"},"sessionId":"S"}"#,
        )
        .unwrap();
        match msg {
            Message::Event(ev) => {
                assert_eq!(ev.identifier(), "Target.targetCrashed");
                assert_eq!(ev.session_id(), Some("S"));
            }
            Message::Response(_) => panic!("expected event"),
        }
    }

    #[test]
    fn response_error_round_trips() {
        let raw = r#"{"id":7,"error":{"code":-32000,"message":"No node with given id found"}}"#;
        let resp: Response = serde_json::from_str(raw).unwrap();
        let err = resp.error.as_ref().unwrap();
        assert_eq!(err.code, -32000);
        let back = serde_json::to_value(&resp).unwrap();
        let reparsed: Response = serde_json::from_value(back).unwrap();
        assert_eq!(reparsed, resp);
    }

    #[test]
    fn method_split() {
        let ev = CdpJsonEventMessage {
            method: "DOM.removeNode".into(),
            session_id: None,
            params: serde_json::Value::Null,
        };
        assert_eq!(ev.domain_name(), "DOM");
        assert_eq!(ev.method_name(), "removeNode");
    }
}
