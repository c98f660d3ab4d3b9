use std::fmt;
use std::sync::Arc;

use futures::channel::mpsc::Sender;
use futures::channel::oneshot::channel as oneshot_channel;
use serde::de::DeserializeOwned;

use crate::cmd::CommandMessage;
use crate::error::{CdpError, Result};
use crate::handler::target::TargetMessage;
use zendriver_cdp::cdp::browser_protocol::target::SessionId;
use zendriver_cdp::cdp::js_protocol::runtime::{
    ReleaseObjectParams, RemoteObject, RemoteObjectId,
};

/// The outcome of a script evaluation, deserialized into a neutral tree:
/// either a plain json value (null, bool, number, string, array, object) or
/// an opaque reference to a remote object that has no json representation.
#[derive(Debug, Clone)]
pub enum EvaluationResult {
    Value(serde_json::Value),
    /// A non-serializable remote object. The browser-side handle is released
    /// when the last clone is dropped.
    Object(RemoteObjectRef),
}

impl EvaluationResult {
    pub(crate) fn new(
        object: RemoteObject,
        session_id: SessionId,
        releaser: Sender<TargetMessage>,
    ) -> Self {
        if let Some(value) = object.value.clone() {
            return EvaluationResult::Value(value);
        }
        match RemoteObjectRef::new(object, session_id, releaser) {
            Some(object) => EvaluationResult::Object(object),
            // `undefined` and friends
            None => EvaluationResult::Value(serde_json::Value::Null),
        }
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            EvaluationResult::Value(value) => Some(value),
            EvaluationResult::Object(_) => None,
        }
    }

    pub fn object(&self) -> Option<&RemoteObjectRef> {
        match self {
            EvaluationResult::Object(object) => Some(object),
            EvaluationResult::Value(_) => None,
        }
    }

    /// Attempts to deserialize the value into the given type.
    pub fn into_value<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            EvaluationResult::Value(value) => Ok(serde_json::from_value(value)?),
            EvaluationResult::Object(object) => Err(CdpError::msg(format!(
                "remote object {} has no json value",
                object.object_id()
            ))),
        }
    }
}

/// An owned token for a browser-side `RemoteObject`.
///
/// Dropping the last clone issues `Runtime.releaseObject` for the wrapped
/// `objectId`, so handles do not leak in the page's object group.
#[derive(Debug, Clone)]
pub struct RemoteObjectRef {
    inner: Arc<RemoteObjectInner>,
}

impl RemoteObjectRef {
    /// Wrap a remote object; `None` when it carries no object id.
    pub(crate) fn new(
        object: RemoteObject,
        session_id: SessionId,
        releaser: Sender<TargetMessage>,
    ) -> Option<Self> {
        let object_id = object.object_id.clone()?;
        Some(Self {
            inner: Arc::new(RemoteObjectInner {
                object,
                object_id,
                session_id,
                releaser,
            }),
        })
    }

    pub fn object_id(&self) -> &RemoteObjectId {
        &self.inner.object_id
    }

    pub fn remote_object(&self) -> &RemoteObject {
        &self.inner.object
    }

    pub fn description(&self) -> Option<&str> {
        self.inner.object.description.as_deref()
    }
}

impl fmt::Display for RemoteObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "[object {description}]"),
            None => write!(f, "[object {}]", self.inner.object.r#type),
        }
    }
}

struct RemoteObjectInner {
    object: RemoteObject,
    object_id: RemoteObjectId,
    session_id: SessionId,
    releaser: Sender<TargetMessage>,
}

impl fmt::Debug for RemoteObjectInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObjectInner")
            .field("object_id", &self.object_id)
            .finish_non_exhaustive()
    }
}

impl Drop for RemoteObjectInner {
    fn drop(&mut self) {
        let (tx, _rx) = oneshot_channel();
        let release = ReleaseObjectParams::new(self.object_id.clone());
        if let Ok(msg) = CommandMessage::with_session(release, tx, Some(self.session_id.clone())) {
            if self
                .releaser
                .try_send(TargetMessage::Command(msg))
                .is_err()
            {
                tracing::debug!(object_id = %self.object_id, "failed to queue releaseObject");
            }
        }
    }
}
