use std::fmt;
use std::io;
use std::time::Instant;

use async_tungstenite::tungstenite;
use futures::channel::mpsc::SendError;
use futures::channel::oneshot::Canceled;
use thiserror::Error;

use zendriver_types::MethodId;

pub type Result<T, E = CdpError> = std::result::Result<T, E>;

/// Where in the protocol an error originated: the method that was in flight
/// and the session/target it was scoped to, as far as they are known at the
/// failure site.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The `Domain.command` that was in flight.
    pub method: Option<MethodId>,
    /// The session the call was scoped to.
    pub session_id: Option<String>,
    /// The target the call belonged to.
    pub target_id: Option<String>,
}

impl ErrorContext {
    pub fn for_method(method: impl Into<MethodId>) -> Self {
        Self {
            method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn for_target(target_id: impl Into<String>) -> Self {
        Self {
            target_id: Some(target_id.into()),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<MethodId>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.method.is_none() && self.session_id.is_none() && self.target_id.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut sep = " (";
        if let Some(ref method) = self.method {
            write!(f, "{sep}method={method}")?;
            sep = ", ";
        }
        if let Some(ref session_id) = self.session_id {
            write!(f, "{sep}session={session_id}")?;
            sep = ", ";
        }
        if let Some(ref target_id) = self.target_id {
            write!(f, "{sep}target={target_id}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("{0}")]
    Ws(#[from] tungstenite::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
    /// An `error` reply from the chromium instance.
    #[error("{0}")]
    Chrome(#[from] zendriver_types::Error),
    #[error("{0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("received an empty response from the chromium instance")]
    NoResponse,
    /// The connection to the browser is gone. Terminal: every handle bound to
    /// it fails with this from now on.
    #[error("the connection to the browser was closed{0}")]
    ConnectionClosed(ErrorContext),
    #[error("request timed out{0}")]
    Timeout(ErrorContext),
    #[error("the operation was cancelled")]
    Cancelled,
    /// The target behind this handle was destroyed.
    #[error("the target no longer exists{0}")]
    TargetGone(ErrorContext),
    /// The remote node behind an element handle is gone and could not be
    /// re-resolved.
    #[error("the remote node this element refers to is stale{0}")]
    StaleElement(ErrorContext),
    #[error("element is not interactable: {0}")]
    ElementNotInteractable(String),
    /// A newer navigation took over while this one was still in flight.
    #[error("navigation superseded by a newer navigation request{0}")]
    NavigationSuperseded(ErrorContext),
    /// The target never reported a main frame within the attach grace window.
    #[error("no main frame reported for this target{0}")]
    NoMainFrame(ErrorContext),
    #[error("no node matches the selector {selector:?}")]
    NotFound { selector: String },
    /// An intercepted request may be continued, fulfilled or failed exactly
    /// once.
    #[error("intercepted request {request_id} was already resolved")]
    AlreadyResolved { request_id: String },
    #[error("javascript evaluation threw: {0}")]
    Evaluation(String),
    /// An error message reported by chrome outside the regular reply shape,
    /// e.g. the `errorText` of a failed navigation.
    #[error("chrome message: {0}")]
    ChromeMessage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Msg(String),
}

impl CdpError {
    pub fn msg(msg: impl Into<String>) -> Self {
        CdpError::Msg(msg.into())
    }

    /// Whether this is a CDP error reply indicating the referenced remote
    /// node/object no longer exists.
    pub fn is_stale(&self) -> bool {
        match self {
            CdpError::Chrome(err) => {
                let msg = err.message.to_ascii_lowercase();
                msg.contains("could not find object with given id")
                    || msg.contains("no node with given id")
                    || msg.contains("could not find node with given id")
                    || msg.contains("node with given id does not belong to the document")
            }
            _ => false,
        }
    }

    /// The structured context of the error, for the kinds that carry one.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            CdpError::ConnectionClosed(ctx)
            | CdpError::Timeout(ctx)
            | CdpError::TargetGone(ctx)
            | CdpError::StaleElement(ctx)
            | CdpError::NavigationSuperseded(ctx)
            | CdpError::NoMainFrame(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Oneshot waiters are dropped by the handler only when the connection goes
/// away, so a canceled receiver means the connection is gone.
impl From<Canceled> for CdpError {
    fn from(_: Canceled) -> Self {
        CdpError::ConnectionClosed(ErrorContext::default())
    }
}

/// The handler channel disconnecting likewise means the connection is gone;
/// sends fail fast from then on.
impl From<SendError> for CdpError {
    fn from(_: SendError) -> Self {
        CdpError::ConnectionClosed(ErrorContext::default())
    }
}

/// Rejected browser configuration.
#[derive(Debug, Clone, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// An Error where `now > deadline`
#[derive(Debug, Clone)]
pub struct DeadlineExceeded {
    /// The deadline that was set.
    pub deadline: Instant,
    /// The current time
    pub now: Instant,
}

impl DeadlineExceeded {
    /// panics if `now < deadline`
    pub fn new(now: Instant, deadline: Instant) -> Self {
        assert!(now >= deadline);
        Self { now, deadline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_detection_matches_cdp_messages() {
        let stale = CdpError::Chrome(zendriver_types::Error {
            code: -32000,
            message: "Could not find object with given id".to_string(),
            data: None,
        });
        assert!(stale.is_stale());

        let other = CdpError::Chrome(zendriver_types::Error {
            code: -32601,
            message: "'DOM.frobnicate' wasn't found".to_string(),
            data: None,
        });
        assert!(!other.is_stale());
        assert!(!CdpError::Timeout(ErrorContext::default()).is_stale());
    }

    #[test]
    fn context_renders_only_known_fields() {
        let err = CdpError::Timeout(ErrorContext::default());
        assert_eq!(err.to_string(), "request timed out");

        let err = CdpError::Timeout(
            ErrorContext::for_method("Page.navigate").with_session("SESSION"),
        );
        assert_eq!(
            err.to_string(),
            "request timed out (method=Page.navigate, session=SESSION)"
        );

        let err = CdpError::TargetGone(ErrorContext::for_target("TARGET"));
        assert_eq!(err.to_string(), "the target no longer exists (target=TARGET)");
        assert_eq!(
            err.context().unwrap().target_id.as_deref(),
            Some("TARGET")
        );
    }
}
