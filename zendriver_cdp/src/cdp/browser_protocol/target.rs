//! Supports additional targets discovery and allows to attach to them.
//! [Target](https://chromedevtools.github.io/devtools-protocol/tot/Target/)

use serde::{Deserialize, Serialize};

use crate::cdp::browser_protocol::browser::BrowserContextId;
use crate::cdp::{cdp_command, cdp_event, cdp_string_id};

cdp_string_id!(TargetId);
cdp_string_id!(
    /// Unique identifier of an attached debugging session.
    SessionId
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: TargetId,
    /// `page`, `iframe`, `worker`, `service_worker`, `browser`, ...
    pub r#type: String,
    pub title: String,
    pub url: String,
    /// Whether the target has an attached client.
    pub attached: bool,
    /// Opener target Id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opener_id: Option<TargetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<BrowserContextId>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.r#type == "page"
    }
}

/// [createTarget](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-createTarget)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
    /// The initial URL the page will be navigated to. An empty string
    /// indicates about:blank.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<BrowserContextId>,
    /// Whether to create a new Window or Tab (chrome-only, false by default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_window: Option<bool>,
    /// Whether to create the target in background or foreground (chrome-only,
    /// false by default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
}

impl CreateTargetParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            browser_context_id: None,
            new_window: None,
            background: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetReturns {
    /// The id of the page opened.
    pub target_id: TargetId,
}

cdp_command!(CreateTargetParams, "Target.createTarget", CreateTargetReturns);

/// [attachToTarget](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-attachToTarget)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetParams {
    pub target_id: TargetId,
    /// Enables "flat" access to the session via specifying sessionId attribute
    /// in the commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatten: Option<bool>,
}

impl AttachToTargetParams {
    /// Attach in flatten mode. Non-flat session traffic is not modeled.
    pub fn new(target_id: impl Into<TargetId>) -> Self {
        Self {
            target_id: target_id.into(),
            flatten: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetReturns {
    /// Id assigned to the session.
    pub session_id: SessionId,
}

cdp_command!(
    AttachToTargetParams,
    "Target.attachToTarget",
    AttachToTargetReturns
);

/// [detachFromTarget](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-detachFromTarget)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachFromTargetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl DetachFromTargetParams {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: Some(session_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetachFromTargetReturns {}

cdp_command!(
    DetachFromTargetParams,
    "Target.detachFromTarget",
    DetachFromTargetReturns
);

/// [closeTarget](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-closeTarget)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
    pub target_id: TargetId,
}

impl CloseTargetParams {
    pub fn new(target_id: impl Into<TargetId>) -> Self {
        Self {
            target_id: target_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetReturns {
    pub success: bool,
}

cdp_command!(CloseTargetParams, "Target.closeTarget", CloseTargetReturns);

/// [activateTarget](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-activateTarget)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateTargetParams {
    pub target_id: TargetId,
}

impl ActivateTargetParams {
    pub fn new(target_id: impl Into<TargetId>) -> Self {
        Self {
            target_id: target_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivateTargetReturns {}

cdp_command!(
    ActivateTargetParams,
    "Target.activateTarget",
    ActivateTargetReturns
);

/// [getTargets](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-getTargets)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetTargetsParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsReturns {
    /// The list of targets.
    pub target_infos: Vec<TargetInfo>,
}

cdp_command!(GetTargetsParams, "Target.getTargets", GetTargetsReturns);

/// Controls whether to discover available targets and notify via
/// `targetCreated/targetInfoChanged/targetDestroyed` events.
/// [setDiscoverTargets](https://chromedevtools.github.io/devtools-protocol/tot/Target/#method-setDiscoverTargets)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscoverTargetsParams {
    pub discover: bool,
}

impl SetDiscoverTargetsParams {
    pub fn new(discover: bool) -> Self {
        Self { discover }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetDiscoverTargetsReturns {}

cdp_command!(
    SetDiscoverTargetsParams,
    "Target.setDiscoverTargets",
    SetDiscoverTargetsReturns
);

/// Issued when a possible inspection target is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTargetCreated {
    pub target_info: TargetInfo,
}

cdp_event!(EventTargetCreated, "Target.targetCreated");

/// Issued when some information about a target has changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTargetInfoChanged {
    pub target_info: TargetInfo,
}

cdp_event!(EventTargetInfoChanged, "Target.targetInfoChanged");

/// Issued when a target is destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTargetDestroyed {
    pub target_id: TargetId,
}

cdp_event!(EventTargetDestroyed, "Target.targetDestroyed");

/// Issued when a target has crashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTargetCrashed {
    pub target_id: TargetId,
    /// Termination status type.
    pub status: String,
    /// Termination error code.
    pub error_code: i64,
}

cdp_event!(EventTargetCrashed, "Target.targetCrashed");

/// Issued when an attached session is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttachedToTarget {
    pub session_id: SessionId,
    pub target_info: TargetInfo,
    pub waiting_for_debugger: bool,
}

cdp_event!(EventAttachedToTarget, "Target.attachedToTarget");

/// Issued when a session is detached, either via `detachFromTarget` or target
/// destruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetachedFromTarget {
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<TargetId>,
}

cdp_event!(EventDetachedFromTarget, "Target.detachedFromTarget");
