//! Actions and events related to the inspected page.
//! [Page](https://chromedevtools.github.io/devtools-protocol/tot/Page/)

use serde::{Deserialize, Serialize};

use crate::cdp::browser_protocol::network::LoaderId;
use crate::cdp::{cdp_command, cdp_event, cdp_string_id};

cdp_string_id!(
    /// Unique frame identifier.
    FrameId
);

/// Information about the Frame on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    /// Parent frame identifier, absent for the main frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FrameId>,
    /// Identifier of the loader associated with this frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_id: Option<LoaderId>,
    /// Frame's name as specified in the tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Frame document's URL without fragment.
    pub url: String,
    /// Frame document's URL fragment including the '#'.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_fragment: Option<String>,
}

/// Information about the Frame hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTree {
    pub frame: Frame,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_frames: Option<Vec<FrameTree>>,
}

/// Navigation history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    pub id: i64,
    pub url: String,
    pub user_typed_url: String,
    pub title: String,
    pub transition_type: String,
}

/// [enable](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-enable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableReturns {}

cdp_command!(EnableParams, "Page.enable", EnableReturns);

/// [disable](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-disable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableReturns {}

cdp_command!(DisableParams, "Page.disable", DisableReturns);

/// Navigates current page to the given URL.
/// [navigate](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-navigate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate the page to.
    pub url: String,
    /// Referrer URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Intended transition type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<String>,
    /// Frame id to navigate, if not specified navigates the top frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
}

impl NavigateParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: None,
            transition_type: None,
            frame_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateReturns {
    /// Frame id that has navigated (or failed to navigate).
    pub frame_id: FrameId,
    /// Loader identifier. Absent for same-document navigations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_id: Option<LoaderId>,
    /// User friendly error message, present if and only if navigation has
    /// failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

cdp_command!(NavigateParams, "Page.navigate", NavigateReturns);

/// [reload](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-reload)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadParams {
    /// If true, browser cache is ignored (as if the user pressed
    /// Shift+refresh).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_cache: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReloadReturns {}

cdp_command!(ReloadParams, "Page.reload", ReloadReturns);

/// [stopLoading](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-stopLoading)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StopLoadingParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StopLoadingReturns {}

cdp_command!(StopLoadingParams, "Page.stopLoading", StopLoadingReturns);

/// [getFrameTree](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-getFrameTree)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetFrameTreeParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameTreeReturns {
    pub frame_tree: FrameTree,
}

cdp_command!(GetFrameTreeParams, "Page.getFrameTree", GetFrameTreeReturns);

/// [getNavigationHistory](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-getNavigationHistory)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetNavigationHistoryParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNavigationHistoryReturns {
    /// Index of the current navigation history entry.
    pub current_index: i64,
    /// Array of navigation history entries.
    pub entries: Vec<NavigationEntry>,
}

cdp_command!(
    GetNavigationHistoryParams,
    "Page.getNavigationHistory",
    GetNavigationHistoryReturns
);

/// [navigateToHistoryEntry](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-navigateToHistoryEntry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateToHistoryEntryParams {
    /// Unique id of the entry to navigate to.
    pub entry_id: i64,
}

impl NavigateToHistoryEntryParams {
    pub fn new(entry_id: i64) -> Self {
        Self { entry_id }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigateToHistoryEntryReturns {}

cdp_command!(
    NavigateToHistoryEntryParams,
    "Page.navigateToHistoryEntry",
    NavigateToHistoryEntryReturns
);

/// Controls whether page will emit lifecycle events.
/// [setLifecycleEventsEnabled](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-setLifecycleEventsEnabled)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLifecycleEventsEnabledParams {
    pub enabled: bool,
}

impl SetLifecycleEventsEnabledParams {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetLifecycleEventsEnabledReturns {}

cdp_command!(
    SetLifecycleEventsEnabledParams,
    "Page.setLifecycleEventsEnabled",
    SetLifecycleEventsEnabledReturns
);

/// [bringToFront](https://chromedevtools.github.io/devtools-protocol/tot/Page/#method-bringToFront)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BringToFrontParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BringToFrontReturns {}

cdp_command!(BringToFrontParams, "Page.bringToFront", BringToFrontReturns);

/// Fired when frame has been attached to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrameAttached {
    pub frame_id: FrameId,
    pub parent_frame_id: FrameId,
}

cdp_event!(EventFrameAttached, "Page.frameAttached");

/// Fired when frame has been detached from its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrameDetached {
    pub frame_id: FrameId,
}

cdp_event!(EventFrameDetached, "Page.frameDetached");

/// Fired once navigation of the frame has completed. Frame is now associated
/// with the new loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrameNavigated {
    pub frame: Frame,
}

cdp_event!(EventFrameNavigated, "Page.frameNavigated");

/// Fired when frame has started loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrameStartedLoading {
    pub frame_id: FrameId,
}

cdp_event!(EventFrameStartedLoading, "Page.frameStartedLoading");

/// Fired when frame has stopped loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrameStoppedLoading {
    pub frame_id: FrameId,
}

cdp_event!(EventFrameStoppedLoading, "Page.frameStoppedLoading");

/// Fired for top level page lifecycle events such as navigation, load, paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLifecycleEvent {
    pub frame_id: FrameId,
    pub loader_id: LoaderId,
    pub name: String,
    pub timestamp: f64,
}

cdp_event!(EventLifecycleEvent, "Page.lifecycleEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLoadEventFired {
    pub timestamp: f64,
}

cdp_event!(EventLoadEventFired, "Page.loadEventFired");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDomContentEventFired {
    pub timestamp: f64,
}

cdp_event!(EventDomContentEventFired, "Page.domContentEventFired");

/// Fired when same-document navigation happens, e.g. due to history API usage
/// or anchor navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNavigatedWithinDocument {
    pub frame_id: FrameId,
    pub url: String,
}

cdp_event!(EventNavigatedWithinDocument, "Page.navigatedWithinDocument");
