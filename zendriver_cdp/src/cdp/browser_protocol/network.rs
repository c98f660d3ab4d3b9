//! Network domain allows tracking network activities of the page.
//! [Network](https://chromedevtools.github.io/devtools-protocol/tot/Network/)

use serde::{Deserialize, Serialize};

use crate::cdp::{cdp_command, cdp_event, cdp_string_id};

cdp_string_id!(
    /// Unique loader identifier.
    LoaderId
);
cdp_string_id!(
    /// Unique network request identifier.
    RequestId
);

/// Request / response headers as keys / values of JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(serde_json::Value);

impl Headers {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.as_object().and_then(|map| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .and_then(|(_, v)| v.as_str())
        })
    }
}

/// Network level fetch failure reason.
/// [ErrorReason](https://chromedevtools.github.io/devtools-protocol/tot/Network/#type-ErrorReason)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorReason {
    Failed,
    Aborted,
    TimedOut,
    AccessDenied,
    ConnectionClosed,
    ConnectionReset,
    ConnectionRefused,
    ConnectionAborted,
    ConnectionFailed,
    NameNotResolved,
    InternetDisconnected,
    AddressUnreachable,
    BlockedByClient,
    BlockedByResponse,
}

/// Resource type as it was perceived by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    TextTrack,
    #[serde(rename = "XHR")]
    Xhr,
    Fetch,
    Prefetch,
    EventSource,
    WebSocket,
    Manifest,
    SignedExchange,
    Ping,
    CspViolationReport,
    Preflight,
    Other,
}

/// HTTP request data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request URL (without fragment).
    pub url: String,
    /// Fragment of the requested URL starting with hash, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_fragment: Option<String>,
    /// HTTP request method.
    pub method: String,
    /// HTTP request headers.
    pub headers: Headers,
    /// HTTP POST request data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    /// True when the request has POST data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_post_data: Option<bool>,
}

/// HTTP response data (the subset interception and the tests observe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Response URL. This URL can be different from CachedResource.url in case
    /// of redirect.
    pub url: String,
    /// HTTP response status code.
    pub status: i64,
    /// HTTP response status text.
    pub status_text: String,
    /// HTTP response headers.
    pub headers: Headers,
    /// Resource mimeType as determined by the browser.
    pub mime_type: String,
    /// Specifies whether physical connection was actually reused for this
    /// request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_reused: Option<bool>,
    /// Specifies that the request was served from the disk cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_disk_cache: Option<bool>,
}

/// Enables network tracking, network events will now be delivered to the
/// client.
/// [enable](https://chromedevtools.github.io/devtools-protocol/tot/Network/#method-enable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_buffer_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resource_buffer_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableReturns {}

cdp_command!(EnableParams, "Network.enable", EnableReturns);

/// [disable](https://chromedevtools.github.io/devtools-protocol/tot/Network/#method-disable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableReturns {}

cdp_command!(DisableParams, "Network.disable", DisableReturns);

/// Fired when HTTP response is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponseReceived {
    pub request_id: RequestId,
    pub loader_id: LoaderId,
    pub timestamp: f64,
    pub r#type: ResourceType,
    pub response: Response,
}

cdp_event!(EventResponseReceived, "Network.responseReceived");

/// Fired when HTTP request has failed to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLoadingFailed {
    pub request_id: RequestId,
    pub timestamp: f64,
    pub r#type: ResourceType,
    pub error_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled: Option<bool>,
}

cdp_event!(EventLoadingFailed, "Network.loadingFailed");
