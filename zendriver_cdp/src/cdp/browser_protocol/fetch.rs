//! A domain for letting clients substitute browser's network layer with
//! client code.
//! [Fetch](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/)

use serde::{Deserialize, Serialize};

use crate::cdp::browser_protocol::network::{ErrorReason, Request, ResourceType};
use crate::cdp::browser_protocol::page::FrameId;
use crate::cdp::{cdp_command, cdp_event, cdp_string_id};
use zendriver_types::Binary;

cdp_string_id!(
    /// Unique request identifier. Note that this does not identify individual
    /// HTTP requests that are part of a network request.
    RequestId
);

/// Stages of the request to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStage {
    /// Request will intercept before the request is sent.
    Request,
    /// Response will intercept after the response is received (but before
    /// response body is received).
    Response,
}

/// [RequestPattern](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/#type-RequestPattern)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// Wildcards (`'*'` -> zero or more, `'?'` -> exactly one) are allowed.
    /// Escape character is backslash. Omitting is equivalent to `"*"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    /// Stage at which to begin intercepting requests. Default is Request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_stage: Option<RequestStage>,
}

impl RequestPattern {
    pub fn url(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: Some(url_pattern.into()),
            resource_type: None,
            request_stage: None,
        }
    }
}

/// Response HTTP header entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Enables issuing of requestPaused events. A request will be paused until
/// client calls one of failRequest, fulfillRequest or continueRequest.
/// [enable](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/#method-enable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableParams {
    /// If specified, only requests matching any of these patterns will produce
    /// fetchRequested event and will be paused until clients response. If not
    /// set, all requests will be affected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<RequestPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_auth_requests: Option<bool>,
}

impl EnableParams {
    pub fn new(patterns: Vec<RequestPattern>) -> Self {
        Self {
            patterns: Some(patterns),
            handle_auth_requests: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableReturns {}

cdp_command!(EnableParams, "Fetch.enable", EnableReturns);

/// Disables the fetch domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableReturns {}

cdp_command!(DisableParams, "Fetch.disable", DisableReturns);

/// Continues the request, optionally modifying some of its parameters.
/// [continueRequest](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/#method-continueRequest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueRequestParams {
    /// An id the client received in requestPaused event.
    pub request_id: RequestId,
    /// If set, the request url will be modified in a way that's not observable
    /// by page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// If set, overrides the post data in the request. (Encoded as a base64
    /// string when passed over JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<Binary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderEntry>>,
}

impl ContinueRequestParams {
    pub fn new(request_id: impl Into<RequestId>) -> Self {
        Self {
            request_id: request_id.into(),
            url: None,
            method: None,
            post_data: None,
            headers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinueRequestReturns {}

cdp_command!(
    ContinueRequestParams,
    "Fetch.continueRequest",
    ContinueRequestReturns
);

/// Provides response to the request.
/// [fulfillRequest](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/#method-fulfillRequest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillRequestParams {
    /// An id the client received in requestPaused event.
    pub request_id: RequestId,
    /// An HTTP response code.
    pub response_code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Vec<HeaderEntry>>,
    /// A response body. (Encoded as a base64 string when passed over JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Binary>,
    /// A textual representation of responseCode. If absent, a standard phrase
    /// matching responseCode is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_phrase: Option<String>,
}

impl FulfillRequestParams {
    pub fn new(request_id: impl Into<RequestId>, response_code: i64) -> Self {
        Self {
            request_id: request_id.into(),
            response_code,
            response_headers: None,
            body: None,
            response_phrase: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FulfillRequestReturns {}

cdp_command!(
    FulfillRequestParams,
    "Fetch.fulfillRequest",
    FulfillRequestReturns
);

/// Causes the request to fail with specified reason.
/// [failRequest](https://chromedevtools.github.io/devtools-protocol/tot/Fetch/#method-failRequest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRequestParams {
    /// An id the client received in requestPaused event.
    pub request_id: RequestId,
    /// Causes the request to fail with the given reason.
    pub error_reason: ErrorReason,
}

impl FailRequestParams {
    pub fn new(request_id: impl Into<RequestId>, error_reason: ErrorReason) -> Self {
        Self {
            request_id: request_id.into(),
            error_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FailRequestReturns {}

cdp_command!(FailRequestParams, "Fetch.failRequest", FailRequestReturns);

/// Issued when the domain is enabled and the request URL matches the specified
/// filter. The request is paused until the client responds with one of
/// continueRequest, failRequest or fulfillRequest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequestPaused {
    /// Each request the page makes will have a unique id.
    pub request_id: RequestId,
    /// The details of the request.
    pub request: Request,
    /// The id of the frame that initiated the request.
    pub frame_id: FrameId,
    /// How the requested resource will be used.
    pub resource_type: ResourceType,
    /// Response error if intercepted at response stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_error_reason: Option<ErrorReason>,
    /// Response code if intercepted at response stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status_code: Option<i64>,
    /// Response headers if intercepted at the response stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Vec<HeaderEntry>>,
    /// If the intercepted request had a corresponding Network.requestWillBeSent
    /// event fired for it, then this networkId will be the same as the
    /// requestId present in the requestWillBeSent event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<RequestId>,
}

impl EventRequestPaused {
    /// Whether this pause happened at the response stage.
    pub fn is_response_stage(&self) -> bool {
        self.response_status_code.is_some() || self.response_error_reason.is_some()
    }
}

cdp_event!(EventRequestPaused, "Fetch.requestPaused");
