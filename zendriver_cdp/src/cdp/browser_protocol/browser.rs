//! The Browser domain defines methods and events for browser managing.
//! [Browser](https://chromedevtools.github.io/devtools-protocol/tot/Browser/)

use serde::{Deserialize, Serialize};

use crate::cdp::{cdp_command, cdp_string_id};

cdp_string_id!(BrowserContextId);

/// Close browser gracefully.
/// [close](https://chromedevtools.github.io/devtools-protocol/tot/Browser/#method-close)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloseParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloseReturns {}

cdp_command!(CloseParams, "Browser.close", CloseReturns);

/// [getVersion](https://chromedevtools.github.io/devtools-protocol/tot/Browser/#method-getVersion)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetVersionParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVersionReturns {
    /// Protocol version.
    pub protocol_version: String,
    /// Product name, e.g. `HeadlessChrome/119.0.6045.9`.
    pub product: String,
    pub revision: String,
    pub user_agent: String,
    /// V8 version.
    pub js_version: String,
}

cdp_command!(GetVersionParams, "Browser.getVersion", GetVersionReturns);
