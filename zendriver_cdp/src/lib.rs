//! Typed bindings for the Chrome DevTools Protocol domains zendriver drives.
//!
//! The shapes in this crate mirror the published protocol json; they carry no
//! logic besides (de)serialization. Everything speaks through
//! [`zendriver_types`] for the envelope types.

pub mod cdp;

use crate::cdp::browser_protocol::page::NavigateParams;
use crate::cdp::browser_protocol::target::CreateTargetParams;
use crate::cdp::js_protocol::runtime::EvaluateParams;

/// convenience fixups
impl<T: Into<String>> From<T> for CreateTargetParams {
    fn from(url: T) -> Self {
        CreateTargetParams::new(url)
    }
}

impl Default for CreateTargetParams {
    fn default() -> Self {
        "about:blank".into()
    }
}

impl<T: Into<String>> From<T> for NavigateParams {
    fn from(url: T) -> Self {
        NavigateParams::new(url)
    }
}

impl<T: Into<String>> From<T> for EvaluateParams {
    fn from(expr: T) -> Self {
        EvaluateParams::new(expr)
    }
}
