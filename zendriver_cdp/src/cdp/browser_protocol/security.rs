//! Security domain.
//! [Security](https://chromedevtools.github.io/devtools-protocol/tot/Security/)

use serde::{Deserialize, Serialize};

use crate::cdp::cdp_command;

/// Enable/disable whether all certificate errors should be ignored.
/// [setIgnoreCertificateErrors](https://chromedevtools.github.io/devtools-protocol/tot/Security/#method-setIgnoreCertificateErrors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIgnoreCertificateErrorsParams {
    /// If true, all certificate errors will be ignored.
    pub ignore: bool,
}

impl SetIgnoreCertificateErrorsParams {
    pub fn new(ignore: bool) -> Self {
        Self { ignore }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetIgnoreCertificateErrorsReturns {}

cdp_command!(
    SetIgnoreCertificateErrorsParams,
    "Security.setIgnoreCertificateErrors",
    SetIgnoreCertificateErrorsReturns
);
