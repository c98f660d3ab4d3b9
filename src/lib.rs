//! Zendriver drives Chromium-family browsers over the Chrome DevTools
//! Protocol, no webdriver in between.
//!
//! [`Browser::launch`] spawns a browser (or [`Browser::connect`] attaches to
//! a running one) and returns the handle together with a [`Handler`]: the
//! stream that owns the websocket and every piece of protocol state. Spawn
//! it onto a task and keep polling; tabs and elements are channels into that
//! task.
//!
//! ```no_run
//! use futures::StreamExt;
//! use zendriver::{Browser, BrowserConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut browser, mut handler) =
//!         Browser::launch(BrowserConfig::builder().build()?).await?;
//!     let driver = tokio::spawn(async move { while handler.next().await.is_some() {} });
//!
//!     let tab = browser.new_tab("https://en.wikipedia.org").await?;
//!     tab.wait_for("#searchInput", None).await?.type_text("zendriver").await?;
//!     tab.key_press("Enter").await?;
//!
//!     browser.close().await?;
//!     driver.await?;
//!     Ok(())
//! }
//! ```

pub mod browser;
mod cmd;
pub mod conn;
pub mod element;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod js;
mod keys;
pub mod listeners;
pub mod tab;

pub use crate::browser::{
    default_executable, Browser, BrowserConfig, BrowserConfigBuilder, HeadlessMode,
};
pub use crate::element::Element;
pub use crate::error::{CdpError, ConfigError, ErrorContext, Result};
pub use crate::fetch::{InterceptedRequest, RequestHandler, RequestInterceptor};
pub use crate::handler::{Handler, HandlerConfig};
pub use crate::js::{EvaluationResult, RemoteObjectRef};
pub use crate::listeners::{EventCallback, EventDelivery, EventStream};
pub use crate::tab::Tab;

pub use zendriver_cdp::cdp;
pub use zendriver_types as types;
