//! End-to-end scenarios against a real chromium instance.
//!
//! Ignored by default; run with `cargo test -- --ignored` on a machine with a
//! chromium binary. `ZENDRIVER_TEST_BROWSERS` selects `headless`, `headful`
//! or `both`; `ZENDRIVER_TEST_NO_SANDBOX` disables the sandbox (needed in
//! most containers).

use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::task::JoinHandle;

use zendriver::cdp::browser_protocol::fetch::RequestPattern;
use zendriver::{Browser, BrowserConfig, CdpError, HeadlessMode};

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencode(html))
}

fn urlencode(s: &str) -> String {
    let mut out = String::new();
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn configs() -> Vec<BrowserConfig> {
    let flavors: Vec<HeadlessMode> = match std::env::var("ZENDRIVER_TEST_BROWSERS").as_deref() {
        Ok("headful") => vec![HeadlessMode::False],
        Ok("both") => vec![HeadlessMode::New, HeadlessMode::False],
        _ => vec![HeadlessMode::New],
    };
    let no_sandbox = std::env::var("ZENDRIVER_TEST_NO_SANDBOX")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    flavors
        .into_iter()
        .map(|mode| {
            let mut builder = BrowserConfig::builder().headless_mode(mode);
            if no_sandbox {
                builder = builder.no_sandbox();
            }
            builder.build().expect("valid test browser config")
        })
        .collect()
}

async fn launch(config: BrowserConfig) -> (Browser, JoinHandle<()>) {
    let (browser, mut handler) = Browser::launch(config).await.expect("browser launches");
    let driver = tokio::spawn(async move { while handler.next().await.is_some() {} });
    (browser, driver)
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn simple_navigation() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;
        let tab = browser.main_tab().await.expect("main tab exists");

        let started = Instant::now();
        tab.get("about:blank").await.expect("navigation succeeds");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(tab.url().await.unwrap(), "about:blank");

        browser.close().await.unwrap();
        driver.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn element_click() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;
        let tab = browser.main_tab().await.unwrap();
        tab.get(data_url(
            r#"<button id="b" onclick="window.__c=1">x</button>"#,
        ))
        .await
        .unwrap();

        tab.query("#b").await.unwrap().click().await.unwrap();

        let clicked: i64 = tab
            .evaluate("window.__c")
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(clicked, 1);

        browser.close().await.unwrap();
        driver.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn escape_closes_modal() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;
        let tab = browser.main_tab().await.unwrap();
        tab.get(data_url(
            r#"<body><script>
                window.mainpageState = "open";
                document.addEventListener("keydown", (ev) => {
                    if (ev.key === "Escape") { window.mainpageState = "closed"; }
                });
            </script></body>"#,
        ))
        .await
        .unwrap();

        let started = Instant::now();
        tab.key_press("Escape").await.unwrap();

        let state: String = tab
            .evaluate("window.mainpageState")
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(state, "closed");
        assert!(started.elapsed() < Duration::from_secs(1));

        browser.close().await.unwrap();
        driver.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn request_interception_fulfill() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;
        let tab = browser.main_tab().await.unwrap();
        tab.get("about:blank").await.unwrap();

        let mut interceptor = tab
            .intercept(vec![RequestPattern::url("*/api/v1/*")])
            .await
            .unwrap();
        let worker = tokio::spawn(async move {
            while let Some(request) = interceptor.next().await {
                request
                    .fulfill(
                        200,
                        vec![
                            ("content-type".to_string(), "application/json".to_string()),
                            ("access-control-allow-origin".to_string(), "*".to_string()),
                        ],
                        br#"{"ok":true}"#,
                    )
                    .await
                    .unwrap();
            }
        });

        // the host does not resolve: a body can only come from the handler
        let body: String = tab
            .evaluate("fetch('http://nowhere.invalid/api/v1/ping').then(r => r.text())")
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(body, r#"{"ok":true}"#);

        browser.close().await.unwrap();
        driver.await.unwrap();
        worker.abort();
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn concurrent_tabs() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;

        let urls: Vec<String> = (0..5)
            .map(|n| data_url(&format!("<html><head><title>tab-{n}</title></head></html>")))
            .collect();
        let tabs = futures::future::try_join_all(urls.iter().map(|url| browser.new_tab(url)))
            .await
            .unwrap();
        futures::future::try_join_all(
            tabs.iter()
                .zip(urls.iter())
                .map(|(tab, url)| tab.get(url.clone())),
        )
        .await
        .unwrap();

        let mut session_ids = Vec::new();
        for (n, tab) in tabs.iter().enumerate() {
            assert_eq!(tab.title().await.unwrap(), format!("tab-{n}"));
            session_ids.push(tab.session_id());
        }
        session_ids.sort();
        session_ids.dedup();
        assert_eq!(session_ids.len(), 5, "session ids must be pairwise distinct");

        browser.close().await.unwrap();
        driver.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a chromium binary"]
async fn graceful_shutdown_fails_pending_waits() {
    for config in configs() {
        let (mut browser, driver) = launch(config).await;
        let tab = browser.main_tab().await.unwrap();
        tab.get("about:blank").await.unwrap();

        let waiter = tokio::spawn(async move {
            tab.wait_for("#never", Some(Duration::from_secs(30))).await
        });
        // give the wait loop a chance to start
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        browser.close().await.unwrap();

        let result = waiter.await.unwrap();
        assert!(
            matches!(
                result,
                Err(CdpError::ConnectionClosed(_) | CdpError::TargetGone(_))
            ),
            "unexpected result: {result:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));

        driver.await.unwrap();
    }
}
