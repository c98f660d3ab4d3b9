use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::channel::mpsc::{channel, Sender};
use futures::channel::oneshot::channel as oneshot_channel;
use futures::SinkExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as ProcessCommand};

use zendriver_types::{CdpJsonEventMessage, Command, CommandResponse, MethodId};

use crate::cmd::{to_command_response, CommandMessage};
use crate::conn::Connection;
use crate::error::{CdpError, ConfigError, ErrorContext, Result};
use crate::handler::{Handler, HandlerConfig, HandlerMessage, NAVIGATION_TIMEOUT, REQUEST_TIMEOUT};
use crate::listeners::{
    subscription, subscription_raw, EventCallback, EventHandlerRequest, EventStream, SessionFilter,
};
use crate::tab::Tab;
use zendriver_cdp::cdp::browser_protocol::browser::{GetVersionParams, GetVersionReturns};
use zendriver_cdp::cdp::browser_protocol::target::{CreateTargetParams, TargetId, TargetInfo};
use zendriver_cdp::cdp::{CdpEventMessage, EventKind};

/// Default time to wait for the spawned browser to surface its debugger
/// endpoint.
pub const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);
/// Grace period between `Browser.close` and forcible termination.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

static PROFILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A handle to a running chromium instance.
///
/// Obtained by [`Browser::launch`]ing a child process or
/// [`Browser::connect`]ing to an already running one. Both also return the
/// [`Handler`] stream the caller must spawn and poll; the browser is only as
/// alive as that task.
#[derive(Debug)]
pub struct Browser {
    /// Channel to the handler that drives the websocket.
    sender: Sender<HandlerMessage>,
    /// How the spawned chromium instance was configured, if any.
    config: Option<BrowserConfig>,
    /// The spawned chromium instance.
    child: Option<Child>,
    /// The debug websocket url of the chromium instance.
    debug_ws_url: String,
    /// Profile directory created by the launcher, removed again on close.
    temp_user_data_dir: Option<PathBuf>,
}

impl Browser {
    /// Connect to an already running chromium instance via its
    /// `ws://host:port/devtools/browser/<id>` endpoint.
    pub async fn connect(debug_ws_url: impl Into<String>) -> Result<(Self, Handler)> {
        let debug_ws_url = debug_ws_url.into();
        let endpoint = url::Url::parse(&debug_ws_url)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(CdpError::msg(format!(
                "expected a ws:// debugger endpoint, got {debug_ws_url}"
            )));
        }
        let conn = Connection::<CdpEventMessage>::connect(&debug_ws_url).await?;

        let (tx, rx) = channel(64);
        let handler = Handler::new(conn, rx, HandlerConfig::default());
        let browser = Self {
            sender: tx,
            config: None,
            child: None,
            debug_ws_url,
            temp_user_data_dir: None,
        };
        Ok((browser, handler))
    }

    /// Launches a new chromium instance in the background and attaches to its
    /// debug websocket.
    ///
    /// Fails if no executable could be found or the endpoint did not surface
    /// within the launch timeout.
    pub async fn launch(mut config: BrowserConfig) -> Result<(Self, Handler)> {
        let temp_user_data_dir = if config.user_data_dir.is_none() {
            let dir = std::env::temp_dir().join(format!(
                "zendriver-profile-{}-{}",
                std::process::id(),
                PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            std::fs::create_dir_all(&dir)?;
            config.user_data_dir = Some(dir.clone());
            Some(dir)
        } else {
            None
        };

        let mut child = config.spawn()?;
        let user_data_dir = config
            .user_data_dir
            .clone()
            .expect("user data dir is set above");

        let debug_ws_url = match tokio::time::timeout(
            config.launch_timeout,
            ws_url_from_output(&mut child, &config.host, config.port, &user_data_dir),
        )
        .await
        {
            Ok(Ok(url)) => url,
            Ok(Err(err)) => {
                let _ = child.start_kill();
                return Err(err);
            }
            Err(_) => {
                let _ = child.start_kill();
                return Err(CdpError::Timeout(ErrorContext::default()));
            }
        };

        let conn = Connection::<CdpEventMessage>::connect(&debug_ws_url).await?;

        let (tx, rx) = channel(64);
        let handler = Handler::new(conn, rx, config.handler_config());
        let browser = Self {
            sender: tx,
            config: Some(config),
            child: Some(child),
            debug_ws_url,
            temp_user_data_dir,
        };
        Ok((browser, handler))
    }

    /// The address of the websocket this browser is attached to.
    pub fn websocket_address(&self) -> &String {
        &self.debug_ws_url
    }

    /// Version information of the connected browser.
    pub async fn version(&self) -> Result<GetVersionReturns> {
        Ok(self.execute(GetVersionParams::default()).await?.result)
    }

    /// Call a browser-level method.
    pub async fn execute<T: Command>(&self, cmd: T) -> Result<CommandResponse<T::Response>> {
        let (tx, rx) = oneshot_channel();
        let method = cmd.identifier();
        let msg = CommandMessage::new(cmd, tx)?;

        self.sender
            .clone()
            .send(HandlerMessage::Command(msg))
            .await?;
        let resp = rx.await??;
        to_command_response::<T>(resp, method)
    }

    /// Create a new tab and return its handle once the page initialized.
    pub async fn new_tab(&self, params: impl Into<CreateTargetParams>) -> Result<Tab> {
        let (tx, rx) = oneshot_channel();
        self.sender
            .clone()
            .send(HandlerMessage::CreatePage(params.into(), tx))
            .await?;
        rx.await?
    }

    /// Create a new tab on `about:blank`.
    pub async fn new_blank_tab(&self) -> Result<Tab> {
        self.new_tab(CreateTargetParams::default()).await
    }

    /// The current set of targets as the browser reports them.
    pub async fn fetch_targets(&self) -> Result<Vec<TargetInfo>> {
        let (tx, rx) = oneshot_channel();
        self.sender
            .clone()
            .send(HandlerMessage::FetchTargets(tx))
            .await?;
        rx.await?
    }

    /// A handle for the given target, attaching to it on first use.
    pub async fn get_tab(&self, target_id: TargetId) -> Result<Tab> {
        let (tx, rx) = oneshot_channel();
        self.sender
            .clone()
            .send(HandlerMessage::GetPage(target_id, tx))
            .await?;
        rx.await?
    }

    /// Handles for all page targets.
    pub async fn tabs(&self) -> Result<Vec<Tab>> {
        let infos = self.fetch_targets().await?;
        let mut tabs = Vec::new();
        for info in infos.into_iter().filter(TargetInfo::is_page) {
            tabs.push(self.get_tab(info.target_id).await?);
        }
        Ok(tabs)
    }

    /// The first page target, the one a freshly launched browser opens.
    pub async fn main_tab(&self) -> Result<Tab> {
        let info = self
            .fetch_targets()
            .await?
            .into_iter()
            .find(TargetInfo::is_page)
            .ok_or_else(|| CdpError::msg("no page target available"))?;
        self.get_tab(info.target_id).await
    }

    /// A stream of typed events across all sessions.
    pub async fn event_stream<T: EventKind + Unpin>(&self) -> Result<EventStream<T>> {
        let (req, stream) = subscription::<T>(SessionFilter::Any);
        self.sender
            .clone()
            .send(HandlerMessage::AddEventListener(req))
            .await?;
        Ok(stream)
    }

    /// A stream of typed events restricted to browser-level traffic, i.e.
    /// events carrying no session.
    pub async fn browser_event_stream<T: EventKind + Unpin>(&self) -> Result<EventStream<T>> {
        let (req, stream) = subscription::<T>(SessionFilter::Browser);
        self.sender
            .clone()
            .send(HandlerMessage::AddEventListener(req))
            .await?;
        Ok(stream)
    }

    /// A stream of raw json events for a method outside the typed set.
    pub async fn raw_event_stream(
        &self,
        method: impl Into<MethodId>,
    ) -> Result<EventStream<CdpJsonEventMessage>> {
        let (req, stream) = subscription_raw(method.into(), SessionFilter::Any);
        self.sender
            .clone()
            .send(HandlerMessage::AddEventListener(req))
            .await?;
        Ok(stream)
    }

    /// Attaches a fire-and-forget callback for a typed event kind across all
    /// sessions.
    pub async fn add_event_handler<T: EventKind>(&self, callback: EventCallback) -> Result<()> {
        self.sender
            .clone()
            .send(HandlerMessage::AddEventHandler(EventHandlerRequest {
                method: T::event_identifier(),
                filter: SessionFilter::Any,
                callback,
            }))
            .await?;
        Ok(())
    }

    /// Gracefully shut the browser down: `Browser.close`, a grace period,
    /// then forcible termination of the child process.
    ///
    /// Every pending operation on any tab resolves with
    /// [`CdpError::ConnectionClosed`].
    pub async fn close(&mut self) -> Result<()> {
        let (tx, rx) = oneshot_channel();
        let graceful = match self
            .sender
            .clone()
            .send(HandlerMessage::CloseBrowser(tx))
            .await
        {
            Ok(()) => matches!(
                tokio::time::timeout(CLOSE_GRACE, rx).await,
                Ok(Ok(Ok(())))
            ),
            Err(_) => false,
        };
        if !graceful {
            tracing::warn!("browser did not close gracefully, killing the process");
        }

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(CLOSE_GRACE, child.wait()).await {
                Ok(_) => {}
                Err(_) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }
            }
        }
        self.cleanup_temp_dir();
        Ok(())
    }

    fn cleanup_temp_dir(&mut self) {
        if let Some(dir) = self.temp_user_data_dir.take() {
            if let Err(err) = std::fs::remove_dir_all(&dir) {
                tracing::debug!("failed to remove temporary profile {}: {err}", dir.display());
            }
        }
    }

    /// How the spawned instance was configured, if this handle launched one.
    pub fn config(&self) -> Option<&BrowserConfig> {
        self.config.as_ref()
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        self.cleanup_temp_dir();
    }
}

/// Scrape the `ws://` endpoint from the child's stderr, falling back to the
/// `DevToolsActivePort` file and the `/json/version` endpoint.
async fn ws_url_from_output(
    child: &mut Child,
    host: &str,
    port: u16,
    user_data_dir: &Path,
) -> Result<String> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CdpError::msg("child process has no piped stderr"))?;
    let mut lines = BufReader::new(stderr).lines();
    let mut stderr_open = true;

    loop {
        if stderr_open {
            match tokio::time::timeout(Duration::from_millis(500), lines.next_line()).await {
                Ok(Ok(Some(line))) => {
                    if let Some(ws) = line.rsplit("listening on ").next() {
                        if ws.starts_with("ws") && ws.contains("devtools/browser") {
                            return Ok(ws.trim().to_string());
                        }
                    }
                    continue;
                }
                Ok(Ok(None)) => stderr_open = false,
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => {}
            }
        } else {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        if let Some(url) = ws_url_from_active_port_file(host, user_data_dir) {
            return Ok(url);
        }
        if port != 0 {
            if let Ok(url) = fetch_ws_url(host, port).await {
                return Ok(url);
            }
        }
    }
}

/// Chromium writes `<port>\n<browser path>` into `DevToolsActivePort` inside
/// the profile directory once the debugger is up.
fn ws_url_from_active_port_file(host: &str, user_data_dir: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(user_data_dir.join("DevToolsActivePort")).ok()?;
    let mut lines = contents.lines();
    let port: u16 = lines.next()?.trim().parse().ok()?;
    let path = lines.next()?.trim();
    if path.is_empty() {
        return None;
    }
    Some(format!("ws://{host}:{port}{path}"))
}

/// Ask the debug http endpoint for the browser websocket url.
async fn fetch_ws_url(host: &str, port: u16) -> Result<String> {
    let url = format!("http://{host}:{port}/json/version");
    let body = reqwest::get(&url).await?.text().await?;
    let resp: serde_json::Value = serde_json::from_str(&body)?;
    resp.get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| CdpError::msg("no webSocketDebuggerUrl in /json/version"))
}

/// Headless flavor to launch the browser with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadlessMode {
    /// A visible window.
    False,
    /// The classic `--headless` mode.
    #[default]
    True,
    /// The unified `--headless=new` mode.
    New,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Which headless flavor to run, if any.
    pub headless: HeadlessMode,
    /// Whether to run the browser with its sandbox.
    pub sandbox: bool,
    /// Launch the browser with a specific window width and height.
    pub window_size: Option<(u32, u32)>,
    /// Host the debugging endpoint binds to.
    pub host: String,
    /// Debugging port; 0 lets the browser pick a free one.
    pub port: u16,
    /// Path of the browser executable.
    pub executable: PathBuf,
    /// Profile directory; a temporary one is created (and removed again)
    /// when unset.
    pub user_data_dir: Option<PathBuf>,
    /// Additional arguments passed verbatim.
    pub args: Vec<String>,
    /// UI language, passed as `--lang`.
    pub lang: Option<String>,
    /// Adds flags useful against automation detection.
    pub expert: bool,
    /// Environment variables for the browser process.
    pub process_envs: Option<HashMap<String, String>>,
    /// How long to wait for the debugger endpoint to surface.
    pub launch_timeout: Duration,
    /// Response window for any single cdp command.
    pub request_timeout: Duration,
    /// Window for a navigation to finish loading.
    pub navigation_timeout: Duration,
    /// Whether targets ignore certificate errors.
    pub ignore_https_errors: bool,
}

impl BrowserConfig {
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }

    pub fn with_executable(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::builder().chrome_executable(path).build()
    }

    pub(crate) fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            ignore_https_errors: self.ignore_https_errors,
            request_timeout: self.request_timeout,
            navigation_timeout: self.navigation_timeout,
        }
    }

    pub(crate) fn spawn(&self) -> io::Result<Child> {
        let mut cmd = ProcessCommand::new(&self.executable);
        cmd.args(self.launch_args())
            .stdin(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref envs) = self.process_envs {
            cmd.envs(envs);
        }
        cmd.spawn()
    }

    fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.port),
            "--enable-logging=stderr".to_string(),
            "--log-level=0".to_string(),
        ];
        args.extend(DEFAULT_ARGS.iter().map(|arg| arg.to_string()));

        if let Some(ref dir) = self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={width},{height}"));
        }
        if let Some(ref lang) = self.lang {
            args.push(format!("--lang={lang}"));
        }
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
            args.push("--disable-setuid-sandbox".to_string());
        }
        match self.headless {
            HeadlessMode::False => {}
            HeadlessMode::True => {
                args.push("--headless".to_string());
                args.push("--hide-scrollbars".to_string());
                args.push("--mute-audio".to_string());
            }
            HeadlessMode::New => {
                args.push("--headless=new".to_string());
                args.push("--hide-scrollbars".to_string());
                args.push("--mute-audio".to_string());
            }
        }
        if self.expert {
            args.extend(EXPERT_ARGS.iter().map(|arg| arg.to_string()));
        }
        args.extend(self.args.iter().cloned());
        args
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfigBuilder {
    headless: HeadlessMode,
    sandbox: bool,
    window_size: Option<(u32, u32)>,
    host: String,
    port: u16,
    executable: Option<PathBuf>,
    user_data_dir: Option<PathBuf>,
    args: Vec<String>,
    lang: Option<String>,
    expert: bool,
    process_envs: Option<HashMap<String, String>>,
    launch_timeout: Duration,
    request_timeout: Duration,
    navigation_timeout: Duration,
    ignore_https_errors: bool,
}

impl Default for BrowserConfigBuilder {
    fn default() -> Self {
        Self {
            headless: HeadlessMode::default(),
            sandbox: true,
            window_size: None,
            host: "127.0.0.1".to_string(),
            port: 0,
            executable: None,
            user_data_dir: None,
            args: Vec::new(),
            lang: None,
            expert: false,
            process_envs: None,
            launch_timeout: LAUNCH_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            navigation_timeout: NAVIGATION_TIMEOUT,
            ignore_https_errors: true,
        }
    }
}

/// Flags the launcher owns; user-supplied duplicates are a configuration
/// error rather than a silent conflict.
const MANAGED_FLAGS: &[&str] = &[
    "--remote-debugging-port",
    "--user-data-dir",
    "--headless",
    "--lang",
    "--window-size",
    "--no-sandbox",
];

impl BrowserConfigBuilder {
    pub fn with_head(mut self) -> Self {
        self.headless = HeadlessMode::False;
        self
    }

    pub fn headless_mode(mut self, mode: HeadlessMode) -> Self {
        self.headless = mode;
        self
    }

    pub fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn chrome_executable(mut self, path: impl AsRef<Path>) -> Self {
        self.executable = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn user_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.user_data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn expert(mut self) -> Self {
        self.expert = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.process_envs
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), val.into());
        self
    }

    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.process_envs
            .get_or_insert_with(HashMap::new)
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, ignore: bool) -> Self {
        self.ignore_https_errors = ignore;
        self
    }

    pub fn build(self) -> Result<BrowserConfig, ConfigError> {
        if let Some((width, height)) = self.window_size {
            if width == 0 || height == 0 {
                return Err(ConfigError("window size must be non-zero".to_string()));
            }
        }
        for arg in &self.args {
            let flag = arg.split('=').next().unwrap_or(arg);
            if MANAGED_FLAGS.contains(&flag) {
                return Err(ConfigError(format!(
                    "argument {flag} is managed by the launcher, set it through the builder"
                )));
            }
        }

        let executable = match self.executable {
            Some(executable) => executable,
            None => default_executable().map_err(ConfigError)?,
        };

        Ok(BrowserConfig {
            headless: self.headless,
            sandbox: self.sandbox,
            window_size: self.window_size,
            host: self.host,
            port: self.port,
            executable,
            user_data_dir: self.user_data_dir,
            args: self.args,
            lang: self.lang,
            expert: self.expert,
            process_envs: self.process_envs,
            launch_timeout: self.launch_timeout,
            request_timeout: self.request_timeout,
            navigation_timeout: self.navigation_timeout,
            ignore_https_errors: self.ignore_https_errors,
        })
    }
}

/// Returns the path to Chrome's executable.
///
/// The filenames `google-chrome-stable`, `chromium`, `chromium-browser`,
/// `chrome` and `chrome-browser` are searched for in standard places. If
/// that fails, `/Applications/Google Chrome.app/...` (on macOS) or the
/// registry (on Windows) is consulted.
pub fn default_executable() -> Result<PathBuf, String> {
    for app in &[
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
        "chrome-browser",
    ] {
        if let Ok(path) = which::which(app) {
            return Ok(dunce::canonicalize(&path).unwrap_or(path));
        }
    }

    #[cfg(target_os = "macos")]
    {
        let default_paths = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ][..];
        for path in default_paths {
            if Path::new(path).exists() {
                return Ok(path.into());
            }
        }
    }

    #[cfg(windows)]
    {
        if let Some(path) = chrome_path_from_registry() {
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err("could not auto detect a chrome executable".to_string())
}

#[cfg(windows)]
fn chrome_path_from_registry() -> Option<PathBuf> {
    winreg::RegKey::predef(winreg::enums::HKEY_LOCAL_MACHINE)
        .open_subkey("SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\App Paths\\chrome.exe")
        .and_then(|key| key.get_value::<String, _>(""))
        .map(PathBuf::from)
        .ok()
}

/// These are passed to the browser by default, the puppeteer set.
static DEFAULT_ARGS: [&str; 23] = [
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--enable-automation",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Extra flags for sites that probe for automation.
static EXPERT_ARGS: [&str; 3] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-site-isolation-trials",
    "--disable-web-security",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> BrowserConfigBuilder {
        BrowserConfig::builder().chrome_executable("/usr/bin/true")
    }

    #[test]
    fn managed_flags_are_rejected() {
        let err = builder()
            .arg("--user-data-dir=/tmp/elsewhere")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("--user-data-dir"));

        assert!(builder().arg("--disable-gpu").build().is_ok());
    }

    #[test]
    fn zero_window_size_is_rejected() {
        assert!(builder().window_size(0, 600).build().is_err());
        assert!(builder().window_size(800, 600).build().is_ok());
    }

    #[test]
    fn launch_args_reflect_config() {
        let config = builder()
            .headless_mode(HeadlessMode::New)
            .no_sandbox()
            .window_size(1280, 720)
            .lang("en-US")
            .expert()
            .user_data_dir("/tmp/profile")
            .build()
            .unwrap();
        let args = config.launch_args();
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--window-size=1280,720".to_string()));
        assert!(args.contains(&"--lang=en-US".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--remote-debugging-port=")));
    }

    #[test]
    fn headful_config_omits_headless_flags() {
        let config = builder().with_head().build().unwrap();
        let args = config.launch_args();
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn active_port_file_parses() {
        let dir = std::env::temp_dir().join(format!(
            "zendriver-test-port-{}-{}",
            std::process::id(),
            PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("DevToolsActivePort"),
            "9222\n/devtools/browser/abc-def\n",
        )
        .unwrap();
        assert_eq!(
            ws_url_from_active_port_file("127.0.0.1", &dir).as_deref(),
            Some("ws://127.0.0.1:9222/devtools/browser/abc-def")
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
