//! Web portal sign-in over the Chrome DevTools Protocol.
//!
//! The portal only hands out the Citrix launch file after a form sign-in.
//! [`ChromeBrowser`] starts a Chromium-based browser with a remote debugging
//! port and drives the page through [`PortalPage`]; [`sign_in`] and
//! [`request_launch_file`] hold the page-level steps.

use crate::config::Credentials;
use crate::preflight::{poll_until, PollConfig};
use crate::AutomationError;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DEBUG_PORT: u16 = 9222;

pub const USERNAME_LABEL: &str = "User name:";
pub const PASSWORD_LABEL: &str = "Password:";
pub const LOG_ON_LINK: &str = "Log On";

/// A page the portal can be driven through.
pub trait PortalPage {
    /// Evaluate `script` in the page and return its value.
    fn evaluate(&self, script: &str) -> Result<Value, AutomationError>;

    /// Save downloads started by the page into `dir`.
    fn allow_downloads(&self, dir: &Path) -> Result<(), AutomationError>;
}

/// Fill the user name and password fields and submit the form.
#[instrument(skip_all)]
pub fn sign_in(
    page: &dyn PortalPage,
    credentials: &Credentials,
    poll: PollConfig,
) -> Result<(), AutomationError> {
    info!("Filling in credentials");
    run_until_true(
        page,
        &fill_field_script(USERNAME_LABEL, &credentials.username),
        &format!("textbox '{USERNAME_LABEL}'"),
        poll,
    )?;
    run_until_true(
        page,
        &fill_field_script(PASSWORD_LABEL, &credentials.password),
        &format!("textbox '{PASSWORD_LABEL}'"),
        poll,
    )?;

    info!("Logging in");
    run_until_true(
        page,
        &click_link_script(LOG_ON_LINK),
        &format!("link '{LOG_ON_LINK}'"),
        poll,
    )
}

/// Wait for the application link and click it, which starts the launch file
/// download.
#[instrument(skip(page, poll))]
pub fn request_launch_file(
    page: &dyn PortalPage,
    app_link: &str,
    poll: PollConfig,
) -> Result<(), AutomationError> {
    info!("Waiting for the {} link to appear", app_link);
    run_until_true(
        page,
        &click_link_script(app_link),
        &format!("link '{app_link}'"),
        poll,
    )?;
    info!("{} link clicked", app_link);
    Ok(())
}

/// Re-run `script` until it evaluates to `true`. A script error counts as a
/// miss; the last one is returned if every attempt fails.
fn run_until_true(
    page: &dyn PortalPage,
    script: &str,
    what: &str,
    poll: PollConfig,
) -> Result<(), AutomationError> {
    let mut last_error = None;
    let (done, attempts) = poll_until(poll, |_| match page.evaluate(script) {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            debug!("Evaluating script for {} failed: {}", what, e);
            last_error = Some(e);
            false
        }
    });
    if done {
        return Ok(());
    }
    match last_error {
        Some(e) => Err(e),
        None => Err(AutomationError::ElementNotFound(format!(
            "{what} not found on the portal page after {attempts} attempts"
        ))),
    }
}

/// Script that fills the text input labelled `label` and returns whether it
/// found one.
pub fn fill_field_script(label: &str, value: &str) -> String {
    format!(
        r#"(() => {{
  const wanted = {label}.trim().toLowerCase();
  const names = (el) => [
    ...Array.from(el.labels || [], (l) => l.textContent),
    el.getAttribute('aria-label') || '',
    el.getAttribute('placeholder') || '',
  ].map((t) => t.trim().toLowerCase());
  const field = Array.from(document.querySelectorAll('input'))
    .find((el) => names(el).includes(wanted));
  if (!field) return false;
  field.focus();
  field.value = {value};
  field.dispatchEvent(new Event('input', {{ bubbles: true }}));
  field.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
        label = js_string(label),
        value = js_string(value),
    )
}

/// Script that clicks the first link whose text contains `text` and returns
/// whether it found one.
pub fn click_link_script(text: &str) -> String {
    format!(
        r#"(() => {{
  const wanted = {text};
  const link = Array.from(document.querySelectorAll('a, [role="link"]'))
    .find((el) => (el.textContent || '').includes(wanted));
  if (!link) return false;
  link.click();
  return true;
}})()"#,
        text = js_string(text),
    )
}

/// JSON string literals are valid JavaScript string literals.
fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Lightweight Chrome DevTools Protocol client for a browser started with
/// `--remote-debugging-port`.
#[derive(Debug, Clone)]
pub struct CdpClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct TabInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub websocket_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CdpRequest<'a> {
    id: u32,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CdpResponse {
    id: Option<u32>,
    result: Option<Value>,
    error: Option<Value>,
}

impl CdpClient {
    pub fn new(debug_port: u16) -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{debug_port}"),
            client: reqwest::Client::new(),
        }
    }

    /// Check if a browser is listening with DevTools enabled
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/json/version", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn get_tabs(&self) -> Result<Vec<TabInfo>, AutomationError> {
        let response = self
            .client
            .get(format!("{}/json/list", self.base_url))
            .send()
            .await
            .map_err(|e| AutomationError::PlatformError(format!("Failed to get tabs: {e}")))?;

        let tabs: Vec<TabInfo> = response
            .json()
            .await
            .map_err(|e| AutomationError::PlatformError(format!("Failed to parse tabs: {e}")))?;

        debug!("Found {} open tabs", tabs.len());
        Ok(tabs)
    }

    /// First page target, which is the tab the browser was started with.
    pub async fn first_page(&self) -> Result<Option<TabInfo>, AutomationError> {
        Ok(self
            .get_tabs()
            .await?
            .into_iter()
            .find(|tab| tab.kind == "page" && tab.websocket_url.is_some()))
    }
}

/// DevTools session attached to one page.
pub struct CdpSession {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u32,
}

impl CdpSession {
    pub async fn connect(websocket_url: &str) -> Result<Self, AutomationError> {
        let (socket, _) = connect_async(websocket_url).await.map_err(|e| {
            AutomationError::PlatformError(format!("Failed to connect to {websocket_url}: {e}"))
        })?;
        Ok(Self { socket, next_id: 0 })
    }

    /// Send one command and wait for its response. Events received in the
    /// meantime are dropped.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value, AutomationError> {
        self.next_id += 1;
        let id = self.next_id;
        let payload = serde_json::to_string(&CdpRequest { id, method, params })
            .map_err(|e| AutomationError::PlatformError(format!("Invalid CDP request: {e}")))?;
        self.socket
            .send(Message::Text(payload))
            .await
            .map_err(|e| AutomationError::PlatformError(format!("CDP request failed: {e}")))?;

        while let Some(message) = self.socket.next().await {
            let message = message
                .map_err(|e| AutomationError::PlatformError(format!("CDP connection error: {e}")))?;
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(response) = serde_json::from_str::<CdpResponse>(&text) else {
                continue;
            };
            if response.id != Some(id) {
                continue;
            }
            if let Some(error) = response.error {
                return Err(AutomationError::PlatformError(format!(
                    "CDP error in {method}: {error}"
                )));
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
        Err(AutomationError::PlatformError(format!(
            "DevTools connection closed while waiting for {method}"
        )))
    }

    pub async fn evaluate(&mut self, script: &str) -> Result<Value, AutomationError> {
        let result = self
            .call(
                "Runtime.evaluate",
                json!({"expression": script, "returnByValue": true, "awaitPromise": true}),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            return Err(AutomationError::PlatformError(format!(
                "Script threw: {details}"
            )));
        }
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Where and how to start the browser.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub executable: Option<PathBuf>,
    pub debug_port: u16,
    pub headless: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            debug_port: DEFAULT_DEBUG_PORT,
            headless: true,
        }
    }
}

#[cfg(target_os = "macos")]
const BROWSER_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];
#[cfg(target_os = "windows")]
const BROWSER_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
    r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const BROWSER_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/microsoft-edge",
];

/// The explicit executable if given, otherwise the first installed
/// Chromium-based browser.
pub fn find_browser(explicit: Option<&Path>) -> Result<PathBuf, AutomationError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(AutomationError::InvalidArgument(format!(
            "Browser executable {} does not exist",
            path.display()
        )));
    }
    BROWSER_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .ok_or_else(|| {
            AutomationError::PlatformError(
                "No Chrome, Edge or Chromium installation found".to_string(),
            )
        })
}

/// Browser process and its throwaway profile. The process is killed on drop.
struct BrowserProcess {
    child: Child,
    profile: tempfile::TempDir,
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        info!("Closing browser");
        if let Err(e) = self.child.kill() {
            warn!("Failed to stop browser: {}", e);
        }
        let _ = self.child.wait();
        debug!("Removing browser profile {}", self.profile.path().display());
    }
}

/// A browser with a DevTools session on its first page. Dropping it closes
/// the browser.
pub struct ChromeBrowser {
    session: Mutex<CdpSession>,
    runtime: Runtime,
    _process: BrowserProcess,
}

impl ChromeBrowser {
    #[instrument(skip(options, poll))]
    pub fn launch(
        url: &str,
        options: &BrowserOptions,
        poll: PollConfig,
    ) -> Result<Self, AutomationError> {
        let executable = find_browser(options.executable.as_deref())?;
        let profile = tempfile::Builder::new()
            .prefix("powerchart-browser-")
            .tempdir()?;

        let mut command = Command::new(&executable);
        command
            .arg(format!("--remote-debugging-port={}", options.debug_port))
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if options.headless {
            command.arg("--headless=new");
        }
        let child = command
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AutomationError::PlatformError(format!(
                    "Failed to start {}: {e}",
                    executable.display()
                ))
            })?;
        let process = BrowserProcess { child, profile };
        info!("Browser launched: {}", executable.display());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = CdpClient::new(options.debug_port);

        let mut page = None;
        poll_until(poll, |_| {
            page = runtime.block_on(async {
                if !client.is_available().await {
                    return None;
                }
                client.first_page().await.unwrap_or_else(|e| {
                    debug!("Listing tabs failed: {}", e);
                    None
                })
            });
            page.is_some()
        });
        let Some(websocket_url) = page.and_then(|tab| tab.websocket_url) else {
            return Err(AutomationError::Timeout(format!(
                "Browser did not expose DevTools on port {}",
                options.debug_port
            )));
        };

        let session = runtime.block_on(CdpSession::connect(&websocket_url))?;
        debug!("DevTools session attached to {}", websocket_url);
        Ok(Self {
            session: Mutex::new(session),
            runtime,
            _process: process,
        })
    }

    fn session(&self) -> Result<MutexGuard<'_, CdpSession>, AutomationError> {
        self.session
            .lock()
            .map_err(|_| AutomationError::PlatformError("DevTools session poisoned".to_string()))
    }
}

impl PortalPage for ChromeBrowser {
    fn evaluate(&self, script: &str) -> Result<Value, AutomationError> {
        let mut session = self.session()?;
        self.runtime.block_on(session.evaluate(script))
    }

    fn allow_downloads(&self, dir: &Path) -> Result<(), AutomationError> {
        let params = json!({"behavior": "allow", "downloadPath": dir.to_string_lossy()});
        let mut session = self.session()?;
        self.runtime
            .block_on(session.call("Page.setDownloadBehavior", params))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_quote_their_arguments() {
        let script = fill_field_script(USERNAME_LABEL, "o'neil\"\n");
        assert!(script.contains(r#""User name:""#));
        assert!(script.contains(r#"field.value = "o'neil\"\n";"#));

        let script = click_link_script("Powerchart P275 TRUM_MO");
        assert!(script.contains(r#"const wanted = "Powerchart P275 TRUM_MO";"#));
    }

    #[test]
    fn tab_listing_parses_devtools_json() {
        let tabs: Vec<TabInfo> = serde_json::from_str(
            r#"[
                {"id": "A", "title": "", "url": "chrome://x", "type": "service_worker"},
                {"id": "B", "title": "Citrix", "url": "https://portal/", "type": "page",
                 "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/B"}
            ]"#,
        )
        .unwrap();
        assert_eq!(tabs[0].websocket_url, None);
        assert_eq!(tabs[1].kind, "page");
    }

    #[test]
    fn explicit_browser_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_browser(Some(&dir.path().join("chrome"))).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidArgument(_)));
        assert_eq!(find_browser(Some(dir.path())).unwrap(), dir.path());
    }
}
