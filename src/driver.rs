//! Driver provisioning: per-browser option assembly and session creation.
//!
//! This module builds the WebDriver capabilities for the configured browser,
//! resolves and spawns the matching driver binary in non-containerized runs,
//! and hands back an observer-wrapped [`SessionHandle`]:
//! - Chromium family (Chrome, Edge): download prefs, fixed locale, maximized
//!   start, suppressed driver logging
//! - Chrome only: geolocation default-allow, device-lab fixture
//!   pre-registration
//! - Headless and container flags per configuration
//!
//! The returned handle has not navigated anywhere and carries no implicit
//! wait; session-level policy belongs to the lifecycle manager.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, DesiredCapabilities, EdgeCapabilities, FirefoxCapabilities};

use crate::config::{Browser, RunConfig};
use crate::events::NavigationObserver;
use crate::session::SessionHandle;

// ============================================================================
// Option constants
// ============================================================================

/// Directory fixture files live under, relative to the harness root
pub const TEST_DATA_DIR: &str = "TestData";

/// Browser UI locale for every session
const LOCALE_ARG: &str = "--lang=en-au";

/// Virtual screen resolution used for headless Chrome
const HEADLESS_WINDOW_SIZE: &str = "window-size=2560,1440";

// Device-lab fixture files are pre-uploaded and referenced by content hash.
// The lab caps uploads at 10 files and deletes them after 30 days.
const DEVICE_LAB_MEDIA: [&str; 2] = [
    "media://66a0c22b37070c4d3abf4e624c3d7870d18f3b8d",
    "media://c26072943c2f2f03532f2a68b83e55e3f7803e35",
];

/// Fallback WebDriver port when the endpoint URL carries none
const DEFAULT_DRIVER_PORT: u16 = 4444;

/// How long to wait for a spawned driver binary to accept connections
const DRIVER_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while waiting for driver readiness
const DRIVER_READY_POLL: Duration = Duration::from_millis(100);

// ============================================================================
// Provisioning
// ============================================================================

/// Construct a ready-to-use session handle for the configured browser.
///
/// In non-containerized runs the matching driver binary is resolved from
/// `PATH` and spawned on the endpoint's port; the process is owned by the
/// returned handle and terminated when the handle closes.
pub async fn provision(
    config: &RunConfig,
    headless: bool,
    observers: Vec<Arc<dyn NavigationObserver>>,
) -> Result<SessionHandle, DriverError> {
    let process = if config.running_in_docker {
        // Containerized runs ship their own driver next to the endpoint.
        None
    } else {
        let port = endpoint_port(&config.webdriver_url);
        Some(DriverProcess::launch(config.browser, port).await?)
    };

    let driver = match config.browser {
        Browser::Chrome => {
            let caps = chrome_capabilities(config, headless)?;
            WebDriver::new(&config.webdriver_url, caps).await?
        }
        Browser::Firefox => {
            let caps = firefox_capabilities(config, headless)?;
            WebDriver::new(&config.webdriver_url, caps).await?
        }
        Browser::Edge => {
            let caps = edge_capabilities(config, headless)?;
            WebDriver::new(&config.webdriver_url, caps).await?
        }
    };

    Ok(SessionHandle::new(driver, observers, process))
}

fn chrome_capabilities(
    config: &RunConfig,
    headless: bool,
) -> Result<ChromeCapabilities, DriverError> {
    let mut caps = DesiredCapabilities::chrome();
    for arg in chromium_args(config.browser, headless, config.running_in_docker) {
        caps.add_arg(&arg)?;
    }
    let download_dir = resolve_download_dir(&config.root, &config.download_directory);
    caps.add_experimental_option("prefs", chromium_prefs(&download_dir, Browser::Chrome))?;
    caps.add_experimental_option("excludeSwitches", json!(["enable-logging"]))?;
    caps.insert_base_capability("bstack:options".to_string(), device_lab_options());
    Ok(caps)
}

fn firefox_capabilities(
    _config: &RunConfig,
    headless: bool,
) -> Result<FirefoxCapabilities, DriverError> {
    let mut caps = DesiredCapabilities::firefox();
    for arg in firefox_args(headless) {
        caps.add_arg(&arg)?;
    }
    Ok(caps)
}

fn edge_capabilities(
    config: &RunConfig,
    headless: bool,
) -> Result<EdgeCapabilities, DriverError> {
    let mut caps = DesiredCapabilities::edge();
    for arg in chromium_args(config.browser, headless, config.running_in_docker) {
        caps.add_arg(&arg)?;
    }
    let download_dir = resolve_download_dir(&config.root, &config.download_directory);
    caps.add_experimental_option("prefs", chromium_prefs(&download_dir, Browser::Edge))?;
    caps.add_experimental_option("excludeSwitches", json!(["enable-logging"]))?;
    Ok(caps)
}

// ============================================================================
// Option builders
// ============================================================================

/// Launch arguments for the chromium family (Chrome, Edge).
fn chromium_args(browser: Browser, headless: bool, in_docker: bool) -> Vec<String> {
    let mut args = vec!["start-maximized".to_string(), LOCALE_ARG.to_string()];
    if headless {
        args.push("--headless".to_string());
        if browser == Browser::Chrome {
            args.push(HEADLESS_WINDOW_SIZE.to_string());
        }
    }
    if in_docker {
        args.push("--no-sandbox".to_string());
        args.push("--disable-dev-shm-usage".to_string());
    }
    args
}

/// Launch arguments for Firefox. Window sizing happens post-launch instead;
/// geckodriver does not apply size options reliably at startup.
fn firefox_args(headless: bool) -> Vec<String> {
    if headless {
        vec!["-headless".to_string()]
    } else {
        Vec::new()
    }
}

/// Profile preferences for the chromium family.
fn chromium_prefs(download_dir: &Path, browser: Browser) -> serde_json::Value {
    let mut prefs = serde_json::Map::new();
    prefs.insert(
        "download.default_directory".to_string(),
        json!(download_dir.to_string_lossy()),
    );
    prefs.insert("safebrowsing.enabled".to_string(), json!("false"));
    if browser == Browser::Chrome {
        prefs.insert(
            "profile.default_content_setting_values.geolocation".to_string(),
            json!(1),
        );
    }
    serde_json::Value::Object(prefs)
}

/// Device-lab capability carrying the pre-registered fixture identifiers.
fn device_lab_options() -> serde_json::Value {
    json!({ "uploadMedia": DEVICE_LAB_MEDIA })
}

/// Resolve the absolute download directory under the harness root,
/// normalizing path separators for the target platform.
pub fn resolve_download_dir(root: &Path, fragment: &str) -> PathBuf {
    let mut dir = root.join(TEST_DATA_DIR);
    for part in fragment.split(['/', '\\']).filter(|p| !p.is_empty()) {
        dir.push(part);
    }
    dir
}

/// Port component of the WebDriver endpoint URL.
fn endpoint_port(url: &str) -> u16 {
    url.rsplit(':')
        .next()
        .map(|tail| tail.trim_end_matches('/'))
        .and_then(|tail| tail.parse().ok())
        .unwrap_or(DEFAULT_DRIVER_PORT)
}

// ============================================================================
// Driver binary management
// ============================================================================

/// Driver binary matching a browser
fn driver_binary_name(browser: Browser) -> &'static str {
    match browser {
        Browser::Chrome => "chromedriver",
        Browser::Firefox => "geckodriver",
        Browser::Edge => "msedgedriver",
    }
}

/// Locate an executable on `PATH`.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let file_name = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    })
}

/// A spawned driver binary serving the WebDriver endpoint for one session.
#[derive(Debug)]
pub struct DriverProcess {
    child: tokio::process::Child,
    port: u16,
}

impl DriverProcess {
    /// Resolve the browser's driver binary from `PATH`, spawn it on `port`
    /// and wait until it accepts connections.
    pub async fn launch(browser: Browser, port: u16) -> Result<Self, DriverError> {
        let name = driver_binary_name(browser);
        let binary = find_in_path(name).ok_or_else(|| {
            DriverError::Binary(format!("{} not found on PATH", name))
        })?;

        let child = tokio::process::Command::new(&binary)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                DriverError::Binary(format!("failed to spawn {}: {}", binary.display(), err))
            })?;

        let process = Self { child, port };
        process.wait_ready().await?;
        Ok(process)
    }

    /// Port the driver listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    async fn wait_ready(&self) -> Result<(), DriverError> {
        let deadline = tokio::time::Instant::now() + DRIVER_READY_TIMEOUT;
        loop {
            match tokio::net::TcpStream::connect(("127.0.0.1", self.port)).await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(DriverError::Binary(format!(
                            "driver on port {} not ready: {}",
                            self.port, err
                        )));
                    }
                    tokio::time::sleep(DRIVER_READY_POLL).await;
                }
            }
        }
    }

    /// Terminate the driver process. Safe to call after the process exited.
    pub async fn stop(&mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for driver provisioning
#[derive(Debug)]
pub enum DriverError {
    /// WebDriver protocol or connection error
    WebDriver(WebDriverError),

    /// Driver binary could not be resolved or spawned
    Binary(String),

    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::WebDriver(err) => write!(f, "WebDriver error: {}", err),
            DriverError::Binary(msg) => write!(f, "Driver binary error: {}", msg),
            DriverError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::WebDriver(err) => Some(err),
            DriverError::Binary(_) => None,
            DriverError::Io(err) => Some(err),
        }
    }
}

impl From<WebDriverError> for DriverError {
    fn from(err: WebDriverError) -> Self {
        DriverError::WebDriver(err)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromium_args_headless_chrome() {
        let args = chromium_args(Browser::Chrome, true, false);
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&HEADLESS_WINDOW_SIZE.to_string()));
        assert!(args.contains(&"start-maximized".to_string()));
        assert!(args.contains(&LOCALE_ARG.to_string()));
    }

    #[test]
    fn test_chromium_args_headless_edge_has_no_fixed_resolution() {
        let args = chromium_args(Browser::Edge, true, false);
        assert!(args.contains(&"--headless".to_string()));
        assert!(!args.contains(&HEADLESS_WINDOW_SIZE.to_string()));
    }

    #[test]
    fn test_chromium_args_docker_flags() {
        let args = chromium_args(Browser::Chrome, false, true);
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-dev-shm-usage".to_string()));
        assert!(!args.contains(&"--headless".to_string()));
    }

    #[test]
    fn test_firefox_args() {
        assert_eq!(firefox_args(true), vec!["-headless".to_string()]);
        assert!(firefox_args(false).is_empty());
    }

    #[test]
    fn test_chromium_prefs_chrome_allows_geolocation() {
        let prefs = chromium_prefs(Path::new("/tmp/dl"), Browser::Chrome);
        assert_eq!(prefs["safebrowsing.enabled"], "false");
        assert_eq!(prefs["profile.default_content_setting_values.geolocation"], 1);
        assert!(
            prefs["download.default_directory"]
                .as_str()
                .unwrap()
                .ends_with("dl")
        );
    }

    #[test]
    fn test_chromium_prefs_edge_has_no_geolocation_override() {
        let prefs = chromium_prefs(Path::new("/tmp/dl"), Browser::Edge);
        assert!(prefs.get("profile.default_content_setting_values.geolocation").is_none());
    }

    #[test]
    fn test_device_lab_options_shape() {
        let options = device_lab_options();
        let media = options["uploadMedia"].as_array().unwrap();
        assert_eq!(media.len(), DEVICE_LAB_MEDIA.len());
        assert!(media.iter().all(|id| id.as_str().unwrap().starts_with("media://")));
    }

    #[test]
    fn test_resolve_download_dir_normalizes_separators() {
        let root = Path::new("/work/harness");
        let resolved = resolve_download_dir(root, "payslips\\import");
        assert_eq!(resolved, root.join(TEST_DATA_DIR).join("payslips").join("import"));

        let resolved = resolve_download_dir(root, "payslips/import");
        assert_eq!(resolved, root.join(TEST_DATA_DIR).join("payslips").join("import"));
    }

    #[test]
    fn test_endpoint_port() {
        assert_eq!(endpoint_port("http://localhost:4444"), 4444);
        assert_eq!(endpoint_port("http://127.0.0.1:9515/"), 9515);
        assert_eq!(endpoint_port("http://localhost"), DEFAULT_DRIVER_PORT);
    }

    #[test]
    fn test_driver_binary_names() {
        assert_eq!(driver_binary_name(Browser::Chrome), "chromedriver");
        assert_eq!(driver_binary_name(Browser::Firefox), "geckodriver");
        assert_eq!(driver_binary_name(Browser::Edge), "msedgedriver");
    }
}
