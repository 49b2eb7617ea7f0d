//! Run configuration loaded from a JSON file.
//!
//! This module provides the validated configuration record for a test run:
//! - A default config file name, overridable via the `-c` CLI option
//! - Required keys checked at load time, unknown keys rejected
//! - Sensible defaults for the optional keys
//!
//! # Recognized keys
//!
//! | Key | Required | Default |
//! |-----|----------|---------|
//! | `browser` | yes | none (`chrome`, `firefox` or `edge`) |
//! | `headless_mode` | yes | none |
//! | `running_in_docker` | yes | none |
//! | `download_directory` | yes | none (fragment under `TestData/`) |
//! | `timeout` | yes | none (implicit wait, seconds) |
//! | `wait_time` | no | `10` |
//! | `tested_page` | no | `https://example.com/` |
//! | `webdriver_url` | no | `http://localhost:4444` |

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ============================================================================
// Default Values
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "config.json";

/// Default explicit wait duration (seconds)
pub const DEFAULT_WAIT_TIME: u64 = 10;

/// Default page under test
pub const DEFAULT_TESTED_PAGE: &str = "https://example.com/";

/// Default WebDriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Browser names accepted in the `browser` key
pub const SUPPORTED_BROWSERS: [&str; 3] = ["chrome", "firefox", "edge"];

// ============================================================================
// Browser
// ============================================================================

/// Target browser for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
}

impl Browser {
    /// Parse a configured browser name
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "chrome" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "edge" => Ok(Browser::Edge),
            other => Err(ConfigError::UnsupportedBrowser(other.to_string())),
        }
    }

    /// Configured name for this browser
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RunConfig
// ============================================================================

/// Raw file shape; validated into [`RunConfig`] after parsing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    browser: String,
    headless_mode: bool,
    running_in_docker: bool,
    download_directory: String,
    timeout: u64,
    #[serde(default = "default_wait_time")]
    wait_time: u64,
    #[serde(default = "default_tested_page")]
    tested_page: String,
    #[serde(default = "default_webdriver_url")]
    webdriver_url: String,
}

fn default_wait_time() -> u64 {
    DEFAULT_WAIT_TIME
}

fn default_tested_page() -> String {
    DEFAULT_TESTED_PAGE.to_string()
}

fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.to_string()
}

/// Validated configuration for a test run.
///
/// Loaded once at run start and read-only thereafter.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target browser
    pub browser: Browser,

    /// Run the browser without a visible display surface
    pub headless_mode: bool,

    /// Whether the run executes inside a container
    pub running_in_docker: bool,

    /// Download directory fragment, resolved under `<root>/TestData/`
    pub download_directory: String,

    /// Implicit wait applied to the session (seconds)
    pub timeout: u64,

    /// Explicit wait duration available to test code (seconds)
    pub wait_time: u64,

    /// URL of the page under test
    pub tested_page: String,

    /// WebDriver endpoint the session connects to
    pub webdriver_url: String,

    /// Directory the config file was loaded from; anchors relative paths
    pub root: PathBuf,
}

impl RunConfig {
    /// Load the configuration from `dir`, using the default file name or the
    /// base name of `override_name` when supplied.
    pub fn load(dir: &Path, override_name: Option<&str>) -> Result<Self, ConfigError> {
        let file_name = match override_name {
            // Only the base name matters, mirroring the CLI contract.
            Some(name) => Path::new(name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_CONFIG_FILENAME.to_string()),
            None => DEFAULT_CONFIG_FILENAME.to_string(),
        };
        Self::from_file(&dir.join(file_name))
    }

    /// Load and validate the configuration from an explicit path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&text)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::validate(raw, root)
    }

    fn validate(raw: RawConfig, root: PathBuf) -> Result<Self, ConfigError> {
        let browser = Browser::parse(&raw.browser)?;
        Ok(Self {
            browser,
            headless_mode: raw.headless_mode,
            running_in_docker: raw.running_in_docker,
            download_directory: raw.download_directory,
            timeout: raw.timeout,
            wait_time: raw.wait_time,
            tested_page: raw.tested_page,
            webdriver_url: raw.webdriver_url,
            root,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file does not exist
    NotFound(PathBuf),

    /// I/O error reading the file
    Io(std::io::Error),

    /// Malformed JSON, or an unknown/missing key
    Parse(serde_json::Error),

    /// The `browser` key names a browser outside the supported set
    UnsupportedBrowser(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            ConfigError::Io(err) => write!(f, "Config I/O error: {}", err),
            ConfigError::Parse(err) => write!(f, "Config parse error: {}", err),
            ConfigError::UnsupportedBrowser(name) => {
                write!(f, "\"{}\" is not a supported browser", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
