//! Per-test session lifecycle management.
//!
//! Provides the observer-wrapped [`SessionHandle`] and the [`TestSession`]
//! wrapper that owns one handle per test:
//! - Acquisition through the driver provisioner
//! - Implicit wait and window policy applied after acquisition
//! - Unconditional, idempotent close on every exit path

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;

use crate::config::{Browser, RunConfig};
use crate::driver::{self, DriverError, DriverProcess};
use crate::events::NavigationObserver;

// ============================================================================
// SessionHandle
// ============================================================================

/// One live browser-automation connection.
///
/// Navigation goes through [`SessionHandle::goto`], which notifies the
/// attached observers before delegating to the driver. The handle owns the
/// spawned driver process, if any, and terminates it on close.
pub struct SessionHandle {
    driver: Option<WebDriver>,
    observers: Vec<Arc<dyn NavigationObserver>>,
    process: Option<DriverProcess>,
}

impl SessionHandle {
    pub(crate) fn new(
        driver: WebDriver,
        observers: Vec<Arc<dyn NavigationObserver>>,
        process: Option<DriverProcess>,
    ) -> Self {
        Self {
            driver: Some(driver),
            observers,
            process,
        }
    }

    fn driver(&self) -> Result<&WebDriver, SessionError> {
        self.driver.as_ref().ok_or(SessionError::Closed)
    }

    /// Whether the handle still holds a live driver connection
    pub fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    /// Navigate to `url`, notifying observers first.
    pub async fn goto(&self, url: &str) -> Result<(), SessionError> {
        for observer in &self.observers {
            observer.before_navigate(url);
        }
        self.driver()?.goto(url).await?;
        Ok(())
    }

    /// Title of the current page
    pub async fn title(&self) -> Result<String, SessionError> {
        Ok(self.driver()?.title().await?)
    }

    /// URL of the current page
    pub async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.driver()?.current_url().await?.to_string())
    }

    /// Find a single element
    pub async fn find(&self, by: By) -> Result<WebElement, SessionError> {
        Ok(self.driver()?.find(by).await?)
    }

    /// Session-wide element polling duration
    pub async fn set_implicit_wait(&self, wait: Duration) -> Result<(), SessionError> {
        self.driver()?.set_implicit_wait_timeout(wait).await?;
        Ok(())
    }

    /// Maximize the browser window
    pub async fn maximize_window(&self) -> Result<(), SessionError> {
        self.driver()?.maximize_window().await?;
        Ok(())
    }

    /// Capture a PNG screenshot of the current page into `path`.
    pub async fn save_screenshot(&self, path: &Path) -> Result<(), SessionError> {
        let encoded = self.driver()?.screenshot_as_png_base64().await?;
        let bytes = BASE64.decode(encoded.trim_end())?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Quit the driver and terminate the spawned driver process.
    ///
    /// Idempotent: the second and later calls are no-ops.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(driver) = self.driver.take() {
            let quit = driver.quit().await;
            if let Some(mut process) = self.process.take() {
                process.stop().await;
            }
            quit?;
        }
        Ok(())
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("open", &self.is_open())
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ============================================================================
// TestSession
// ============================================================================

/// Lifecycle position of a test's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Acquired,
    Configured,
    InUse,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Acquired => "acquired",
            SessionState::Configured => "configured",
            SessionState::InUse => "in use",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Owns the session handle for exactly one test.
///
/// Created in per-test setup and closed in per-test teardown regardless of
/// the test outcome. There is no retry: acquisition failure is fatal to the
/// test and surfaces as an error outcome, not an assertion failure.
pub struct TestSession {
    handle: SessionHandle,
    state: SessionState,
}

impl TestSession {
    /// Provision a session for `config` and apply session policy: the
    /// configured implicit wait and, for Firefox, post-launch window
    /// maximization.
    pub async fn acquire(
        config: &RunConfig,
        observers: Vec<Arc<dyn NavigationObserver>>,
    ) -> Result<Self, SessionError> {
        let handle = driver::provision(config, config.headless_mode, observers).await?;
        let mut session = Self {
            handle,
            state: SessionState::Acquired,
        };
        if let Err(err) = session.configure(config).await {
            let _ = session.handle.close().await;
            session.state = SessionState::Closed;
            return Err(err);
        }
        Ok(session)
    }

    async fn configure(&mut self, config: &RunConfig) -> Result<(), SessionError> {
        self.handle
            .set_implicit_wait(Duration::from_secs(config.timeout))
            .await?;
        if config.browser == Browser::Firefox {
            self.handle.maximize_window().await?;
        }
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Hand the session to the test body.
    pub fn handle(&mut self) -> &SessionHandle {
        self.state = SessionState::InUse;
        &self.handle
    }

    /// Read-only view for the failure-capture hook.
    pub fn peek(&self) -> &SessionHandle {
        &self.handle
    }

    /// Current lifecycle position
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Close the session. Idempotent; always leaves the state `Closed`.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let result = self.handle.close().await;
        self.state = SessionState::Closed;
        result
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        // The driver process itself is reaped via kill_on_drop; the browser
        // session leaks until the driver notices, so closing explicitly is
        // still required.
        if self.handle.is_open() {
            tracing::warn!("test session dropped while still open");
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for session operations
#[derive(Debug)]
pub enum SessionError {
    /// Session provisioning failed
    Provision(DriverError),

    /// The handle was used after close
    Closed,

    /// WebDriver protocol error
    WebDriver(WebDriverError),

    /// Screenshot payload was not valid base64
    Decode(base64::DecodeError),

    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Provision(err) => write!(f, "Provisioning error: {}", err),
            SessionError::Closed => write!(f, "Session is closed"),
            SessionError::WebDriver(err) => write!(f, "WebDriver error: {}", err),
            SessionError::Decode(err) => write!(f, "Screenshot decode error: {}", err),
            SessionError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Provision(err) => Some(err),
            SessionError::Closed => None,
            SessionError::WebDriver(err) => Some(err),
            SessionError::Decode(err) => Some(err),
            SessionError::Io(err) => Some(err),
        }
    }
}

impl From<DriverError> for SessionError {
    fn from(err: DriverError) -> Self {
        SessionError::Provision(err)
    }
}

impl From<WebDriverError> for SessionError {
    fn from(err: WebDriverError) -> Self {
        SessionError::WebDriver(err)
    }
}

impl From<base64::DecodeError> for SessionError {
    fn from(err: base64::DecodeError) -> Self {
        SessionError::Decode(err)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::InUse.to_string(), "in use");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SessionError::Closed.to_string(), "Session is closed");
        let err = SessionError::from(DriverError::Binary("chromedriver not found".into()));
        assert!(err.to_string().contains("chromedriver"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let err = SessionError::from(std::io::Error::other("disk full"));
        assert!(err.source().is_some());
        assert!(SessionError::Closed.source().is_none());
    }
}
