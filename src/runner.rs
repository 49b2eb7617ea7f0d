//! Suite runner: per-test session lifecycle and failure-capture hooks.
//!
//! Drives each scenario through setup, call and teardown:
//! - setup acquires a fresh session; failure is reported as an error, not a
//!   test failure, and no retry is attempted
//! - call runs the scenario body against the session handle
//! - teardown closes the session on every exit path
//!
//! After each setup/call outcome the failure-capture hook may attach a
//! screenshot to the report entry. Hooks only annotate; they never change a
//! test's outcome. The run ends by writing the HTML and XML reports.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{ConfigError, RunConfig};
use crate::events::{LoggingListener, NavigationObserver};
use crate::report::{self, ReportEntry, TestPhase, TestStatus};
use crate::session::{SessionError, SessionHandle, TestSession};

/// Directory the report artifacts are written to
pub const REPORTS_DIR: &str = "Reports";

const REPORT_BASENAME: &str = "Web_Automation_Report_";

/// One browser test.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short test name; also names the failure screenshot
    fn name(&self) -> &str;

    /// Suite the scenario belongs to
    fn suite(&self) -> &str {
        "Web"
    }

    /// Hierarchical node identifier used in reports
    fn node_id(&self) -> String {
        format!("scenarios::{}::{}", self.suite(), self.name())
    }

    /// Whether this scenario is expected to fail
    fn expect_failure(&self) -> bool {
        false
    }

    /// Test body. The session has already navigated nowhere; drive it.
    async fn run(&self, session: &SessionHandle) -> Result<(), HarnessError>;
}

/// Classify a call-phase result, honoring the expected-failure marker.
pub fn classify(passed: bool, expect_failure: bool) -> TestStatus {
    match (passed, expect_failure) {
        (true, false) => TestStatus::Passed,
        (false, false) => TestStatus::Failed,
        (false, true) => TestStatus::XFailed,
        (true, true) => TestStatus::XPassed,
    }
}

// ============================================================================
// Failure capture
// ============================================================================

/// Screenshot-on-failure hook.
///
/// Holds the directory the HTML report lands in; captured screenshots are
/// written beside it. The session context is passed in per call, so the hook
/// carries no run-wide mutable state.
pub struct FailureCapture {
    report_dir: PathBuf,
}

impl FailureCapture {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Capture a screenshot for a setup/call outcome that warrants one and
    /// attach the thumbnail fragment to the entry.
    ///
    /// Never fails: with no live session, or when the capture itself fails,
    /// an error is logged and the entry is left without a screenshot.
    pub async fn attach(
        &self,
        session: Option<&SessionHandle>,
        entry: &mut ReportEntry,
        test_name: &str,
    ) {
        if entry.phase == TestPhase::Teardown || !entry.status.captures_screenshot() {
            return;
        }
        let Some(session) = session else {
            tracing::error!("Driver is not initialized");
            return;
        };
        let file_name = format!("{}.png", test_name);
        let destination = self.report_dir.join(&file_name);
        match session.save_screenshot(&destination).await {
            Ok(()) => entry.extras.push(report::screenshot_fragment(&file_name)),
            Err(err) => tracing::error!("Screenshot capture failed: {}", err),
        }
    }
}

// ============================================================================
// Suite runner
// ============================================================================

/// Result of a complete suite run
#[derive(Debug)]
pub struct RunSummary {
    /// When the run started (UTC)
    pub started: DateTime<Utc>,

    /// One entry per scenario
    pub entries: Vec<ReportEntry>,

    /// Where the HTML report was written
    pub html_path: PathBuf,

    /// Where the XML report was written
    pub xml_path: PathBuf,
}

impl RunSummary {
    /// Number of passing tests
    pub fn passed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == TestStatus::Passed)
            .count()
    }

    /// Number of outcomes that fail the run
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.status.fails_run()).count()
    }

    /// Whether the whole run passed
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs a scenario suite against one configuration.
pub struct SuiteRunner {
    config: RunConfig,
    reports_dir: PathBuf,
    observers: Vec<Arc<dyn NavigationObserver>>,
}

impl SuiteRunner {
    /// Create a runner with the default reports directory and the logging
    /// navigation listener attached.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            reports_dir: PathBuf::from(REPORTS_DIR),
            observers: vec![Arc::new(LoggingListener)],
        }
    }

    /// Write report artifacts under `dir` instead of the default.
    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    /// Attach an additional navigation observer to every session.
    pub fn with_observer(mut self, observer: Arc<dyn NavigationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run every scenario sequentially and write the reports.
    pub async fn run(&self, scenarios: &[Box<dyn Scenario>]) -> Result<RunSummary, HarnessError> {
        let started = Utc::now();
        fs::create_dir_all(&self.reports_dir)?;
        let html_path = self.reports_dir.join(report_file_name(&started, "html"));
        let xml_path = self.reports_dir.join(report_file_name(&started, "xml"));

        let capture = FailureCapture::new(&self.reports_dir);
        let run_start = Instant::now();

        let mut entries = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            entries.push(self.run_one(scenario.as_ref(), &capture).await);
        }

        report::write_html(
            &html_path,
            report::REPORT_TITLE,
            started,
            &environment(),
            &entries,
        )?;
        report::write_xml(&xml_path, "web-harness", &entries, run_start.elapsed())?;

        Ok(RunSummary {
            started,
            entries,
            html_path,
            xml_path,
        })
    }

    async fn run_one(&self, scenario: &dyn Scenario, capture: &FailureCapture) -> ReportEntry {
        let node_id = scenario.node_id();
        let start = Instant::now();

        // Setup: acquire a session, or report the test as an error.
        let mut session = match TestSession::acquire(&self.config, self.observers.clone()).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!("Session setup failed for {}: {}", node_id, err);
                let mut entry = ReportEntry::new(
                    &node_id,
                    TestPhase::Setup,
                    TestStatus::Error,
                    start.elapsed(),
                )
                .with_message(err.to_string());
                capture.attach(None, &mut entry, scenario.name()).await;
                return entry;
            }
        };

        // Call: the scenario drives navigation and assertions.
        let result = scenario.run(session.handle()).await;
        let status = classify(result.is_ok(), scenario.expect_failure());
        let mut entry = ReportEntry::new(&node_id, TestPhase::Call, status, start.elapsed());
        if let Err(err) = result {
            entry = entry.with_message(err.to_string());
        }
        capture
            .attach(Some(session.peek()), &mut entry, scenario.name())
            .await;

        // Teardown: unconditional; a close failure never masks the outcome.
        if let Err(err) = session.close().await {
            tracing::error!("Session teardown failed for {}: {}", node_id, err);
        }
        entry
    }
}

/// Report file name embedding the UTC run stamp.
fn report_file_name(started: &DateTime<Utc>, extension: &str) -> String {
    format!(
        "{}{}.{}",
        REPORT_BASENAME,
        started.format("%d-%m-%Y (%H-%M-%S)"),
        extension
    )
}

/// Environment rows for the HTML report header.
fn environment() -> Vec<(String, String)> {
    let node = hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    vec![
        (
            "Harness".to_string(),
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ),
        ("Node".to_string(), node),
    ]
}

// ============================================================================
// Errors
// ============================================================================

/// Top-level error type for harness operations
#[derive(Debug)]
pub enum HarnessError {
    /// Configuration loading failed
    Config(ConfigError),

    /// Session acquisition or use failed
    Session(SessionError),

    /// A scenario assertion did not hold
    Assertion(String),

    /// XML report writing failed
    Xml(quick_xml::Error),

    /// I/O error
    Io(std::io::Error),
}

impl HarnessError {
    /// Assertion failure with a descriptive message.
    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Config(err) => write!(f, "Configuration error: {}", err),
            HarnessError::Session(err) => write!(f, "Session error: {}", err),
            HarnessError::Assertion(msg) => write!(f, "Assertion failed: {}", msg),
            HarnessError::Xml(err) => write!(f, "XML report error: {}", err),
            HarnessError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Config(err) => Some(err),
            HarnessError::Session(err) => Some(err),
            HarnessError::Assertion(_) => None,
            HarnessError::Xml(err) => Some(err),
            HarnessError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        HarnessError::Config(err)
    }
}

impl From<SessionError> for HarnessError {
    fn from(err: SessionError) -> Self {
        HarnessError::Session(err)
    }
}

impl From<quick_xml::Error> for HarnessError {
    fn from(err: quick_xml::Error) -> Self {
        HarnessError::Xml(err)
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::Io(err)
    }
}
