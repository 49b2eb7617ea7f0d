//! Outcome and report-entry types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Test phase a result was produced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    Setup,
    Call,
    Teardown,
}

impl std::fmt::Display for TestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestPhase::Setup => "setup",
            TestPhase::Call => "call",
            TestPhase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// Outcome status of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    /// Expected failure that failed
    XFailed,
    /// Expected failure that unexpectedly passed
    XPassed,
    /// Harness failure outside the test body (e.g. provisioning)
    Error,
}

impl TestStatus {
    /// Human-readable label used in report cells
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Skipped => "Skipped",
            TestStatus::XFailed => "XFailed",
            TestStatus::XPassed => "XPassed",
            TestStatus::Error => "Error",
        }
    }

    /// Whether this outcome triggers failure capture in setup/call phases.
    /// Errors qualify too; with no live session the hook logs and skips.
    pub fn captures_screenshot(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::XPassed | TestStatus::Error)
    }

    /// Whether the run as a whole should report failure for this outcome
    pub fn fails_run(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::XPassed | TestStatus::Error)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One test's rendering into the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Hierarchical node identifier (`file::suite::test`)
    pub node_id: String,

    /// Test case cell value, extracted from the node identifier
    pub test_case: String,

    /// Phase the decisive outcome was produced in
    pub phase: TestPhase,

    /// Outcome status
    pub status: TestStatus,

    /// Wall-clock duration of the test
    pub duration: Duration,

    /// Failure or error message, if any
    pub message: Option<String>,

    /// Extra HTML fragments attached by hooks (screenshot thumbnails)
    pub extras: Vec<String>,

    /// When the outcome was recorded
    pub recorded_at: DateTime<Utc>,
}

impl ReportEntry {
    /// Create an entry for a finished test.
    pub fn new(node_id: &str, phase: TestPhase, status: TestStatus, duration: Duration) -> Self {
        Self {
            node_id: node_id.to_string(),
            test_case: test_case_id(node_id),
            phase,
            status,
            duration,
            message: None,
            extras: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Attach a failure/error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Test case cell value: the third segment of the hierarchical node id, or
/// the last segment when the id is flatter than `file::suite::test`.
pub fn test_case_id(node_id: &str) -> String {
    let segments: Vec<&str> = node_id.split("::").collect();
    if segments.len() > 2 {
        segments[2].to_string()
    } else {
        segments.last().copied().unwrap_or(node_id).to_string()
    }
}

/// Render a duration as `HH:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
