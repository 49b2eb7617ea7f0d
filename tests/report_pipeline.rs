//! Integration tests for report assembly and failure capture plumbing.

use std::fs;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;

use web_harness::report::columns::{result_columns, splice};
use web_harness::report::{
    REPORT_TITLE, ReportEntry, TestPhase, TestStatus, screenshot_fragment, write_html, write_xml,
};
use web_harness::runner::FailureCapture;

fn sample_entries() -> Vec<ReportEntry> {
    let mut failing = ReportEntry::new(
        "scenarios::Smoke::checks_title",
        TestPhase::Call,
        TestStatus::Failed,
        Duration::from_secs(4),
    )
    .with_message("title \"Example Domain\" does not contain \"Dashboard\"");
    failing.extras.push(screenshot_fragment("checks_title.png"));

    vec![
        ReportEntry::new(
            "scenarios::Smoke::loads_home_page",
            TestPhase::Call,
            TestStatus::Passed,
            Duration::from_secs(2),
        ),
        failing,
    ]
}

#[test]
fn test_header_splice_property() {
    // N columns in, N + 3 - 1 out, inserts at positions 1-3, last removed.
    let header: Vec<String> = ["Result", "Test", "Duration", "Links"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let n = header.len();
    let spliced = splice(
        header,
        [
            "Test Case".to_string(),
            "Date Run At".to_string(),
            "Time Run At".to_string(),
        ],
    );
    assert_eq!(spliced.len(), n + 3 - 1);
    assert_eq!(spliced[1], "Test Case");
    assert_eq!(spliced[2], "Date Run At");
    assert_eq!(spliced[3], "Time Run At");
    assert!(!spliced.contains(&"Links".to_string()));
}

#[test]
fn test_html_report_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.html");
    let entries = sample_entries();

    write_html(&path, REPORT_TITLE, Utc::now(), &[("Node".into(), "ci-01".into())], &entries)
        .unwrap();

    let page = fs::read_to_string(&path).unwrap();
    assert!(page.contains(REPORT_TITLE));
    assert!(page.contains("ci-01"));
    for column in result_columns() {
        assert!(page.contains(column.header()), "missing column {:?}", column);
    }
    // the failing row carries its test case cell and thumbnail
    assert!(page.contains("<td>checks_title</td>"));
    assert!(page.contains("src=\"checks_title.png\""));
    assert!(page.contains("does not contain"));
}

#[test]
fn test_xml_report_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xml");

    write_xml(&path, "web-harness", &sample_entries(), Duration::from_secs(6)).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("tests=\"2\""));
    assert!(text.contains("failures=\"1\""));
    assert!(text.contains("<failure"));
    assert!(text.contains("name=\"checks_title\""));
}

#[tokio::test]
async fn test_capture_without_session_logs_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    let capture = FailureCapture::new(dir.path());
    let mut entry = ReportEntry::new(
        "scenarios::Smoke::checks_title",
        TestPhase::Setup,
        TestStatus::Error,
        Duration::from_secs(1),
    );

    // Must not fail and must not fabricate a screenshot.
    capture.attach(None, &mut entry, "checks_title").await;

    assert!(entry.extras.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
