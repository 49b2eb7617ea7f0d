//! JUnit-style XML report writer.

use std::fs;
use std::path::Path;
use std::time::Duration;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::report::types::{ReportEntry, TestStatus};

/// Aggregate counters for the suite attributes
#[derive(Debug, Default)]
struct Counts {
    tests: usize,
    failures: usize,
    errors: usize,
    skipped: usize,
}

fn count(entries: &[ReportEntry]) -> Counts {
    let mut counts = Counts {
        tests: entries.len(),
        ..Counts::default()
    };
    for entry in entries {
        match entry.status {
            TestStatus::Failed | TestStatus::XPassed => counts.failures += 1,
            TestStatus::Error => counts.errors += 1,
            TestStatus::Skipped | TestStatus::XFailed => counts.skipped += 1,
            TestStatus::Passed => {}
        }
    }
    counts
}

/// Write the run as a single JUnit test suite.
pub fn write_xml(
    path: &Path,
    suite_name: &str,
    entries: &[ReportEntry],
    duration: Duration,
) -> Result<(), quick_xml::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let mut writer = Writer::new_with_indent(file, b' ', 4);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let counts = count(entries);
    let time = format!("{:.3}", duration.as_secs_f32());

    let mut suites_tag = BytesStart::new("testsuites");
    suites_tag.extend_attributes([
        ("name", suite_name),
        ("tests", counts.tests.to_string().as_str()),
        ("failures", counts.failures.to_string().as_str()),
        ("errors", counts.errors.to_string().as_str()),
        ("skipped", counts.skipped.to_string().as_str()),
        ("time", time.as_str()),
    ]);
    writer.write_event(Event::Start(suites_tag))?;

    let mut suite_tag = BytesStart::new("testsuite");
    suite_tag.extend_attributes([
        ("name", suite_name),
        ("tests", counts.tests.to_string().as_str()),
        ("failures", counts.failures.to_string().as_str()),
        ("errors", counts.errors.to_string().as_str()),
        ("skipped", counts.skipped.to_string().as_str()),
        ("time", time.as_str()),
    ]);
    writer.write_event(Event::Start(suite_tag))?;

    for entry in entries {
        serialize_case(entry, &mut writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;
    writer.write_event(Event::Eof)?;
    Ok(())
}

fn serialize_case(
    entry: &ReportEntry,
    writer: &mut Writer<impl std::io::Write>,
) -> Result<(), quick_xml::Error> {
    let classname = match entry.node_id.rsplit_once("::") {
        Some((prefix, _)) => prefix.to_string(),
        None => entry.node_id.clone(),
    };
    let time = format!("{:.3}", entry.duration.as_secs_f32());

    let mut case_tag = BytesStart::new("testcase");
    case_tag.extend_attributes([
        ("name", entry.test_case.as_str()),
        ("classname", classname.as_str()),
        ("time", time.as_str()),
    ]);

    let message = entry.message.as_deref().unwrap_or("");
    match entry.status {
        TestStatus::Passed => {
            writer.write_event(Event::Empty(case_tag))?;
        }
        TestStatus::Failed => {
            writer.write_event(Event::Start(case_tag))?;
            serialize_child(writer, "failure", message)?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        TestStatus::XPassed => {
            writer.write_event(Event::Start(case_tag))?;
            serialize_child(writer, "failure", "unexpectedly passed")?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        TestStatus::Error => {
            writer.write_event(Event::Start(case_tag))?;
            serialize_child(writer, "error", message)?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        TestStatus::Skipped => {
            writer.write_event(Event::Start(case_tag))?;
            serialize_child(writer, "skipped", message)?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        TestStatus::XFailed => {
            writer.write_event(Event::Start(case_tag))?;
            serialize_child(writer, "skipped", "expected failure")?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
    }
    Ok(())
}

fn serialize_child(
    writer: &mut Writer<impl std::io::Write>,
    tag: &str,
    message: &str,
) -> Result<(), quick_xml::Error> {
    let mut child = BytesStart::new(tag);
    child.extend_attributes([("message", message)]);
    writer.write_event(Event::Start(child))?;
    writer.write_event(Event::Text(BytesText::new(message)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::TestPhase;

    fn entry(node_id: &str, status: TestStatus) -> ReportEntry {
        ReportEntry::new(node_id, TestPhase::Call, status, Duration::from_secs(1))
    }

    #[test]
    fn test_counts() {
        let entries = vec![
            entry("a::b::one", TestStatus::Passed),
            entry("a::b::two", TestStatus::Failed),
            entry("a::b::three", TestStatus::Error),
            entry("a::b::four", TestStatus::XFailed),
            entry("a::b::five", TestStatus::XPassed),
        ];
        let counts = count(&entries);
        assert_eq!(counts.tests, 5);
        assert_eq!(counts.failures, 2);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.skipped, 1);
    }

    #[test]
    fn test_write_xml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");
        let entries = vec![
            entry("tests/web.rs::Smoke::loads", TestStatus::Passed),
            entry("tests/web.rs::Smoke::fails", TestStatus::Failed)
                .with_message("title mismatch"),
        ];
        write_xml(&path, "web-harness", &entries, Duration::from_secs(3)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<testsuites name=\"web-harness\""));
        assert!(text.contains("tests=\"2\""));
        assert!(text.contains("failures=\"1\""));
        assert!(text.contains("name=\"fails\""));
        assert!(text.contains("classname=\"tests/web.rs::Smoke\""));
        assert!(text.contains("title mismatch"));
    }
}
