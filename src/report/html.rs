//! HTML report writer.
//!
//! Produces a single self-contained page: title, environment table, summary
//! line and the results table with the harness's spliced column layout.
//! Screenshot thumbnails attached by the failure-capture hook are rendered
//! in an extras row under the failing test.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::report::columns::{result_columns, row_cells};
use crate::report::types::{ReportEntry, TestStatus};

/// Fixed report title
pub const REPORT_TITLE: &str = "Browser Automation Test Report";

const STYLE: &str = "\
body { font-family: sans-serif; margin: 24px; color: #222; }\n\
h1 { font-size: 1.4em; }\n\
table { border-collapse: collapse; margin-top: 12px; }\n\
th, td { border: 1px solid #bbb; padding: 4px 10px; text-align: left; }\n\
th { background: #eee; }\n\
tr.passed td.col-result { color: #1a7a1a; }\n\
tr.failed td.col-result, tr.xpassed td.col-result, tr.error td.col-result { color: #b01010; }\n\
tr.skipped td.col-result, tr.xfailed td.col-result { color: #8a6d00; }\n\
tr.extras td { border-top: none; background: #fafafa; }\n";

/// Inline thumbnail fragment attached to a failing test's report entry.
/// Clicking the image opens the full-size screenshot.
pub fn screenshot_fragment(file_name: &str) -> String {
    format!(
        "<div><img src=\"{}\" alt=\"screenshot\" style=\"width:300px;height:228px;\" \
         onclick=\"window.open(this.src)\" align=\"right\"/></div>",
        file_name
    )
}

/// Minimal HTML escaping for text cells.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the full report page.
pub fn render(
    title: &str,
    started: DateTime<Utc>,
    environment: &[(String, String)],
    entries: &[ReportEntry],
) -> String {
    let columns = result_columns();
    let mut page = String::new();

    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
         <title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<p>Run started {} UTC</p>\n",
        started.format("%d-%B-%Y %H:%M:%S"),
        title = escape(title),
    );

    page.push_str("<h2>Environment</h2>\n<table>\n");
    for (key, value) in environment {
        let _ = write!(
            page,
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape(key),
            escape(value)
        );
    }
    page.push_str("</table>\n");

    let passed = entries.iter().filter(|e| e.status == TestStatus::Passed).count();
    let failed = entries.iter().filter(|e| e.status.fails_run()).count();
    let other = entries.len() - passed - failed;
    let _ = write!(
        page,
        "<h2>Results</h2>\n<p>{} tests: {} passed, {} failed, {} other</p>\n",
        entries.len(),
        passed,
        failed,
        other
    );

    page.push_str("<table>\n<tr>");
    for column in &columns {
        let _ = write!(page, "<th>{}</th>", column.header());
    }
    page.push_str("</tr>\n");

    for entry in entries {
        let _ = write!(page, "<tr class=\"{}\">", entry.status.label().to_lowercase());
        for (index, cell) in row_cells(entry).iter().enumerate() {
            let class = if index == 0 { " class=\"col-result\"" } else { "" };
            let _ = write!(page, "<td{}>{}</td>", class, escape(cell));
        }
        page.push_str("</tr>\n");

        if !entry.extras.is_empty() || entry.message.is_some() {
            let _ = write!(page, "<tr class=\"extras\"><td colspan=\"{}\">", columns.len());
            if let Some(message) = &entry.message {
                let _ = write!(page, "<pre>{}</pre>", escape(message));
            }
            for extra in &entry.extras {
                // Extras are trusted fragments produced by the hooks.
                page.push_str(extra);
            }
            page.push_str("</td></tr>\n");
        }
    }
    page.push_str("</table>\n</body>\n</html>\n");
    page
}

/// Render and write the report beside any captured screenshots.
pub fn write_html(
    path: &Path,
    title: &str,
    started: DateTime<Utc>,
    environment: &[(String, String)],
    entries: &[ReportEntry],
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render(title, started, environment, entries))
}
