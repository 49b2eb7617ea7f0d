//! Report table columns.
//!
//! Columns are addressed by explicit identifier rather than table position.
//! The stock renderer layout is a constant here, and the harness's extra
//! columns (test case, run date, run time) are spliced in at fixed offsets
//! while the stock trailing links column is dropped.

use chrono::{DateTime, Utc};

use crate::report::types::{ReportEntry, format_duration};

/// Identifier for a report table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Result,
    TestCase,
    DateRunAt,
    TimeRunAt,
    Test,
    Duration,
    Links,
}

impl Column {
    /// Header text for this column
    pub fn header(&self) -> &'static str {
        match self {
            Column::Result => "Result",
            Column::TestCase => "Test Case",
            Column::DateRunAt => "Date Run At",
            Column::TimeRunAt => "Time Run At",
            Column::Test => "Test",
            Column::Duration => "Duration",
            Column::Links => "Links",
        }
    }
}

/// Layout the stock renderer produces before the harness touches it
pub const STOCK_COLUMNS: [Column; 4] =
    [Column::Result, Column::Test, Column::Duration, Column::Links];

/// Columns the harness adds, in insertion order
pub const INSERTED_COLUMNS: [Column; 3] =
    [Column::TestCase, Column::DateRunAt, Column::TimeRunAt];

/// Splice the harness columns into a row of cells: the three extras land at
/// positions 1-3 and the trailing cell is removed. Relative order of every
/// other cell is preserved.
pub fn splice<T>(mut cells: Vec<T>, inserted: [T; 3]) -> Vec<T> {
    let mut position = 1;
    for cell in inserted {
        let at = position.min(cells.len());
        cells.insert(at, cell);
        position += 1;
    }
    cells.pop();
    cells
}

/// Final column layout of the results table.
pub fn result_columns() -> Vec<Column> {
    splice(STOCK_COLUMNS.to_vec(), INSERTED_COLUMNS)
}

/// Cell values for one entry's table row, spliced like the header.
pub fn row_cells(entry: &ReportEntry) -> Vec<String> {
    let recorded: DateTime<Utc> = entry.recorded_at;
    let stock = vec![
        entry.status.label().to_string(),
        entry.node_id.clone(),
        format_duration(entry.duration),
        String::new(), // links cell the stock renderer would emit
    ];
    splice(
        stock,
        [
            entry.test_case.clone(),
            recorded.format("%d-%B-%Y").to_string(),
            recorded.format("%H:%M:%S").to_string(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::{TestPhase, TestStatus};
    use std::time::Duration;

    #[test]
    fn test_splice_counts() {
        let header: Vec<String> = (0..4).map(|i| format!("col{}", i)).collect();
        let result = splice(header, ["a".into(), "b".into(), "c".into()]);
        // N + 3 inserted - 1 removed
        assert_eq!(result.len(), 4 + 3 - 1);
    }

    #[test]
    fn test_splice_positions_and_order() {
        let header = vec!["Result", "Test", "Duration", "Links"];
        let result = splice(header, ["Test Case", "Date Run At", "Time Run At"]);
        assert_eq!(
            result,
            vec!["Result", "Test Case", "Date Run At", "Time Run At", "Test", "Duration"]
        );
    }

    #[test]
    fn test_splice_removes_original_last_column() {
        let header = vec!["a", "b", "c", "d", "e"];
        let result = splice(header, ["x", "y", "z"]);
        assert!(!result.contains(&"e"));
        // untouched columns keep their relative order
        let kept: Vec<&str> = result
            .iter()
            .copied()
            .filter(|c| ["a", "b", "c", "d"].contains(c))
            .collect();
        assert_eq!(kept, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_result_columns_layout() {
        let columns = result_columns();
        assert_eq!(columns[1], Column::TestCase);
        assert_eq!(columns[2], Column::DateRunAt);
        assert_eq!(columns[3], Column::TimeRunAt);
        assert!(!columns.contains(&Column::Links));
        assert_eq!(columns.len(), STOCK_COLUMNS.len() + 2);
    }

    #[test]
    fn test_row_cells_align_with_columns() {
        let entry = ReportEntry::new(
            "tests/web.rs::Smoke::loads_home_page",
            TestPhase::Call,
            TestStatus::Passed,
            Duration::from_secs(3),
        );
        let cells = row_cells(&entry);
        assert_eq!(cells.len(), result_columns().len());
        assert_eq!(cells[0], "Passed");
        assert_eq!(cells[1], "loads_home_page");
        assert_eq!(cells[4], "tests/web.rs::Smoke::loads_home_page");
        assert_eq!(cells[5], "00:00:03");
    }
}
