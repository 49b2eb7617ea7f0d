pub mod columns;
pub mod html;
pub mod types;
pub mod xml;

pub use columns::{Column, INSERTED_COLUMNS, STOCK_COLUMNS, result_columns, row_cells, splice};
pub use html::{REPORT_TITLE, screenshot_fragment, write_html};
pub use types::{ReportEntry, TestPhase, TestStatus, format_duration, test_case_id};
pub use xml::write_xml;
