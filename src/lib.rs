//! Web Harness - Browser UI testing with WebDriver session management.
//!
//! This crate provides:
//! - Validated run configuration loaded from a JSON file
//! - Per-browser driver provisioning (Chrome, Firefox, Edge) with headless
//!   and container-aware launch options
//! - Navigation event logging through pluggable observers
//! - Per-test session lifecycle with guaranteed teardown
//! - Screenshot-on-failure capture and HTML/XML report generation
//!
//! # Example
//!
//! ```rust,no_run
//! use web_harness::{RunConfig, SuiteRunner};
//!
//! # async fn demo() -> Result<(), web_harness::HarnessError> {
//! let config = RunConfig::load(std::path::Path::new("."), None)?;
//! let summary = SuiteRunner::new(config).run(&[]).await?;
//! println!("{} passed, {} failed", summary.passed(), summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod events;
pub mod report;
pub mod runner;
pub mod session;

// Re-export configuration types
pub use config::{Browser, ConfigError, RunConfig};

// Re-export driver provisioning
pub use driver::{DriverError, DriverProcess, provision, resolve_download_dir};

// Re-export navigation events
pub use events::{LoggingListener, NavigationObserver, init_file_logging};

// Re-export report types and writers
pub use report::{REPORT_TITLE, ReportEntry, TestPhase, TestStatus};

// Re-export the suite runner
pub use runner::{FailureCapture, HarnessError, RunSummary, Scenario, SuiteRunner, classify};

// Re-export session management
pub use session::{SessionError, SessionHandle, SessionState, TestSession};
