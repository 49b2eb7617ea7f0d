//! Navigation event observers and the session log file.
//!
//! The session handle notifies observers immediately before every
//! navigation. The default observer is [`LoggingListener`], which writes one
//! `timestamp: LEVEL: message` line per navigation to a log file named by
//! the process start time.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use once_cell::sync::Lazy;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Directory the session log files are written to
pub const DEFAULT_LOG_DIR: &str = "Logs";

/// Process start stamp; names the log file for this invocation
static START_STAMP: Lazy<String> =
    Lazy::new(|| Utc::now().format("%Y%m%d_%H%M%S").to_string());

/// Observer notified around session navigation.
///
/// Implementations must not fail: there is no return value and no way to
/// veto the navigation. A logging observer that cannot write simply drops
/// the line.
pub trait NavigationObserver: Send + Sync {
    /// Invoked immediately before the session navigates to `url`.
    fn before_navigate(&self, url: &str);
}

/// Observer that logs every navigation at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl NavigationObserver for LoggingListener {
    fn before_navigate(&self, url: &str) {
        tracing::info!("Navigating to {}", url);
    }
}

/// `timestamp: LEVEL: message` line format for the session log file.
struct PlainLineFormat;

impl<S, N> FormatEvent<S, N> for PlainLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{}: {}: ",
            Utc::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the session log file subscriber, creating `log_dir` if needed.
///
/// The file is named by the process start time, so every invocation gets
/// exactly one log. Returns the log file path. Installing twice (or after
/// another global subscriber) is harmless; the existing subscriber wins.
pub fn init_file_logging(log_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!("{}.log", *START_STAMP));
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .event_format(PlainLineFormat)
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl NavigationObserver for Counting {
        fn before_navigate(&self, _url: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_stamp_shape() {
        // YYYYmmdd_HHMMSS
        assert_eq!(START_STAMP.len(), 15);
        assert_eq!(START_STAMP.as_bytes()[8], b'_');
    }

    #[test]
    fn test_observer_as_trait_object() {
        let observer: Arc<dyn NavigationObserver> = Arc::new(Counting(AtomicUsize::new(0)));
        observer.before_navigate("https://example.com/");
        observer.before_navigate("https://example.com/login");
    }

    #[test]
    fn test_logging_listener_never_fails_without_subscriber() {
        LoggingListener.before_navigate("https://example.com/");
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_file_logging(dir.path()).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "log");
    }
}
