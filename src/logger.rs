use std::io::Write;
use std::time::Instant;

use log::{Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: log::LevelFilter = log::LevelFilter::Warn;

struct VtaskLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: log::LevelFilter,
    start: Instant,
}

impl VtaskLogger {
    fn format(&self, record: &Record) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        format!(
            "[{elapsed:.3}s] [{}] {} - {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for VtaskLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");

        if let Some(ref file) = self.file {
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Parse a `RUST_LOG`-style level name, falling back to [`DEFAULT_FILTER`].
#[must_use]
pub fn parse_filter(value: Option<&str>) -> log::LevelFilter {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_FILTER)
}

/// Initialize the global logger, writing to stderr and optionally to `log_file`.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), SetLoggerError> {
    let filter = parse_filter(std::env::var("RUST_LOG").ok().as_deref());

    let logger = VtaskLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
