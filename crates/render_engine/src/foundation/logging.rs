//! Logging utilities and structured logging support
//!
//! Log output goes through a pluggable printer: the logger formats each
//! record with its printer and emits the result, so embedders can swap the
//! sink without touching call sites. `env_logger` remains available as a
//! drop-in alternative via [`init`].

use std::io::Write;

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

pub use log::{debug, error, info, trace, warn};

/// Formats and emits one log line
pub trait LogPrinter: Send + Sync {
    /// Render a record into the line that will be emitted
    fn format(&self, record: &Record) -> String {
        format!("[{}] {}: {}", record.level(), record.target(), record.args())
    }

    /// Write one formatted line
    fn emit(&self, line: &str, level: Level);
}

/// Printer writing to stdout, errors and warnings to stderr
#[derive(Debug, Default)]
pub struct ConsolePrinter;

impl LogPrinter for ConsolePrinter {
    fn emit(&self, line: &str, level: Level) {
        if level <= Level::Warn {
            let _ = writeln!(std::io::stderr(), "{line}");
        } else {
            let _ = writeln!(std::io::stdout(), "{line}");
        }
    }
}

/// `log::Log` implementation delegating to a [`LogPrinter`]
pub struct EngineLogger {
    printer: Box<dyn LogPrinter>,
    max_level: LevelFilter,
}

impl EngineLogger {
    /// Build a logger around the given printer
    pub fn new(printer: Box<dyn LogPrinter>, max_level: LevelFilter) -> Self {
        Self { printer, max_level }
    }

    /// Install this logger as the global `log` backend. Fails if a logger
    /// is already installed.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl log::Log for EngineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = self.printer.format(record);
            self.printer.emit(&line, record.level());
        }
    }

    fn flush(&self) {}
}

/// Install the default console logger at the given level. A second call
/// (or a previously installed logger) is ignored.
pub fn init_with_level(max_level: LevelFilter) {
    let _ = EngineLogger::new(Box::<ConsolePrinter>::default(), max_level).install();
}

/// Initialize logging from the environment via `env_logger`.
pub fn init() {
    env_logger::init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct CapturePrinter {
        lines: Arc<Mutex<Vec<(String, Level)>>>,
    }

    impl LogPrinter for CapturePrinter {
        fn emit(&self, line: &str, level: Level) {
            self.lines
                .lock()
                .expect("lock poisoned")
                .push((line.to_string(), level));
        }
    }

    fn with_record(level: Level, args: std::fmt::Arguments, f: impl FnOnce(&Record)) {
        let record = Record::builder()
            .args(args)
            .level(level)
            .target("render")
            .build();
        f(&record);
    }

    #[test]
    fn default_format_includes_level_and_target() {
        let printer = ConsolePrinter;
        with_record(Level::Warn, format_args!("hello"), |record| {
            assert_eq!(printer.format(record), "[WARN] render: hello");
        });
    }

    #[test]
    fn logger_filters_below_max_level() {
        use log::Log;

        let lines = Arc::new(Mutex::new(Vec::new()));
        let printer = CapturePrinter {
            lines: Arc::clone(&lines),
        };
        let logger = EngineLogger::new(Box::new(printer), LevelFilter::Info);

        with_record(Level::Debug, format_args!("dropped"), |record| {
            logger.log(record);
        });
        with_record(Level::Info, format_args!("kept"), |record| {
            logger.log(record);
        });

        let captured = lines.lock().expect("lock poisoned");
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0, "[INFO] render: kept");
        assert_eq!(captured[0].1, Level::Info);
    }
}
