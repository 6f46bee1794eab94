//! Custom logging module.
//!
//! This module provides the `log` backend: each record is written to stderr
//! and optionally handed to a capture callback.

use crate::error::AppError;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::Mutex;

type Capture = Box<dyn Fn(String) + Send + Sync>;

/// Format a log record into a string for display
///
pub fn format_log(record: &Record) -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let level_str = match record.level() {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    format!("{} {} {}", timestamp, level_str, record.args())
}

/// Logger writing to stderr up to a maximum level.
///
pub struct Logger {
    level: LevelFilter,
    stderr: bool,
    capture: Mutex<Option<Capture>>,
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Logger {
            level,
            stderr: true,
            capture: Mutex::new(None),
        }
    }

    /// Hand every formatted record to `callback` as well.
    ///
    pub fn with_capture(self, callback: Capture) -> Self {
        if let Ok(mut guard) = self.capture.lock() {
            *guard = Some(callback);
        }
        self
    }

    /// Stop writing to stderr; only the capture callback sees records.
    ///
    pub fn quiet(mut self) -> Self {
        self.stderr = false;
        self
    }

    /// Install as the global logger. Fails if one is already installed.
    ///
    pub fn init(self) -> Result<(), AppError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self)))
            .map_err(|e| AppError::Logger(e.to_string()))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let formatted = format_log(record);
        if self.stderr {
            let _ = writeln!(std::io::stderr(), "{}", formatted);
        }
        if let Ok(capture) = self.capture.lock() {
            if let Some(ref cb) = *capture {
                cb(formatted);
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Map `-v` occurrences to a level: warnings by default, then info, debug
/// and trace.
///
pub fn level_for(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_format_log() {
        let line = format_log(
            &Record::builder()
                .args(format_args!("Dashboard refreshed"))
                .level(Level::Info)
                .build(),
        );
        assert!(line.ends_with(" INFO Dashboard refreshed"));
    }

    #[test]
    fn test_capture_respects_level() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger = Logger::new(LevelFilter::Warn)
            .quiet()
            .with_capture(Box::new(move |line| sink.lock().unwrap().push(line)));

        logger.log(
            &Record::builder()
                .args(format_args!("Falling back to demo data"))
                .level(Level::Warn)
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("Dispatching getComplaints"))
                .level(Level::Debug)
                .build(),
        );

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("WARN Falling back to demo data"));
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(7), LevelFilter::Trace);
    }
}
