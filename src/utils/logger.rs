//! Logger utility for application-wide logging
//!
//! A `log::Log` implementation that appends every record to a file and
//! mirrors it to stderr, used when the CLI is given `--log-file`.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// File-backed logger
pub struct Logger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl Logger {
    /// Creates a logger writing to `log_file`, truncating it
    pub fn new<P: AsRef<Path>>(log_file: P, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// Writes one line to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        writeln!(file, "{}", message)?;
        file.flush()
    }

    /// Installs a file logger as the global `log` backend
    pub fn init_global_logger<P: AsRef<Path>>(log_file: P, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            if record.level() <= Level::Info {
                eprintln!("{}", message);
            }
        }
    }

    fn flush(&self) {
        // Every line is flushed as it is written
    }
}
