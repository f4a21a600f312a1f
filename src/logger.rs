//! Application logger.
//!
//! Every record goes to an in-memory buffer shown in the logs dialog (`G`).
//! With logging enabled in the config, records are also appended to
//! `accountdesk.log` under the user's data directory.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Oldest entries are dropped past this many.
const MAX_LOG_ENTRIES: usize = 1000;

/// Shared logger that can be used across the application
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<Vec<String>>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
            log_file: None,
        }
    }

    /// Build the logger and install it as the `log` backend.
    ///
    /// Only one backend can be installed per process; later calls still get a
    /// working in-memory logger, they just don't receive `log` records.
    pub fn from_config(enabled: bool) -> Result<Self> {
        let log_file = if enabled {
            Some(Self::get_log_file_path()?)
        } else {
            None
        };
        Self::install(log_file)
    }

    /// Install the `log` backend, appending to `log_file` when given.
    ///
    /// The file only counts as active once the backend is in place; if another
    /// backend was installed first, nothing would reach it.
    pub fn install(log_file: Option<PathBuf>) -> Result<Self> {
        let mut logger = Self::new();
        let sink = logger.clone();

        let mut dispatch = fern::Dispatch::new()
            .level(log::LevelFilter::Info)
            .level_for("hyper", log::LevelFilter::Warn)
            .level_for("reqwest", log::LevelFilter::Warn)
            .chain(fern::Output::call(move |record| {
                sink.log(format!("{} {}", record.level(), record.args()));
            }));

        if let Some(path) = &log_file {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
            let file = fern::log_file(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} {:<5} {}: {}",
                            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .chain(file),
            );
        }

        match dispatch.apply() {
            Ok(()) => logger.log_file = log_file,
            Err(_) => logger.log("Logger already installed, keeping the existing backend".to_string()),
        }

        Ok(logger)
    }

    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    /// Path of the log file, when file logging is active.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Where the log file lives when file logging is enabled.
    pub fn get_log_file_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join("accountdesk").join("accountdesk.log"))
    }

    /// Add a log entry
    pub fn log(&self, message: String) {
        let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            logs.push(formatted_message);
            if logs.len() > MAX_LOG_ENTRIES {
                let overflow = logs.len() - MAX_LOG_ENTRIES;
                logs.drain(..overflow);
            }
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
