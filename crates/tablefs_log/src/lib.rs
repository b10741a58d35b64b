//! tablefs Logging Module
//!
//! Structured logging to the console and an optional rolling file, plus a
//! crash-report panic hook.

mod logging;
mod panic_hook;

pub use logging::{cleanup_old_logs, init_logging, LogGuard, LogOptions, LOG_FILE_NAME};
pub use panic_hook::init_panic_hook;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the default log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("dev", "tablefs", "tablefs")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}
