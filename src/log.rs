//! Structured logging for simulation runs.
//!
//! Log levels:
//! - ERROR: Run failures that stop a simulation
//! - WARN: Recoverable conditions (generator failures, overlay conflicts)
//! - INFO: Run lifecycle (start, finish, day boundaries)
//! - DEBUG: Per-worker and per-event traces
//! - TRACE: Raw generator output
//!
//! The level comes from `--debug`/`--trace` or `DAYSIM_DEBUG` (`1` or `trace`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Log levels for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Level selected by the CLI flags and the `DAYSIM_DEBUG` value.
///
/// `DAYSIM_DEBUG` accepts `1`/`true` for debug and `trace` for trace.
pub fn resolve_level(debug: bool, trace: bool, env: Option<&str>) -> LogLevel {
    let env = env.map(|v| v.trim().to_lowercase());
    match env.as_deref() {
        _ if trace => LogLevel::Trace,
        Some("trace") => LogLevel::Trace,
        _ if debug => LogLevel::Debug,
        Some("1") | Some("true") => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

/// Start a fresh log at ~/.daysim/daysim.log filtered at `level`.
pub fn init(level: LogLevel) {
    if let Some(dir) = dirs::home_dir().map(|h| h.join(".daysim")) {
        let _ = std::fs::create_dir_all(&dir);
        init_at(dir.join("daysim.log"), level);
    }
}

/// Start a fresh log at `path`. Only the first call picks the path.
pub fn init_at(path: PathBuf, level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    if LOG_PATH.get().is_none() {
        let _ = std::fs::write(&path, "");
        LOG_PATH.set(path).ok();
    }
}

/// Get the current log level.
pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Log a message at the specified level.
///
/// Messages are dropped silently when logging was never initialized or the
/// file cannot be opened; a simulation never fails because of its log.
pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }

    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

pub fn info(msg: &str) {
    log_at(LogLevel::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log macro for INFO level.
#[macro_export]
macro_rules! slog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

/// Log macro for ERROR level.
#[macro_export]
macro_rules! slog_error {
    ($($arg:tt)*) => {
        $crate::log::error(&format!($($arg)*))
    };
}

/// Log macro for WARN level.
#[macro_export]
macro_rules! slog_warn {
    ($($arg:tt)*) => {
        $crate::log::warn(&format!($($arg)*))
    };
}

/// Log macro for DEBUG level (only logs when debug mode is enabled).
#[macro_export]
macro_rules! slog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

/// Log macro for TRACE level.
#[macro_export]
macro_rules! slog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
