//! Leveled file logging for the engine.
//!
//! Records go to a single sink file as
//! `[HH:MM:SS.mmm] [LEVEL] module::path: message`. Nothing is written until
//! `init` or `init_at` installs the sink, so the library can be embedded
//! without touching the filesystem.
//!
//! `WEFT_LOG` picks the level by name (`error` to `trace`). `WEFT_DEBUG=1`
//! is shorthand for `debug`.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

const LOG_FILE: &str = "weft.log";

static SINK: OnceLock<Sink> = OnceLock::new();
static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Severity of a record. Lower is more severe.
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
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Level requested by the environment, if any.
    fn from_env() -> Option<Self> {
        if let Ok(name) = std::env::var("WEFT_LOG") {
            if let Ok(level) = name.parse() {
                return Some(level);
            }
        }
        std::env::var("WEFT_DEBUG")
            .ok()
            .filter(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .map(|_| LogLevel::Debug)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation(format!("unknown log level '{}'", s)))
    }
}

/// An open log file shared by every caller.
struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

impl Sink {
    /// Open `path` for writing, truncating what a previous run left.
    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    fn write(&self, level: LogLevel, target: &str, msg: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        // keep logging after a writer panicked
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(file, "[{}] [{}] {}: {}", timestamp, level, target, msg);
    }
}

/// Log to `~/.weft/weft.log` at the level the environment asks for,
/// `Info` otherwise. Returns the log file path.
///
/// # Errors
/// `NoHomeDir`, or an I/O error creating the file.
pub fn init() -> Result<PathBuf> {
    let path = Config::weft_dir()?.join(LOG_FILE);
    init_at(&path, LogLevel::from_env().unwrap_or(LogLevel::Info))?;
    Ok(path)
}

/// Log to `path` at `level`.
///
/// Only the first sink sticks; later calls just change the level.
///
/// # Errors
/// An I/O error creating the file.
pub fn init_at(path: &Path, level: LogLevel) -> Result<()> {
    set_level(level);
    if SINK.get().is_some() {
        return Ok(());
    }
    let _ = SINK.set(Sink::create(path)?);
    Ok(())
}

/// File records are written to, once initialized.
pub fn path() -> Option<&'static Path> {
    SINK.get().map(|sink| sink.path.as_path())
}

pub fn set_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> LogLevel {
    let raw = LEVEL.load(Ordering::Relaxed);
    LogLevel::ALL
        .get(usize::from(raw))
        .copied()
        .unwrap_or(LogLevel::Trace)
}

/// True when a record at `level` would be written.
pub fn enabled(level: LogLevel) -> bool {
    SINK.get().is_some() && level <= self::level()
}

/// Write one record. Used by the `wlog*` macros.
pub fn log_at(level: LogLevel, target: &str, msg: &str) {
    if level > self::level() {
        return;
    }
    if let Some(sink) = SINK.get() {
        sink.write(level, target, msg);
    }
}

/// Log at INFO.
#[macro_export]
macro_rules! wlog {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Info, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! wlog_error {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Error, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! wlog_warn {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Warn, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! wlog_debug {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Debug, module_path!(), &format!($($arg)*))
    };
}

/// Log at TRACE. Worker ranking and queue internals only.
#[macro_export]
macro_rules! wlog_trace {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Trace, module_path!(), &format!($($arg)*))
    };
}
