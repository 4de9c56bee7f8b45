//! Logging for the GfxEngine frame core
//!
//! Records flow through the `Engine` logging hub to a replaceable `Logger`.
//! The default logger writes coloured, timestamped lines to the console.
//! Per-draw recording never logs; only setup, uploads and failures do.

use colored::*;
use std::fmt;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for log records
///
/// Install a custom sink with `Engine::set_logger` (file logging, in-game console, ...).
///
/// # Example
///
/// ```no_run
/// use gfx_engine::gfx::log::{Logger, LogEntry};
///
/// struct ConsoleOverlay;
///
/// impl Logger for ConsoleOverlay {
///     fn log(&self, entry: &LogEntry) {
///         // Push to the overlay ring buffer...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Handle one record
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Creation time
    pub timestamp: SystemTime,

    /// Emitting component (e.g. "gfx::Graphics", "gfx::Material")
    pub source: String,

    /// Message text
    pub message: String,

    /// Source file, set for detailed ERROR records
    pub file: Option<&'static str>,

    /// Source line, set for detailed ERROR records
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console format
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Format a record without colours
///
/// `[YYYY-mm-dd HH:MM:SS.mmm] [SEVERITY] [source] message (file:line)`
pub fn format_entry(entry: &LogEntry) -> String {
    layout_line(entry, &entry.severity.label(), &entry.source)
}

/// Line layout shared by `format_entry` and `DefaultLogger`
fn layout_line(entry: &LogEntry, severity: &dyn fmt::Display, source: &dyn fmt::Display) -> String {
    let datetime: DateTime<Local> = entry.timestamp.into();
    let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

    match (entry.file, entry.line) {
        (Some(file), Some(line)) => format!(
            "[{}] [{}] [{}] {} ({}:{})",
            timestamp, severity, source, entry.message, file, line
        ),
        _ => format!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
    }
}

/// Console logger with coloured severities
///
/// Warnings and errors go to stderr, everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Coloured console line for `entry`
    pub(crate) fn render(&self, entry: &LogEntry) -> String {
        let severity = match entry.severity {
            LogSeverity::Trace => entry.severity.label().bright_black(),
            LogSeverity::Debug => entry.severity.label().cyan(),
            LogSeverity::Info => entry.severity.label().green(),
            LogSeverity::Warn => entry.severity.label().yellow(),
            LogSeverity::Error => entry.severity.label().red().bold(),
        };
        layout_line(entry, &severity, &entry.source.bright_blue())
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = self.render(entry);

        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// # use gfx_engine::engine_trace;
/// engine_trace!("gfx::Graphics", "Walking {} tasks", 12);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::gfx::Engine::log(
            $crate::gfx::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
///
/// ```no_run
/// # use gfx_engine::engine_debug;
/// engine_debug!("gfx::Graphics", "Allocated geometry buffers ({} byte stride)", 28);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::gfx::Engine::log(
            $crate::gfx::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// ```no_run
/// # use gfx_engine::engine_info;
/// engine_info!("gfx::Graphics", "Material created ({} uniforms)", 2);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::gfx::Engine::log(
            $crate::gfx::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
///
/// ```no_run
/// # use gfx_engine::engine_warn;
/// engine_warn!("gfx::Graphics", "Ignoring resize to {}x{}", 0, 0);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::gfx::Engine::log(
            $crate::gfx::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// ```no_run
/// # use gfx_engine::engine_error;
/// engine_error!("gfx::Graphics", "Program link failed: {}", "missing main");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::gfx::Engine::log_detailed(
            $crate::gfx::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
