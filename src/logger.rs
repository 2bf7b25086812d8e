//! Logging utilities with colored module prefixes.
//!
//! This module provides:
//! - `Logger`, a level-filtered handle owned by each page scope
//! - `debug!` / `info!` / `warn!` / `error!` macros that skip formatting when
//!   the level is disabled
//! - `log!` for unconditional CLI output
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::for_debug(configuration.debug);
//! debug!(logger, "jwt09"; "token: {}", token);
//! info!(logger, "spa"; "running in {} mode", mode);
//! ```

use owo_colors::OwoColorize;
use std::io::{Write, stderr};

// ============================================================================
// Level & Logger
// ============================================================================

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Level {
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

/// Level-filtered logger.
///
/// Cheap to copy; every scope carries its own so that one page running with
/// `debug = true` does not make other pages verbose.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    level: Level,
}

impl Logger {
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// `Debug` when the configuration asks for it, `Error` otherwise.
    pub const fn for_debug(debug: bool) -> Self {
        Self::new(if debug { Level::Debug } else { Level::Error })
    }

    /// Check if messages at `level` are written.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Write a message if `level` is enabled.
    pub fn write(&self, level: Level, module: &str, message: &str) {
        if self.enabled(level) {
            write_line(level, module, message);
        }
    }
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix, regardless of level.
///
/// # Usage
/// ```ignore
/// log!("inspect"; "loaded {} components", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::write_line($crate::logger::Level::Info, $module, &format!($($arg)*))
    }};
}

/// Log at a given level through a scoped logger.
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $module:expr; $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.enabled($level) {
            logger.write($level, $module, &format!($($arg)*))
        }
    }};
}

/// Log a debug message (only shown when the scope runs with `debug = true`).
///
/// # Usage
/// ```ignore
/// debug!(logger, "module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $module:expr; $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Debug, $module; $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $module:expr; $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Info, $module; $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $module:expr; $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Warn, $module; $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $module:expr; $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Error, $module; $($arg)*)
    };
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write one line to stderr with a colored `[module]` prefix.
#[inline]
pub fn write_line(level: Level, module: &str, message: &str) {
    let prefix = colorize_prefix(level, module);
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Apply color to a module prefix based on level
#[inline]
fn colorize_prefix(level: Level, module: &str) -> String {
    let prefix = format!("[{module}]");
    match level {
        Level::Debug => prefix.dimmed().to_string(),
        Level::Info => prefix.bright_blue().bold().to_string(),
        Level::Warn => prefix.bright_yellow().bold().to_string(),
        Level::Error => prefix.bright_red().bold().to_string(),
    }
}
