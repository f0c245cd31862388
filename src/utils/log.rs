//! Simple logging module.
//!
//! Diagnostics go to stderr so they never mix with guest output, which owns
//! stdout. Timestamps are seconds elapsed since the first log call.

use std::fmt::{Arguments, Display};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Log level for filtering messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static START: OnceLock<Instant> = OnceLock::new();

/// Initialize the logger with the given level.
pub fn init(level: Level) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    START.get_or_init(Instant::now);
}

/// Returns true if the given level should be logged.
#[inline]
fn enabled(level: Level) -> bool {
    level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Writes one formatted record to stderr. Prefer the `info!`, `warn!` and
/// `error!` macros over calling this directly.
pub fn log(level: Level, args: Arguments<'_>) {
    if enabled(level) {
        let elapsed = START.get_or_init(Instant::now).elapsed();
        eprintln!(
            "{:>6}.{:03} [{:5}] {}",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            level,
            args
        );
    }
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::utils::log::log($crate::utils::log::Level::Info, format_args!($($arg)*))
    };
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::utils::log::log($crate::utils::log::Level::Warn, format_args!($($arg)*))
    };
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::utils::log::log($crate::utils::log::Level::Error, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_display() {
        assert_eq!(format!("{}", Level::Info), "INFO");
        assert_eq!(format!("{}", Level::Warn), "WARN");
        assert_eq!(format!("{}", Level::Error), "ERROR");
    }

    #[test]
    fn init_sets_log_level() {
        init(Level::Error);
        assert!(!enabled(Level::Info));
        assert!(!enabled(Level::Warn));
        assert!(enabled(Level::Error));

        // Reset to default for other tests
        init(Level::Info);
        assert!(enabled(Level::Info));
    }
}
