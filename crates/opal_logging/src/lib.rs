#![deny(missing_docs)]
//! Shared logging utilities for the OPAL workspace.
//!
//! This crate provides the `opal_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged while
//! a batch is active are prefixed with `[batch N]`.

use std::sync::atomic::{AtomicU64, Ordering};

#[doc(hidden)]
pub use log as __log;

/// Number of the batch currently being processed; 0 when none is active.
static CURRENT_BATCH: AtomicU64 = AtomicU64::new(0);

/// Marks `batch` as the active batch for subsequent log lines.
/// Batches are numbered from 1; passing 0 clears the tag.
pub fn set_batch(batch: u64) {
    CURRENT_BATCH.store(batch, Ordering::Relaxed);
}

/// Clears the active batch tag.
pub fn clear_batch() {
    set_batch(0);
}

/// Returns the active batch number, or 0 if no batch is active.
pub fn current_batch() -> u64 {
    CURRENT_BATCH.load(Ordering::Relaxed)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __opal_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::current_batch() {
            0 => $crate::__log::$level!($($arg)*),
            batch => $crate::__log::$level!("[batch {}] {}", batch, format_args!($($arg)*)),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! opal_trace {
    ($($arg:tt)*) => {
        $crate::__opal_log!(trace, $($arg)*)
    };
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! opal_debug {
    ($($arg:tt)*) => {
        $crate::__opal_log!(debug, $($arg)*)
    };
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! opal_info {
    ($($arg:tt)*) => {
        $crate::__opal_log!(info, $($arg)*)
    };
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! opal_warn {
    ($($arg:tt)*) => {
        $crate::__opal_log!(warn, $($arg)*)
    };
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! opal_error {
    ($($arg:tt)*) => {
        $crate::__opal_log!(error, $($arg)*)
    };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
