#![deny(missing_docs)]
//! Shared logging utilities for the spider workspace.
//!
//! This crate provides the `spider_*` logging macros used by the engine,
//! a terminal logger initializer for library consumers and a minimal test
//! initializer for the global logger.

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, ConfigBuilder, TermLogger, TerminalMode};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! spider_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: "spider", $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! spider_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: "spider", $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! spider_info {
    ($($arg:tt)*) => {{
        log::info!(target: "spider", $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! spider_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: "spider", $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! spider_error {
    ($($arg:tt)*) => {{
        log::error!(target: "spider", $($arg)*);
    }};
}

/// Initializes a terminal logger at the given level.
///
/// Returns `false` if a global logger was already installed, in which case
/// the existing logger is left in place.
pub fn initialize(level: LevelFilter) -> bool {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();

    CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )])
    .is_ok()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
