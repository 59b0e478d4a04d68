//! Logging capability handed to the migrator at construction
//!
//! The default, [`LogFacade`], forwards to the `log` crate under the `sqlmig`
//! target so the host application's logger decides where lines go. [`Silent`]
//! drops everything.

use log::Level;
use std::fmt;

pub const LOG_TARGET: &str = "sqlmig";

/// Sink for migrator log lines
pub trait Logger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

/// Forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: LOG_TARGET, level, "{}", args);
    }
}

/// Discards every line
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Logger for Silent {
    fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}
