//! # sqlmig
//!
//! Versioned SQL file migrations for SQLite (and anything else behind the
//! [`Executor`] trait): discover migration files, track applied versions in a
//! table, apply and revert them in order.
//!
//! The engine lives in [`migration`]. Database access goes through
//! [`Executor`], file access through [`FileSystem`], and log output through
//! [`Logger`], so each can be swapped out in tests or embedded use.

pub mod config;
pub mod executor;
pub mod fs;
pub mod logger;
pub mod migration;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(all(feature = "sqlite", any(test, feature = "test-helpers")))]
pub mod test_helpers;

pub use config::Settings;
pub use executor::{ExecError, ExecOutcome, Executor, Value};
pub use fs::{FileMeta, FileSystem, MemoryFileSystem, OsFileSystem};
pub use logger::{LogFacade, Logger, Silent};
pub use migration::{Migrate, MigrationError, MigrationStatus, Migrator, MigratorConfig};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;
