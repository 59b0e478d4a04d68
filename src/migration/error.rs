//! Migration-specific error types

use crate::executor::ExecError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which way a migration runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (run the UP section)
    Up,
    /// Revert the migration (run the DOWN section)
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => f.write_str("up"),
            MigrationDirection::Down => f.write_str("down"),
        }
    }
}

/// Migration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The version tracking table could not be created
    #[error("Failed to prepare version table '{table}': {source}")]
    Setup {
        table: String,
        #[source]
        source: ExecError,
    },
    /// Reading applied versions back failed
    #[error("Failed to read applied versions from '{table}': {source}")]
    VersionQuery {
        table: String,
        #[source]
        source: ExecError,
    },
    /// The migrations directory could not be listed
    #[error("Failed to read migrations directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Migration SQL failed
    #[error("Migration {version} failed while running {direction}: {source}")]
    ExecutionFailed {
        version: i64,
        direction: MigrationDirection,
        #[source]
        source: ExecError,
    },
    /// Migration SQL ran but the tracking row could not be written or removed.
    /// The schema is changed while the table says otherwise.
    #[error(
        "Migration {version} ran {direction} but the version table could not be updated: {source}"
    )]
    Tracking {
        version: i64,
        direction: MigrationDirection,
        #[source]
        source: ExecError,
    },
    /// A new migration could not be written
    #[error("Failed to write migration file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Migration name unusable as part of a file name
    #[error("Invalid migration name {0:?}: must be non-empty and contain no path separators")]
    InvalidName(String),
    /// A configured pattern does not compile
    #[error("Invalid {field} pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    /// Table or column name that cannot be interpolated into SQL
    #[error("Invalid SQL identifier {0:?}: use letters, digits and underscores")]
    InvalidIdentifier(String),
}
