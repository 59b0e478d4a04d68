//! Versioned SQL file migrations
//!
//! A migration is a plain SQL file whose name starts with a version number:
//!
//! ```sql
//! -- 1610069160-create_users.sql
//! -- ==== UP ====
//! create table users (id integer primary key);
//! -- ==== DOWN ====
//! drop table users;
//! ```
//!
//! The [`Migrator`] discovers these files once, tracks which versions are
//! applied in a version table, and applies or reverts them in version order.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlmig::migration::{Migrate, Migrator, MigratorConfig};
//! use sqlmig::{OsFileSystem, SqliteExecutor};
//!
//! let db = SqliteExecutor::open("sqlite://app.db")?;
//! let fs = OsFileSystem::current_dir();
//! let config = MigratorConfig::default().with_dir("db/migrations");
//! let mut migrator = Migrator::new(&db, &fs, config);
//!
//! migrator.up(None, None)?;
//! let status = migrator.status()?;
//! assert!(status.is_up_to_date());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod migrator;
pub mod parser;
pub mod registry;
pub mod state_table;
pub mod status;
pub mod template;

pub use config::{
    MigratorConfig, DEFAULT_DIR, DEFAULT_DOWN_MARKER, DEFAULT_TEMPLATE_DOWN, DEFAULT_TEMPLATE_UP,
    DEFAULT_UP_MARKER, DEFAULT_VERSION_PATTERN,
};
pub use error::{MigrationDirection, MigrationError};
pub use file::Migration;
pub use migrator::{Migrate, Migrator, RedoReport};
pub use parser::{parse_sections, Sections};
pub use registry::SetupState;
pub use state_table::{VersionTable, DEFAULT_TABLE_NAME, DEFAULT_VERSION_COLUMN};
pub use status::{MigrationEntry, MigrationStatus, PendingMigration};
