//! Migration registry: discovers migration files once per migrator
//!
//! Setup is a small state machine. The first operation on a migrator moves it
//! from `Uninitialized` through `Scanning` to `Ready`; every later call returns
//! immediately. A fatal error during the scan drops back to `Uninitialized`
//! with nothing kept, so the next call starts over.

use crate::executor::Executor;
use crate::fs::{FileMeta, FileSystem};
use crate::logger::Logger;
use crate::migration::file::parse_file_name;
use crate::migration::parser::parse_sections;
use crate::migration::{Migration, MigrationError, MigratorConfig};
use std::collections::HashSet;
use std::io::BufReader;

/// Where the registry is in its one-time setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupState {
    #[default]
    Uninitialized,
    Scanning,
    Ready,
}

/// Migrations discovered in the configured directory, in discovery order
#[derive(Debug, Default)]
pub struct Registry {
    state: SetupState,
    migrations: Vec<Migration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SetupState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SetupState::Ready
    }

    /// Discovered migrations; empty until setup has run
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Forget everything so the next [`ensure_ready`](Self::ensure_ready) rescans
    pub fn reset(&mut self) {
        self.state = SetupState::Uninitialized;
        self.migrations.clear();
    }

    /// Create the version table and scan the migrations directory, once.
    ///
    /// # Errors
    ///
    /// Returns `Setup` if the version table cannot be created and `Directory`
    /// if the migrations directory cannot be listed. Problems with individual
    /// files are logged and the file is skipped.
    pub fn ensure_ready(
        &mut self,
        executor: &dyn Executor,
        fs: &dyn FileSystem,
        config: &MigratorConfig,
        logger: &dyn Logger,
    ) -> Result<(), MigrationError> {
        if self.state == SetupState::Ready {
            return Ok(());
        }

        self.state = SetupState::Scanning;
        match Self::load(executor, fs, config, logger) {
            Ok(migrations) => {
                self.migrations = migrations;
                self.state = SetupState::Ready;
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn load(
        executor: &dyn Executor,
        fs: &dyn FileSystem,
        config: &MigratorConfig,
        logger: &dyn Logger,
    ) -> Result<Vec<Migration>, MigrationError> {
        config.version_table().ensure(executor)?;
        let migrations = scan(fs, config, logger)?;
        warn_duplicates(&migrations, logger);
        Ok(migrations)
    }
}

/// Read every migration file in the configured directory.
///
/// Entries are visited in listing order. Directories and names without a
/// version are skipped with a debug line, unreadable files with a warning.
/// Files missing either marker are left out without comment.
///
/// # Errors
///
/// Returns `MigrationError::Directory` if the directory cannot be listed.
pub fn scan(
    fs: &dyn FileSystem,
    config: &MigratorConfig,
    logger: &dyn Logger,
) -> Result<Vec<Migration>, MigrationError> {
    let dir = config.dirname();
    let entries = fs.read_dir(dir).map_err(|source| MigrationError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        if let Some(migration) = read_entry(fs, config, logger, entry) {
            migrations.push(migration);
        }
    }
    Ok(migrations)
}

fn read_entry(
    fs: &dyn FileSystem,
    config: &MigratorConfig,
    logger: &dyn Logger,
    entry: FileMeta,
) -> Option<Migration> {
    if entry.is_dir {
        logger.debug(format_args!("skipping directory {}", entry.name));
        return None;
    }

    let Some((version, name)) = parse_file_name(&entry.name, config.version_pattern()) else {
        logger.debug(format_args!("skipping {}: no version in file name", entry.name));
        return None;
    };

    let path = config.dirname().join(&entry.name);
    let reader = match fs.open(&path) {
        Ok(reader) => reader,
        Err(e) => {
            logger.warn(format_args!("skipping {}: cannot open: {}", path.display(), e));
            return None;
        }
    };

    let sections = match parse_sections(
        BufReader::new(reader),
        config.up_marker(),
        config.down_marker(),
    ) {
        Ok(sections) => sections,
        Err(e) => {
            logger.warn(format_args!("skipping {}: cannot read: {}", path.display(), e));
            return None;
        }
    };

    if !sections.is_valid() {
        return None;
    }

    Some(Migration::new(
        version,
        name,
        entry,
        sections.up_sql,
        sections.down_sql,
    ))
}

fn warn_duplicates(migrations: &[Migration], logger: &dyn Logger) {
    let mut seen = HashSet::new();
    for m in migrations {
        if !seen.insert(m.version) {
            logger.warn(format_args!(
                "duplicate migration version {} ({}); the first file found wins ties",
                m.version, m.meta.name
            ));
        }
    }
}
