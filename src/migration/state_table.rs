//! Version tracking table
//!
//! Applied migrations are recorded as bare version integers in a single table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS shmig_version (
//!     version integer primary key,
//!     migrated_at timestamp not null default (datetime(current_timestamp))
//! )
//! ```
//!
//! Nothing is cached: every question about applied state goes back to the
//! database, so changes made by other tools between two checks are seen.

use crate::executor::{ExecOutcome, Executor, Value};
use crate::migration::{MigrationDirection, MigrationError};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_TABLE_NAME: &str = "shmig_version";
pub const DEFAULT_VERSION_COLUMN: &str = "version";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Name and layout of the version tracking table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTable {
    table_name: String,
    version_column: String,
    create_sql: Option<String>,
}

impl Default for VersionTable {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            version_column: DEFAULT_VERSION_COLUMN.to_string(),
            create_sql: None,
        }
    }
}

impl VersionTable {
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidIdentifier` unless both names are plain
    /// SQL identifiers; they are interpolated into statements.
    pub fn new(
        table_name: impl Into<String>,
        version_column: impl Into<String>,
    ) -> Result<Self, MigrationError> {
        let table_name = validate_identifier(table_name.into())?;
        let version_column = validate_identifier(version_column.into())?;
        Ok(Self {
            table_name,
            version_column,
            create_sql: None,
        })
    }

    /// Replace the default (SQLite) `CREATE TABLE` statement
    #[must_use]
    pub fn with_create_sql(mut self, sql: impl Into<String>) -> Self {
        self.create_sql = Some(sql.into());
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn version_column(&self) -> &str {
        &self.version_column
    }

    pub fn create_sql(&self) -> String {
        match &self.create_sql {
            Some(sql) => sql.clone(),
            None => format!(
                "CREATE TABLE IF NOT EXISTS {table} (\n\t{col} integer primary key,\n\tmigrated_at timestamp not null default (datetime(current_timestamp))\n)",
                table = self.table_name,
                col = self.version_column,
            ),
        }
    }

    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {col} FROM {table} ORDER BY {col}",
            col = self.version_column,
            table = self.table_name
        )
    }

    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES (?)",
            self.table_name, self.version_column
        )
    }

    pub fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table_name, self.version_column
        )
    }

    /// Create the table if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Setup` if the statement fails.
    pub fn ensure(&self, executor: &dyn Executor) -> Result<(), MigrationError> {
        executor
            .execute(&self.create_sql(), &[])
            .map_err(|source| MigrationError::Setup {
                table: self.table_name.clone(),
                source,
            })?;
        Ok(())
    }

    /// Every recorded version, ascending
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::VersionQuery` if the query fails.
    pub fn applied_versions(&self, executor: &dyn Executor) -> Result<Vec<i64>, MigrationError> {
        executor
            .query_versions(&self.select_sql(), &[])
            .map_err(|source| MigrationError::VersionQuery {
                table: self.table_name.clone(),
                source,
            })
    }

    /// Whether `version` is recorded, from a fresh read of the table
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::VersionQuery` if the query fails.
    pub fn is_applied(&self, executor: &dyn Executor, version: i64) -> Result<bool, MigrationError> {
        Ok(self.applied_versions(executor)?.contains(&version))
    }

    /// Record `version` as applied
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Tracking` if the insert fails.
    pub fn record(&self, executor: &dyn Executor, version: i64) -> Result<ExecOutcome, MigrationError> {
        executor
            .execute(&self.insert_sql(), &[Value::from(version)])
            .map_err(|source| MigrationError::Tracking {
                version,
                direction: MigrationDirection::Up,
                source,
            })
    }

    /// Remove the record for `version`
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Tracking` if the delete fails.
    pub fn remove(&self, executor: &dyn Executor, version: i64) -> Result<ExecOutcome, MigrationError> {
        executor
            .execute(&self.delete_sql(), &[Value::from(version)])
            .map_err(|source| MigrationError::Tracking {
                version,
                direction: MigrationDirection::Down,
                source,
            })
    }
}

fn validate_identifier(name: String) -> Result<String, MigrationError> {
    if IDENTIFIER.is_match(&name) {
        Ok(name)
    } else {
        Err(MigrationError::InvalidIdentifier(name))
    }
}
