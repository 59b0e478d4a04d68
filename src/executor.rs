//! `Executor` - the database capability the migration engine runs against
//!
//! The engine never talks to a driver directly. It needs exactly two things: run a
//! statement, and read back a list of version integers. Anything that can do those
//! two things (a SQLite connection, a pooled Postgres client, a test double) can
//! drive migrations.

/// Executor error type
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// SQLite error from `rusqlite`
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),
    /// Other execution errors
    #[error("Execution error: {0}")]
    Other(String),
}

/// A driver-neutral statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Null,
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Result handle of a mutating statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    last_insert_id: i64,
    rows_affected: u64,
}

impl ExecOutcome {
    #[must_use]
    pub fn new(last_insert_id: i64, rows_affected: u64) -> Self {
        Self {
            last_insert_id,
            rows_affected,
        }
    }

    /// Identifier of the last inserted row, as reported by the driver
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Rows changed by the statement (0 for DDL)
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}

/// Trait for executing migration SQL
///
/// Implementations are borrowed by the migrator for the duration of an operation;
/// the caller owns the connection.
///
/// # Examples
///
/// ```no_run
/// use sqlmig::executor::{Executor, ExecError, Value};
///
/// # fn example(executor: &dyn Executor) -> Result<(), ExecError> {
/// executor.execute("DELETE FROM shmig_version WHERE version = ?", &[Value::from(42i64)])?;
/// let versions = executor.query_versions("SELECT version FROM shmig_version ORDER BY version", &[])?;
/// # Ok(())
/// # }
/// ```
pub trait Executor {
    /// Execute a mutating statement
    ///
    /// With an empty `params` slice the text may hold several `;`-separated
    /// statements, which is how migration bodies are run.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the statement fails.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ExecError>;

    /// Run a query and return the first column of every row as `i64`, in result order
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the query fails or a value is not an integer.
    fn query_versions(&self, sql: &str, params: &[Value]) -> Result<Vec<i64>, ExecError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ExecError> {
        (**self).execute(sql, params)
    }

    fn query_versions(&self, sql: &str, params: &[Value]) -> Result<Vec<i64>, ExecError> {
        (**self).query_versions(sql, params)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ExecError> {
        (**self).execute(sql, params)
    }

    fn query_versions(&self, sql: &str, params: &[Value]) -> Result<Vec<i64>, ExecError> {
        (**self).query_versions(sql, params)
    }
}
