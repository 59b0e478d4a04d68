//! SQLite implementation of [`Executor`] on top of `rusqlite`

use crate::executor::{ExecError, ExecOutcome, Executor, Value};
use rusqlite::{params_from_iter, types, Connection};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::debug_span;

/// `Executor` backed by a single `rusqlite::Connection`
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Wrap an existing connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a database from a URL-ish string
    ///
    /// Accepts `:memory:`, a plain file path, or `sqlite://<path>`.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Sqlite` if the database cannot be opened.
    pub fn open(url: &str) -> Result<Self, ExecError> {
        let target = url.strip_prefix("sqlite://").unwrap_or(url);
        let conn = if target == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(target))?
        };
        Ok(Self::new(conn))
    }

    /// Open a fresh in-memory database
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Sqlite` if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, ExecError> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consume the executor and return the underlying connection
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn bind(params: &[Value]) -> impl Iterator<Item = types::Value> + '_ {
        params.iter().map(|p| match p {
            Value::Integer(v) => types::Value::Integer(*v),
            Value::Text(s) => types::Value::Text(s.clone()),
            Value::Null => types::Value::Null,
        })
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("sqlite.execute", sql).entered();

        let changed = if params.is_empty() {
            // Migration bodies hold several statements; only the batch API accepts that.
            self.conn.execute_batch(sql)?;
            self.conn.changes() as u64
        } else {
            self.conn.execute(sql, params_from_iter(Self::bind(params)))? as u64
        };
        Ok(ExecOutcome::new(self.conn.last_insert_rowid(), changed))
    }

    fn query_versions(&self, sql: &str, params: &[Value]) -> Result<Vec<i64>, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("sqlite.query_versions", sql).entered();

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(Self::bind(params)), |row| row.get::<_, i64>(0))?;
        let versions = rows.collect::<Result<Vec<i64>, rusqlite::Error>>()?;
        Ok(versions)
    }
}
