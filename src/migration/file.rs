//! Migration file model and filename parsing

use crate::fs::FileMeta;
use chrono::{DateTime, Utc};
use regex::Regex;

/// One discovered, well-formed migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Ordering key taken from the leading digits of the filename
    pub version: i64,

    /// `version` read as Unix seconds. Only meaningful when versions are
    /// timestamps, `None` when out of range.
    pub created_at: Option<DateTime<Utc>>,

    /// Human-readable name (filename minus version prefix and extension)
    pub name: String,

    /// SQL run when migrating up
    pub up_sql: String,

    /// SQL run when migrating down
    pub down_sql: String,

    /// Directory entry the migration was read from
    pub meta: FileMeta,
}

impl Migration {
    pub fn new(
        version: i64,
        name: impl Into<String>,
        meta: FileMeta,
        up_sql: String,
        down_sql: String,
    ) -> Self {
        Self {
            version,
            created_at: DateTime::from_timestamp(version, 0),
            name: name.into(),
            up_sql,
            down_sql,
            meta,
        }
    }
}

/// Extract the version from a filename with `pattern`
///
/// The first match of `pattern` must parse as an `i64`; anything else means the
/// entry is not a migration file.
///
/// # Example
/// - `1610069160-create_users.sql` with `^\d+` → `Some(1610069160)`
/// - `README.md` → `None`
pub fn parse_version(filename: &str, pattern: &Regex) -> Option<i64> {
    parse_file_name(filename, pattern).map(|(version, _)| version)
}

/// Split a filename into its version and display name
///
/// The name is whatever follows the matched version text, minus one `-` or
/// `_` separator and a `.sql` extension, so `0001-init.sql` → `(1, "init")`.
pub fn parse_file_name(filename: &str, pattern: &Regex) -> Option<(i64, String)> {
    let m = pattern.find(filename)?;
    let version = m.as_str().parse::<i64>().ok()?;
    let rest = &filename[m.end()..];
    let rest = rest.strip_suffix(".sql").unwrap_or(rest);
    let rest = rest
        .strip_prefix('-')
        .or_else(|| rest.strip_prefix('_'))
        .unwrap_or(rest);
    Some((version, rest.to_string()))
}
