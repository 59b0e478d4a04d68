//! Migration status tracking

use crate::migration::Migration;
use chrono::{DateTime, Utc};

/// Migration status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Applied versions, as persisted (may include versions with no file)
    pub applied: Vec<i64>,

    /// Pending migrations (from the registry), ascending
    pub pending: Vec<PendingMigration>,

    /// Total number of migrations (applied + pending)
    pub total: usize,

    /// Number of applied migrations
    pub applied_count: usize,

    /// Number of pending migrations
    pub pending_count: usize,
}

/// Represents a pending migration (not yet applied)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
    /// Migration version
    pub version: i64,

    /// Migration name
    pub name: String,

    /// Version read as a timestamp, when it is one
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Migration> for PendingMigration {
    fn from(m: &Migration) -> Self {
        Self {
            version: m.version,
            name: m.name.clone(),
            created_at: m.created_at,
        }
    }
}

/// A discovered migration and whether it is currently applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    pub version: i64,
    pub name: String,
    pub file_name: String,
    pub applied: bool,
}

impl MigrationStatus {
    /// Create a new `MigrationStatus`
    #[must_use]
    pub fn new(applied: Vec<i64>, pending: Vec<PendingMigration>) -> Self {
        let applied_count = applied.len();
        let pending_count = pending.len();
        let total = applied_count + pending_count;

        Self {
            applied,
            pending,
            total,
            applied_count,
            pending_count,
        }
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count == 0
    }

    /// Get the latest applied migration version
    #[must_use]
    pub fn latest_applied_version(&self) -> Option<i64> {
        self.applied.iter().copied().max()
    }

    /// Get the next pending migration version
    #[must_use]
    pub fn next_pending_version(&self) -> Option<i64> {
        self.pending.first().map(|m| m.version)
    }
}
