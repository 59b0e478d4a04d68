//! Migrator configuration

use crate::config::MigrationSettings;
use crate::migration::{MigrationError, VersionTable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIR: &str = "migrations";
pub const DEFAULT_UP_MARKER: &str = r"^\s*--.*UP";
pub const DEFAULT_DOWN_MARKER: &str = r"^\s*--.*DOWN";
pub const DEFAULT_VERSION_PATTERN: &str = r"^\d+";
pub const DEFAULT_TEMPLATE_UP: &str = "\nPRAGMA foreign_keys = ON;\n\nBEGIN;\nCOMMIT;\n";
pub const DEFAULT_TEMPLATE_DOWN: &str = "\nPRAGMA foreign_keys = OFF;\n\nBEGIN;\nCOMMIT;";

static UP_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_UP_MARKER).expect("default up marker is valid"));
static DOWN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_DOWN_MARKER).expect("default down marker is valid"));
static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_VERSION_PATTERN).expect("default version pattern is valid"));

/// Everything the migrator needs besides its executor and filesystem.
///
/// Patterns are compiled when set, so a bad pattern surfaces at configuration
/// time rather than in the middle of a run.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    dirname: PathBuf,
    up_marker: Regex,
    down_marker: Regex,
    version_pattern: Regex,
    version_table: VersionTable,
    template_up: String,
    template_down: String,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from(DEFAULT_DIR),
            up_marker: UP_MARKER.clone(),
            down_marker: DOWN_MARKER.clone(),
            version_pattern: VERSION_PATTERN.clone(),
            version_table: VersionTable::default(),
            template_up: DEFAULT_TEMPLATE_UP.to_string(),
            template_down: DEFAULT_TEMPLATE_DOWN.to_string(),
        }
    }
}

impl MigratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded [`MigrationSettings`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` or `InvalidIdentifier` for unusable settings.
    pub fn from_settings(settings: &MigrationSettings) -> Result<Self, MigrationError> {
        let mut table = VersionTable::new(&settings.table_name, &settings.version_column)?;
        if let Some(sql) = &settings.create_table_sql {
            table = table.with_create_sql(sql);
        }

        Ok(Self::default()
            .with_dir(&settings.dir)
            .with_markers(&settings.up_marker, &settings.down_marker)?
            .with_version_pattern(&settings.version_pattern)?
            .with_version_table(table)
            .with_templates(&settings.template_up, &settings.template_down))
    }

    #[must_use]
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dirname = dir.as_ref().to_path_buf();
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidPattern` if either pattern does not compile.
    pub fn with_markers(mut self, up: &str, down: &str) -> Result<Self, MigrationError> {
        self.up_marker = compile("up marker", up)?;
        self.down_marker = compile("down marker", down)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern does not compile.
    pub fn with_version_pattern(mut self, pattern: &str) -> Result<Self, MigrationError> {
        self.version_pattern = compile("version", pattern)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `InvalidIdentifier` unless both names are plain identifiers.
    pub fn with_table(
        mut self,
        table_name: &str,
        version_column: &str,
    ) -> Result<Self, MigrationError> {
        self.version_table = VersionTable::new(table_name, version_column)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_version_table(mut self, table: VersionTable) -> Self {
        self.version_table = table;
        self
    }

    /// Replace the statement that creates the version table
    #[must_use]
    pub fn with_create_table_sql(mut self, sql: impl Into<String>) -> Self {
        self.version_table = self.version_table.with_create_sql(sql);
        self
    }

    /// Bodies written into new migration files by `create`
    #[must_use]
    pub fn with_templates(mut self, up: impl Into<String>, down: impl Into<String>) -> Self {
        self.template_up = up.into();
        self.template_down = down.into();
        self
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    pub fn up_marker(&self) -> &Regex {
        &self.up_marker
    }

    pub fn down_marker(&self) -> &Regex {
        &self.down_marker
    }

    pub fn version_pattern(&self) -> &Regex {
        &self.version_pattern
    }

    pub fn version_table(&self) -> &VersionTable {
        &self.version_table
    }

    pub fn template_up(&self) -> &str {
        &self.template_up
    }

    pub fn template_down(&self) -> &str {
        &self.template_down
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, MigrationError> {
    Regex::new(pattern).map_err(|source| MigrationError::InvalidPattern { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigratorConfig::default();
        assert_eq!(config.dirname(), Path::new("migrations"));
        assert_eq!(config.up_marker().as_str(), r"^\s*--.*UP");
        assert_eq!(config.down_marker().as_str(), r"^\s*--.*DOWN");
        assert_eq!(config.version_pattern().as_str(), r"^\d+");
        assert_eq!(config.version_table().table_name(), "shmig_version");
        assert_eq!(config.version_table().version_column(), "version");
        assert!(config.template_up().contains("PRAGMA foreign_keys = ON;"));
        assert!(config.template_down().contains("PRAGMA foreign_keys = OFF;"));
    }

    #[test]
    fn test_bad_pattern_is_reported_with_field() {
        let err = MigratorConfig::default()
            .with_markers("-- UP", "(unclosed")
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::InvalidPattern { field: "down marker", .. }
        ));

        let err = MigratorConfig::default().with_version_pattern("[").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidPattern { field: "version", .. }));
    }

    #[test]
    fn test_from_settings() {
        let settings = MigrationSettings {
            dir: PathBuf::from("db/migrate"),
            table_name: "schema_versions".to_string(),
            create_table_sql: Some("CREATE TABLE IF NOT EXISTS schema_versions (version bigint)".to_string()),
            ..MigrationSettings::default()
        };
        let config = MigratorConfig::from_settings(&settings).unwrap();
        assert_eq!(config.dirname(), Path::new("db/migrate"));
        assert_eq!(config.version_table().table_name(), "schema_versions");
        assert_eq!(
            config.version_table().create_sql(),
            "CREATE TABLE IF NOT EXISTS schema_versions (version bigint)"
        );
    }

    #[test]
    fn test_from_settings_rejects_bad_table() {
        let settings = MigrationSettings {
            table_name: "drop table".to_string(),
            ..MigrationSettings::default()
        };
        assert!(matches!(
            MigratorConfig::from_settings(&settings),
            Err(MigrationError::InvalidIdentifier(_))
        ));
    }
}
