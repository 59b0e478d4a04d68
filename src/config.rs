//! Settings loaded from `config/sqlmig.toml` and `SQLMIG__*` environment variables.
//!
//! ```toml
//! [database]
//! url = "sqlite://app.db"
//!
//! [migrations]
//! dir = "migrations"
//! table_name = "shmig_version"
//! ```
//!
//! Environment variables override the file, with `__` separating the section from
//! the key: `SQLMIG__DATABASE__URL`, `SQLMIG__MIGRATIONS__DIR`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/sqlmig.toml";
pub const ENV_PREFIX: &str = "SQLMIG";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub migrations: MigrationSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// Knobs for [`MigratorConfig`](crate::migration::MigratorConfig); every field
/// defaults to the engine default
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MigrationSettings {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_version_column")]
    pub version_column: String,
    #[serde(default = "default_up_marker")]
    pub up_marker: String,
    #[serde(default = "default_down_marker")]
    pub down_marker: String,
    #[serde(default = "default_version_pattern")]
    pub version_pattern: String,
    #[serde(default = "default_template_up")]
    pub template_up: String,
    #[serde(default = "default_template_down")]
    pub template_down: String,
    /// Replaces the built-in SQLite `CREATE TABLE` for the version table
    #[serde(default)]
    pub create_table_sql: Option<String>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            table_name: default_table_name(),
            version_column: default_version_column(),
            up_marker: default_up_marker(),
            down_marker: default_down_marker(),
            version_pattern: default_version_pattern(),
            template_up: default_template_up(),
            template_down: default_template_down(),
            create_table_sql: None,
        }
    }
}

fn default_db_url() -> String {
    "sqlite://sqlmig.db".to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from(crate::migration::DEFAULT_DIR)
}

fn default_table_name() -> String {
    crate::migration::DEFAULT_TABLE_NAME.to_string()
}

fn default_version_column() -> String {
    crate::migration::DEFAULT_VERSION_COLUMN.to_string()
}

fn default_up_marker() -> String {
    crate::migration::DEFAULT_UP_MARKER.to_string()
}

fn default_down_marker() -> String {
    crate::migration::DEFAULT_DOWN_MARKER.to_string()
}

fn default_version_pattern() -> String {
    crate::migration::DEFAULT_VERSION_PATTERN.to_string()
}

fn default_template_up() -> String {
    crate::migration::DEFAULT_TEMPLATE_UP.to_string()
}

fn default_template_down() -> String {
    crate::migration::DEFAULT_TEMPLATE_DOWN.to_string()
}

impl Settings {
    /// Load from `config/sqlmig.toml` (optional) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path` (optional) and the environment.
    ///
    /// A file that exists but cannot be parsed is reported with a warning and
    /// skipped; the environment still applies.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load config file {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        settings.try_deserialize::<Settings>()
    }
}
