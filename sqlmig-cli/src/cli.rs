//! Command-line arguments and their mapping onto [`Migrate`]

use clap::{Parser, Subcommand};
use sqlmig::migration::{
    Migrate, MigrationDirection, MigrationEntry, MigrationError, MigrationStatus,
    PendingMigration, RedoReport,
};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sqlmig")]
#[command(about = "Versioned SQL migrations: up, down, redo, rollback, status, create")]
pub struct Cli {
    /// Database URL: a file path, `:memory:` or `sqlite://<path>`
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Migrations directory (overrides the config file)
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Config file (default: config/sqlmig.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Do not print migration log messages
    #[arg(long, global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Apply pending migrations in ascending order
    Up {
        /// How many migrations to execute forward (-1: all)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        steps: i64,

        /// Apply only this version (0: any)
        #[arg(long, default_value_t = 0)]
        version: i64,

        /// Show what would be applied without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Revert applied migrations in descending order
    Down {
        /// How many migrations to execute backward (-1: all)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        steps: i64,

        /// Revert only this version (0: any)
        #[arg(long, default_value_t = 0)]
        version: i64,

        /// Show what would be reverted without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Revert then re-apply migrations
    Redo {
        /// How many migrations to redo (-1: all)
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        steps: i64,

        /// Redo only this version (0: any)
        #[arg(long, default_value_t = 0)]
        version: i64,
    },

    /// Revert the most recent migrations
    Rollback {
        /// How many migrations to roll back (-1: all)
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        steps: i64,

        /// Show what would be rolled back without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show applied versions and pending migrations
    Status,

    /// Generate a new migration file
    Create {
        /// Migration name (e.g. "create_users_table")
        name: String,
    },

    /// List discovered migrations
    List,
}

/// Result of a dispatched command, for printing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(PathBuf),
    Applied(Vec<i64>),
    Reverted(Vec<i64>),
    Redone(RedoReport),
    Status(MigrationStatus),
    Planned {
        direction: MigrationDirection,
        migrations: Vec<PendingMigration>,
    },
    Listed(Vec<MigrationEntry>),
}

impl Cli {
    /// Parse `args` (program name first), returning usage errors instead of exiting
    ///
    /// # Errors
    ///
    /// Returns the `clap::Error` for a missing or unknown command or a bad flag.
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

/// Negative step counts mean "no limit"
pub fn step_limit(steps: i64) -> Option<usize> {
    usize::try_from(steps).ok()
}

/// Version 0 means "not targeting a version"
pub fn version_target(version: i64) -> Option<i64> {
    (version != 0).then_some(version)
}

/// Run `command` against `migrator`
///
/// # Errors
///
/// Returns whatever the migrator returns.
pub fn dispatch(command: &Commands, migrator: &mut dyn Migrate) -> Result<Outcome, MigrationError> {
    match *command {
        Commands::Up {
            steps,
            version,
            dry_run,
        } => {
            let (steps, version) = (step_limit(steps), version_target(version));
            if dry_run {
                Ok(Outcome::Planned {
                    direction: MigrationDirection::Up,
                    migrations: migrator.plan_up(steps, version)?,
                })
            } else {
                migrator.up(steps, version).map(Outcome::Applied)
            }
        }
        Commands::Down {
            steps,
            version,
            dry_run,
        } => {
            let (steps, version) = (step_limit(steps), version_target(version));
            if dry_run {
                Ok(Outcome::Planned {
                    direction: MigrationDirection::Down,
                    migrations: migrator.plan_down(steps, version)?,
                })
            } else {
                migrator.down(steps, version).map(Outcome::Reverted)
            }
        }
        Commands::Redo { steps, version } => migrator
            .redo(step_limit(steps), version_target(version))
            .map(Outcome::Redone),
        Commands::Rollback { steps, dry_run } => {
            if dry_run {
                Ok(Outcome::Planned {
                    direction: MigrationDirection::Down,
                    migrations: migrator.plan_down(step_limit(steps), None)?,
                })
            } else {
                migrator.rollback(step_limit(steps)).map(Outcome::Reverted)
            }
        }
        Commands::Status => migrator.status().map(Outcome::Status),
        Commands::Create { ref name } => migrator.create(name).map(Outcome::Created),
        Commands::List => migrator.list().map(Outcome::Listed),
    }
}
