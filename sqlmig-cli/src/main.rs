//! sqlmig - command-line migration tool
//!
//! Applies and reverts versioned SQL migrations against a SQLite database.
//! Settings come from flags, then the environment (`.env` included), then
//! `config/sqlmig.toml`.

use anyhow::Context;
use colored::Colorize;
use sqlmig::config::{Settings, DEFAULT_CONFIG_FILE};
use sqlmig::{Migrator, MigratorConfig, OsFileSystem, Silent, SqliteExecutor};
use sqlmig_cli::{dispatch, output, Cli};
use std::path::Path;
use std::process;

fn main() {
    dotenv::dotenv().ok();

    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    init_logging(&cli);

    match run(&cli) {
        Ok(text) => {
            if !cli.quiet {
                print!("{text}");
                println!("{}", "✅ Success".green());
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.quiet || cli.silent {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config_path = cli
        .config
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let settings = Settings::load_from(config_path).context("loading settings")?;

    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| settings.database.url.clone());

    let mut migration_settings = settings.migrations.clone();
    if let Some(dir) = &cli.migrations_dir {
        migration_settings.dir = dir.clone();
    }
    let config = MigratorConfig::from_settings(&migration_settings)?;

    log::debug!(
        "database {}, migrations in {}",
        database_url,
        config.dirname().display()
    );
    let db = SqliteExecutor::open(&database_url)
        .with_context(|| format!("opening database {database_url}"))?;
    let fs = OsFileSystem::current_dir();

    let mut migrator = Migrator::new(&db, &fs, config);
    if cli.silent {
        migrator = migrator.with_logger(Silent);
    }

    let outcome = dispatch(&cli.command, &mut migrator)?;
    Ok(output::render(&outcome))
}
