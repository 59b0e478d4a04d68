//! Migrator - core migration execution engine

use crate::executor::Executor;
use crate::fs::FileSystem;
use crate::logger::{LogFacade, Logger};
use crate::migration::registry::{Registry, SetupState};
use crate::migration::{
    template, Migration, MigrationDirection, MigrationEntry, MigrationError, MigrationStatus,
    MigratorConfig, PendingMigration,
};
use chrono::{DateTime, TimeZone};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Instant;

/// What a `redo` reverted and then re-applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedoReport {
    pub reverted: Vec<i64>,
    pub applied: Vec<i64>,
}

/// Operations exposed to the command line
///
/// `steps: None` means no limit and `version: None` means "not targeting a
/// single version". Methods that run migrations return the versions they ran,
/// in the order they ran.
pub trait Migrate {
    /// Write a new, empty migration file and return its path
    fn create(&mut self, name: &str) -> Result<PathBuf, MigrationError>;

    /// Apply unapplied migrations in ascending version order
    fn up(&mut self, steps: Option<usize>, version: Option<i64>) -> Result<Vec<i64>, MigrationError>;

    /// Revert applied migrations in descending version order
    fn down(&mut self, steps: Option<usize>, version: Option<i64>)
        -> Result<Vec<i64>, MigrationError>;

    /// A full `down` pass followed by a full `up` pass with the same arguments
    fn redo(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<RedoReport, MigrationError> {
        let reverted = self.down(steps, version)?;
        let applied = self.up(steps, version)?;
        Ok(RedoReport { reverted, applied })
    }

    /// Revert the most recent `steps` migrations
    fn rollback(&mut self, steps: Option<usize>) -> Result<Vec<i64>, MigrationError> {
        self.down(steps, None)
    }

    /// Applied versions and pending migrations
    fn status(&mut self) -> Result<MigrationStatus, MigrationError>;

    /// What `up` would run, without running it
    fn plan_up(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<PendingMigration>, MigrationError>;

    /// What `down` would run, without running it
    fn plan_down(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<PendingMigration>, MigrationError>;

    /// Every discovered migration, ascending, with its applied flag
    fn list(&mut self) -> Result<Vec<MigrationEntry>, MigrationError>;
}

/// Core migration execution engine
///
/// Holds borrowed capabilities (database, filesystem) and owns its
/// configuration, logger and migration registry. The registry is filled on
/// the first operation that needs it. Applied state is never cached: every
/// "is this applied?" check reads the version table again.
///
/// # Example
///
/// ```rust,no_run
/// use sqlmig::migration::{Migrate, Migrator, MigratorConfig};
/// use sqlmig::{OsFileSystem, SqliteExecutor};
///
/// let db = SqliteExecutor::open("app.db")?;
/// let fs = OsFileSystem::current_dir();
/// let mut migrator = Migrator::new(&db, &fs, MigratorConfig::default());
/// let applied = migrator.up(None, None)?;
/// println!("applied {applied:?}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Migrator<'a> {
    executor: &'a dyn Executor,
    fs: &'a dyn FileSystem,
    config: MigratorConfig,
    logger: Box<dyn Logger + 'a>,
    registry: Registry,
}

impl<'a> Migrator<'a> {
    pub fn new(executor: &'a dyn Executor, fs: &'a dyn FileSystem, config: MigratorConfig) -> Self {
        Self {
            executor,
            fs,
            config,
            logger: Box::new(LogFacade),
            registry: Registry::new(),
        }
    }

    /// Replace the default [`LogFacade`] logger
    #[must_use]
    pub fn with_logger(mut self, logger: impl Logger + 'a) -> Self {
        self.logger = Box::new(logger);
        self
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    pub fn setup_state(&self) -> SetupState {
        self.registry.state()
    }

    /// Discovered migrations, in discovery order, running setup if needed
    ///
    /// # Errors
    ///
    /// Returns setup errors (`Setup`, `Directory`).
    pub fn migrations(&mut self) -> Result<&[Migration], MigrationError> {
        self.setup()?;
        Ok(self.registry.migrations())
    }

    /// [`Migrate::create`] with an explicit creation time
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for a bad name and `Create` when the directory or
    /// file cannot be written, including when the file already exists.
    pub fn create_at<Tz: TimeZone>(
        &mut self,
        name: &str,
        now: &DateTime<Tz>,
    ) -> Result<PathBuf, MigrationError>
    where
        Tz::Offset: Display,
    {
        let file_name = template::file_name(name, now)?;
        let dir = self.config.dirname();

        self.fs
            .create_dir_all(dir)
            .map_err(|source| MigrationError::Create {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = dir.join(file_name);
        let contents = template::render(
            name,
            now,
            self.config.template_up(),
            self.config.template_down(),
        );
        self.fs
            .write_new(&path, &contents)
            .map_err(|source| MigrationError::Create {
                path: path.clone(),
                source,
            })?;

        self.logger.info(format_args!("Created {}", path.display()));
        Ok(path)
    }

    fn setup(&mut self) -> Result<(), MigrationError> {
        self.registry.ensure_ready(
            self.executor,
            self.fs,
            &self.config,
            self.logger.as_ref(),
        )
    }

    /// Registry sorted for `direction`; ties keep discovery order
    fn ordered(&self, direction: MigrationDirection) -> Vec<&Migration> {
        let mut ordered: Vec<&Migration> = self.registry.migrations().iter().collect();
        match direction {
            MigrationDirection::Up => ordered.sort_by(|a, b| a.version.cmp(&b.version)),
            MigrationDirection::Down => ordered.sort_by(|a, b| b.version.cmp(&a.version)),
        }
        ordered
    }

    fn find(&self, version: i64) -> Option<&Migration> {
        self.registry.migrations().iter().find(|m| m.version == version)
    }

    /// Whether `direction` would change anything for `version` right now
    fn eligible(&self, direction: MigrationDirection, version: i64) -> Result<bool, MigrationError> {
        let applied = self
            .config
            .version_table()
            .is_applied(self.executor, version)?;
        Ok(match direction {
            MigrationDirection::Up => !applied,
            MigrationDirection::Down => applied,
        })
    }

    fn run(
        &mut self,
        direction: MigrationDirection,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<i64>, MigrationError> {
        self.setup()?;
        let mut done = Vec::new();

        if let Some(version) = version {
            match self.find(version) {
                Some(m) if self.eligible(direction, m.version)? => {
                    self.execute(m, direction)?;
                    done.push(m.version);
                }
                Some(_) => self.logger.debug(format_args!(
                    "migration {version} needs no {direction}, nothing to do"
                )),
                None => self
                    .logger
                    .debug(format_args!("no migration with version {version}")),
            }
            return Ok(done);
        }

        for m in self.ordered(direction) {
            if steps.is_some_and(|limit| done.len() >= limit) {
                break;
            }
            if self.eligible(direction, m.version)? {
                self.execute(m, direction)?;
                done.push(m.version);
            }
        }
        Ok(done)
    }

    /// Run one migration's SQL and update the version table
    fn execute(&self, m: &Migration, direction: MigrationDirection) -> Result<(), MigrationError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "sqlmig.migration",
            version = m.version,
            direction = %direction
        )
        .entered();

        let start = Instant::now();
        let sql = match direction {
            MigrationDirection::Up => &m.up_sql,
            MigrationDirection::Down => &m.down_sql,
        };
        let outcome = self
            .executor
            .execute(sql, &[])
            .map_err(|source| MigrationError::ExecutionFailed {
                version: m.version,
                direction,
                source,
            })?;
        self.logger.info(format_args!(
            "{} completed {} {} ({} ms)",
            match direction {
                MigrationDirection::Up => "Up",
                MigrationDirection::Down => "Down",
            },
            m.version,
            outcome.last_insert_id(),
            start.elapsed().as_millis()
        ));

        let table = self.config.version_table();
        let tracked = match direction {
            MigrationDirection::Up => table.record(self.executor, m.version)?,
            MigrationDirection::Down => table.remove(self.executor, m.version)?,
        };
        self.logger.debug(format_args!(
            "version table updated {}, {} row(s)",
            tracked.last_insert_id(),
            tracked.rows_affected()
        ));
        Ok(())
    }

    /// Same selection as [`run`](Self::run) against one snapshot of the
    /// version table, executing nothing
    fn plan(
        &mut self,
        direction: MigrationDirection,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<PendingMigration>, MigrationError> {
        self.setup()?;
        let applied: HashSet<i64> = self
            .config
            .version_table()
            .applied_versions(self.executor)?
            .into_iter()
            .collect();
        let wanted = |v: i64| match direction {
            MigrationDirection::Up => !applied.contains(&v),
            MigrationDirection::Down => applied.contains(&v),
        };

        if let Some(version) = version {
            return Ok(self
                .find(version)
                .filter(|m| wanted(m.version))
                .map(PendingMigration::from)
                .into_iter()
                .collect());
        }

        let mut seen = HashSet::new();
        let mut planned = Vec::new();
        for m in self.ordered(direction) {
            if steps.is_some_and(|limit| planned.len() >= limit) {
                break;
            }
            // a duplicate version flips state when its twin runs first
            if wanted(m.version) != seen.contains(&m.version) {
                seen.insert(m.version);
                planned.push(PendingMigration::from(m));
            }
        }
        Ok(planned)
    }
}

impl Migrate for Migrator<'_> {
    fn create(&mut self, name: &str) -> Result<PathBuf, MigrationError> {
        self.create_at(name, &template::now())
    }

    fn up(&mut self, steps: Option<usize>, version: Option<i64>) -> Result<Vec<i64>, MigrationError> {
        self.run(MigrationDirection::Up, steps, version)
    }

    fn down(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<i64>, MigrationError> {
        self.run(MigrationDirection::Down, steps, version)
    }

    fn status(&mut self) -> Result<MigrationStatus, MigrationError> {
        self.logger.info(format_args!("STATUS"));
        self.setup()?;

        let applied = self.config.version_table().applied_versions(self.executor)?;
        for v in &applied {
            self.logger.info(format_args!("Migration completed {v}"));
        }

        let applied_set: HashSet<i64> = applied.iter().copied().collect();
        let mut listed = HashSet::new();
        let pending: Vec<PendingMigration> = self
            .ordered(MigrationDirection::Up)
            .into_iter()
            .filter(|m| !applied_set.contains(&m.version) && listed.insert(m.version))
            .map(PendingMigration::from)
            .collect();
        for p in &pending {
            self.logger.info(format_args!("Pending {} {}", p.version, p.name));
        }

        Ok(MigrationStatus::new(applied, pending))
    }

    fn plan_up(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<PendingMigration>, MigrationError> {
        self.plan(MigrationDirection::Up, steps, version)
    }

    fn plan_down(
        &mut self,
        steps: Option<usize>,
        version: Option<i64>,
    ) -> Result<Vec<PendingMigration>, MigrationError> {
        self.plan(MigrationDirection::Down, steps, version)
    }

    fn list(&mut self) -> Result<Vec<MigrationEntry>, MigrationError> {
        self.setup()?;
        let applied: HashSet<i64> = self
            .config
            .version_table()
            .applied_versions(self.executor)?
            .into_iter()
            .collect();
        Ok(self
            .ordered(MigrationDirection::Up)
            .into_iter()
            .map(|m| MigrationEntry {
                version: m.version,
                name: m.name.clone(),
                file_name: m.meta.name.clone(),
                applied: applied.contains(&m.version),
            })
            .collect())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::executor::{ExecError, ExecOutcome, Value};
    use crate::fs::MemoryFileSystem;
    use crate::logger::tests::Capture;
    use crate::logger::Silent;
    use crate::sqlite::SqliteExecutor;
    use crate::test_helpers::{
        count_rows, memory_fs, scenario_fs, table_exists, table_names, MIG1, MIG2, MIG4, VERSIONS,
    };
    use chrono::Utc;
    use log::Level;
    use std::cell::Cell;
    use std::path::Path;

    fn migrator<'a>(db: &'a SqliteExecutor, fs: &'a MemoryFileSystem) -> Migrator<'a> {
        Migrator::new(db, fs, MigratorConfig::default()).with_logger(Silent)
    }

    fn applied(db: &SqliteExecutor) -> Vec<i64> {
        MigratorConfig::default()
            .version_table()
            .applied_versions(db)
            .unwrap()
    }

    #[test]
    fn test_up_then_down_single_migration() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[MIG1]);
        let mut m = migrator(&db, &fs);

        assert_eq!(m.up(None, None).unwrap(), vec![1111110001]);
        assert!(table_exists(&db, "foo").unwrap());
        assert!(table_exists(&db, "shmig_version").unwrap());

        assert_eq!(m.down(None, None).unwrap(), vec![1111110001]);
        assert!(!table_exists(&db, "foo").unwrap());
        assert!(applied(&db).is_empty());
    }

    #[test]
    fn test_up_all_scenario() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);

        assert_eq!(m.up(None, None).unwrap(), VERSIONS.to_vec());
        assert_eq!(
            table_names(&db).unwrap(),
            vec!["baz", "bux", "foo", "shmig_version"]
        );
        assert_eq!(applied(&db), VERSIONS.to_vec());

        let reverted = m.down(None, None).unwrap();
        assert_eq!(reverted, vec![1111110004, 1111110003, 1111110002, 1111110001]);
        assert_eq!(table_names(&db).unwrap(), vec!["shmig_version"]);
        assert_eq!(count_rows(&db, "shmig_version").unwrap(), 0);
    }

    #[test]
    fn test_up_targeted_version_from_clean() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);

        assert_eq!(m.up(None, Some(1111110004)).unwrap(), vec![1111110004]);
        assert_eq!(table_names(&db).unwrap(), vec!["bux", "shmig_version"]);
        assert_eq!(applied(&db), vec![1111110004]);

        // already applied, and unknown versions, are no-ops
        assert!(m.up(None, Some(1111110004)).unwrap().is_empty());
        assert!(m.up(None, Some(42)).unwrap().is_empty());
    }

    #[test]
    fn test_up_with_steps() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);

        assert_eq!(m.up(Some(2), None).unwrap(), vec![1111110001, 1111110002]);
        assert_eq!(table_names(&db).unwrap(), vec!["bar", "foo", "shmig_version"]);

        assert!(m.up(Some(0), None).unwrap().is_empty());
        assert_eq!(m.up(Some(10), None).unwrap(), vec![1111110003, 1111110004]);
        assert!(m.up(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_down_with_steps_and_version() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(None, None).unwrap();

        assert_eq!(m.down(Some(1), None).unwrap(), vec![1111110004]);
        assert!(!table_exists(&db, "bux").unwrap());

        // not applied any more
        assert!(m.down(None, Some(1111110004)).unwrap().is_empty());

        assert_eq!(m.down(None, Some(1111110001)).unwrap(), vec![1111110001]);
        assert_eq!(applied(&db), vec![1111110002, 1111110003]);
    }

    #[test]
    fn test_down_all_then_up_two() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(None, Some(1111110004)).unwrap();

        m.down(None, None).unwrap();
        m.up(Some(2), None).unwrap();
        assert_eq!(table_names(&db).unwrap(), vec!["bar", "foo", "shmig_version"]);
    }

    #[test]
    fn test_rollback_defaults_to_latest() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(None, None).unwrap();

        assert_eq!(m.rollback(Some(1)).unwrap(), vec![1111110004]);
        assert_eq!(m.rollback(Some(2)).unwrap(), vec![1111110003, 1111110002]);
        assert_eq!(applied(&db), vec![1111110001]);
    }

    #[test]
    fn test_redo_reverts_then_reapplies() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(None, None).unwrap();

        let report = m.redo(Some(1), None).unwrap();
        assert_eq!(
            report,
            RedoReport {
                reverted: vec![1111110004],
                applied: vec![1111110004],
            }
        );
        assert!(table_exists(&db, "bux").unwrap());

        let report = m.redo(None, Some(1111110001)).unwrap();
        assert_eq!(report.reverted, vec![1111110001]);
        assert_eq!(report.applied, vec![1111110001]);
        assert_eq!(applied(&db), VERSIONS.to_vec());
    }

    #[test]
    fn test_status_partitions_versions() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(Some(2), None).unwrap();
        // a version recorded by some other tool, with no file
        db.execute("INSERT INTO shmig_version (version) VALUES (7)", &[])
            .unwrap();

        let status = m.status().unwrap();
        assert_eq!(status.applied, vec![7, 1111110001, 1111110002]);
        let pending: Vec<i64> = status.pending.iter().map(|p| p.version).collect();
        assert_eq!(pending, vec![1111110003, 1111110004]);
        assert_eq!(status.pending[0].name, "mig3");
        assert_eq!(status.total, 5);
        assert!(!status.is_up_to_date());
    }

    #[test]
    fn test_status_logs_completed_and_pending() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[MIG1, MIG2]);
        let capture = Capture::default();
        let mut m = Migrator::new(&db, &fs, MigratorConfig::default()).with_logger(capture.clone());
        m.up(Some(1), None).unwrap();
        m.status().unwrap();

        let info = capture.messages(Level::Info);
        assert!(info.iter().any(|l| l.starts_with("Up completed 1111110001")));
        assert!(info.contains(&"Migration completed 1111110001".to_string()));
        assert!(info.contains(&"Pending 1111110002 mig2".to_string()));
    }

    #[test]
    fn test_version_table_updates_are_logged() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[MIG1]);
        let capture = Capture::default();
        let mut m = Migrator::new(&db, &fs, MigratorConfig::default()).with_logger(capture.clone());
        m.up(None, None).unwrap();
        m.down(None, None).unwrap();

        let updates: Vec<_> = capture
            .messages(Level::Debug)
            .into_iter()
            .filter(|l| l.starts_with("version table updated"))
            .collect();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|l| l.ends_with(", 1 row(s)")));
    }

    #[test]
    fn test_applied_state_is_read_fresh() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[MIG1, MIG2]);
        let mut m = migrator(&db, &fs);
        m.up(Some(1), None).unwrap();

        // something else marks mig2 applied behind the migrator's back
        db.execute("INSERT INTO shmig_version (version) VALUES (1111110002)", &[])
            .unwrap();
        assert!(m.up(None, None).unwrap().is_empty());
        assert!(!table_exists(&db, "bar").unwrap());
    }

    /// Counts version-table reads
    struct Counting<'a> {
        inner: &'a SqliteExecutor,
        reads: Cell<usize>,
    }

    impl Executor for Counting<'_> {
        fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ExecError> {
            self.inner.execute(sql, params)
        }

        fn query_versions(&self, sql: &str, params: &[Value]) -> Result<Vec<i64>, ExecError> {
            self.reads.set(self.reads.get() + 1);
            self.inner.query_versions(sql, params)
        }
    }

    #[test]
    fn test_each_check_queries_the_table() {
        let db = SqliteExecutor::in_memory().unwrap();
        let counting = Counting {
            inner: &db,
            reads: Cell::new(0),
        };
        let fs = scenario_fs();
        let mut m = Migrator::new(&counting, &fs, MigratorConfig::default()).with_logger(Silent);

        m.up(None, None).unwrap();
        assert_eq!(counting.reads.get(), 4);
    }

    #[test]
    fn test_failed_migration_stops_the_batch() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[
            MIG1,
            ("1111110002-broken", "-- UP\nbleep blorp;\n-- DOWN\n"),
            MIG4,
        ]);
        let mut m = migrator(&db, &fs);

        let err = m.up(None, None).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::ExecutionFailed {
                version: 1111110002,
                direction: MigrationDirection::Up,
                ..
            }
        ));
        // earlier effects stay, later migrations never ran
        assert_eq!(applied(&db), vec![1111110001]);
        assert!(table_exists(&db, "foo").unwrap());
        assert!(!table_exists(&db, "bux").unwrap());
    }

    #[test]
    fn test_tracking_failure_is_reported() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[("5-sabotage", "-- UP\ndrop table shmig_version;\n-- DOWN\n")]);
        let mut m = migrator(&db, &fs);

        let err = m.up(None, None).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Tracking {
                version: 5,
                direction: MigrationDirection::Up,
                ..
            }
        ));
    }

    #[test]
    fn test_setup_failure_then_recovery() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = MemoryFileSystem::new();
        let mut m = migrator(&db, &fs);

        assert!(matches!(
            m.up(None, None).unwrap_err(),
            MigrationError::Directory { .. }
        ));
        assert_eq!(m.setup_state(), SetupState::Uninitialized);

        fs.insert("migrations/1111110001-mig1", MIG1.1);
        assert_eq!(m.up(None, None).unwrap(), vec![1111110001]);
        assert_eq!(m.setup_state(), SetupState::Ready);
    }

    #[test]
    fn test_empty_directory_is_ready() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[]);
        let mut m = migrator(&db, &fs);

        assert!(m.up(None, None).unwrap().is_empty());
        assert_eq!(m.setup_state(), SetupState::Ready);
        assert!(m.migrations().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_versions_run_in_discovery_order() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = memory_fs(&[
            ("3-a", "-- UP\ncreate table a (id integer);\n-- DOWN\ndrop table a;\n"),
            ("3-b", "-- UP\ncreate table b (id integer);\n-- DOWN\ndrop table b;\n"),
        ]);
        let mut m = migrator(&db, &fs);

        assert_eq!(m.plan_up(None, None).unwrap().len(), 1);
        assert_eq!(m.up(None, None).unwrap(), vec![3]);
        assert!(table_exists(&db, "a").unwrap());
        assert!(!table_exists(&db, "b").unwrap());
    }

    #[test]
    fn test_plan_matches_run_without_executing() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(Some(1), None).unwrap();

        let planned: Vec<i64> = m.plan_up(Some(2), None).unwrap().iter().map(|p| p.version).collect();
        assert_eq!(planned, vec![1111110002, 1111110003]);
        let planned: Vec<i64> = m.plan_down(None, None).unwrap().iter().map(|p| p.version).collect();
        assert_eq!(planned, vec![1111110001]);
        assert!(m.plan_up(None, Some(1111110001)).unwrap().is_empty());
        assert_eq!(m.plan_up(None, Some(1111110004)).unwrap()[0].name, "mig4");

        assert_eq!(applied(&db), vec![1111110001]);
        assert!(!table_exists(&db, "bar").unwrap());
    }

    #[test]
    fn test_list_marks_applied() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = scenario_fs();
        let mut m = migrator(&db, &fs);
        m.up(Some(1), None).unwrap();

        let entries = m.list().unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries[0].applied);
        assert_eq!(entries[0].file_name, "1111110001-mig1");
        assert!(entries[1..].iter().all(|e| !e.applied));
    }

    #[test]
    fn test_create_writes_template() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = MemoryFileSystem::new();
        let mut m = migrator(&db, &fs);

        let path = m.create("new_table").unwrap();
        assert_eq!(path.parent(), Some(Path::new("migrations")));
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.ends_with("-new_table.sql"));

        let contents = fs.contents(&path).unwrap();
        assert!(contents.starts_with("-- Migration:  new_table\n-- Created at: "));
        assert!(contents.contains("-- ==== UP ====\n\nPRAGMA foreign_keys = ON;"));
        assert!(contents.ends_with("PRAGMA foreign_keys = OFF;\n\nBEGIN;\nCOMMIT;"));

        // the generated file is itself a valid migration
        assert_eq!(m.migrations().unwrap().len(), 1);
        assert_eq!(m.migrations().unwrap()[0].name, "new_table");
    }

    #[test]
    fn test_create_rejects_bad_names_and_existing_files() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = MemoryFileSystem::new();
        let mut m = migrator(&db, &fs);

        assert!(matches!(m.create(""), Err(MigrationError::InvalidName(_))));
        assert!(matches!(m.create("a/b"), Err(MigrationError::InvalidName(_))));

        let now = Utc.with_ymd_and_hms(2021, 1, 8, 1, 26, 0).unwrap();
        let taken = Path::new("migrations/1610069160-dup.sql");
        fs.insert(taken, "keep me");
        let err = m.create_at("dup", &now).unwrap_err();
        assert!(matches!(err, MigrationError::Create { ref path, .. } if path == taken));
        assert_eq!(fs.contents(taken).as_deref(), Some("keep me"));

        let path = m.create_at("other", &now).unwrap();
        assert_eq!(path, Path::new("migrations/1610069160-other.sql"));
        assert!(fs
            .contents(&path)
            .unwrap()
            .contains("-- Created at: 2021-01-08 01:26:00"));
    }

    #[test]
    fn test_migrations_at_filesystem_root() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = MemoryFileSystem::new()
            .with_file(MIG1.0, MIG1.1)
            .with_file(MIG2.0, MIG2.1)
            .with_file("README.md", "not a migration");
        let config = MigratorConfig::default().with_dir(".");
        let mut m = Migrator::new(&db, &fs, config).with_logger(Silent);

        assert_eq!(m.up(None, None).unwrap(), vec![1111110001, 1111110002]);
        assert!(table_exists(&db, "foo").unwrap());
        assert!(table_exists(&db, "bar").unwrap());
        assert_eq!(m.down(Some(1), None).unwrap(), vec![1111110002]);

        let path = m.create("at_root").unwrap();
        assert_eq!(path.parent(), Some(Path::new(".")));
        assert!(fs.contents(&path).is_some());
    }

    #[test]
    fn test_custom_table_and_markers() {
        let db = SqliteExecutor::in_memory().unwrap();
        let fs = MemoryFileSystem::new().with_file(
            "db/1-init.sql",
            "-- +migrate Up\ncreate table t (id integer);\n-- +migrate Down\ndrop table t;\n",
        );
        let config = MigratorConfig::default()
            .with_dir("db")
            .with_table("migs", "v")
            .unwrap()
            .with_markers(r"^-- \+migrate Up", r"^-- \+migrate Down")
            .unwrap();
        let mut m = Migrator::new(&db, &fs, config).with_logger(Silent);

        assert_eq!(m.up(None, None).unwrap(), vec![1]);
        assert!(table_exists(&db, "migs").unwrap());
        assert!(table_exists(&db, "t").unwrap());
        assert_eq!(count_rows(&db, "migs").unwrap(), 1);
    }
}
