//! Shared fixtures for engine tests
//!
//! Four migrations that build on each other: `mig3` drops the `bar` table
//! created by `mig2`, so applying everything leaves `foo`, `baz` and `bux`.

use crate::fs::{FileSystem, MemoryFileSystem};
use crate::sqlite::SqliteExecutor;
use rusqlite::OptionalExtension;
use std::path::Path;

pub const MIGRATIONS_DIR: &str = "migrations";

pub const MIG1: (&str, &str) = (
    "1111110001-mig1",
    "
-- ==== UP ====
create table foo (id integer primary key);
-- ==== DOWN ====
drop table foo;
",
);

pub const MIG2: (&str, &str) = (
    "1111110002-mig2",
    "
-- ==== UP ====
create table bar (id integer primary key);
-- ==== DOWN ====
drop table bar;
",
);

pub const MIG3: (&str, &str) = (
    "1111110003-mig3",
    "
-- ==== UP ====
drop table bar;
create table baz (id integer primary key);
-- ==== DOWN ====
create table bar (id integer primary key);
drop table baz;
",
);

pub const MIG4: (&str, &str) = (
    "1111110004-mig4",
    "
-- ==== UP ====
create table bux (id integer primary key);
-- ==== DOWN ====
drop table bux;
",
);

pub const ALL: [(&str, &str); 4] = [MIG1, MIG2, MIG3, MIG4];

pub const VERSIONS: [i64; 4] = [1111110001, 1111110002, 1111110003, 1111110004];

/// In-memory filesystem holding `files` under `migrations/`
pub fn memory_fs(files: &[(&str, &str)]) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.create_dir_all(Path::new(MIGRATIONS_DIR))
        .expect("fresh in-memory filesystem has no files");
    for (name, contents) in files {
        fs.insert(Path::new(MIGRATIONS_DIR).join(name), *contents);
    }
    fs
}

/// All four scenario migrations, in memory
pub fn scenario_fs() -> MemoryFileSystem {
    memory_fs(&ALL)
}

/// Write `files` into `dir` on disk
pub fn write_files(dir: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents)?;
    }
    Ok(())
}

/// Names of every table, sorted
pub fn table_names(db: &SqliteExecutor) -> rusqlite::Result<Vec<String>> {
    let mut stmt = db
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn table_exists(db: &SqliteExecutor, name: &str) -> rusqlite::Result<bool> {
    let found: Option<String> = db
        .connection()
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn count_rows(db: &SqliteExecutor, table: &str) -> rusqlite::Result<i64> {
    db.connection()
        .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
}
