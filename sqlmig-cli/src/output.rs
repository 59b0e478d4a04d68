//! Human-readable rendering of command outcomes

use crate::cli::Outcome;
use chrono::Local;
use colored::Colorize;
use sqlmig::migration::{MigrationDirection, MigrationStatus, PendingMigration};
use std::fmt::Write as _;

/// Render `outcome` for the terminal
pub fn render(outcome: &Outcome) -> String {
    let mut out = String::new();
    match outcome {
        Outcome::Created(path) => {
            let _ = writeln!(out, "📝 Created {}", path.display().to_string().bold());
        }
        Outcome::Applied(versions) => render_versions(&mut out, "applied", versions),
        Outcome::Reverted(versions) => render_versions(&mut out, "rolled back", versions),
        Outcome::Redone(report) => {
            render_versions(&mut out, "rolled back", &report.reverted);
            render_versions(&mut out, "applied", &report.applied);
        }
        Outcome::Status(status) => render_status(&mut out, status),
        Outcome::Planned {
            direction,
            migrations,
        } => render_plan(&mut out, *direction, migrations),
        Outcome::Listed(entries) => {
            if entries.is_empty() {
                let _ = writeln!(out, "No migrations found");
            }
            for entry in entries {
                let mark = if entry.applied {
                    "✓".green()
                } else {
                    "⏳".yellow()
                };
                let _ = writeln!(out, "  {} {}", mark, entry.file_name);
            }
        }
    }
    out
}

fn render_versions(out: &mut String, verb: &str, versions: &[i64]) {
    if versions.is_empty() {
        let _ = writeln!(out, "✅ No migrations {verb}");
        return;
    }
    let _ = writeln!(out, "✅ Successfully {} {} migration(s)", verb, versions.len());
    for v in versions {
        let _ = writeln!(out, "  ✓ {v}");
    }
}

fn render_status(out: &mut String, status: &MigrationStatus) {
    let _ = writeln!(out, "\n📊 Migration Status\n");

    if status.applied.is_empty() {
        let _ = writeln!(out, "✅ Applied Migrations: None");
    } else {
        let _ = writeln!(out, "✅ Applied Migrations ({}):", status.applied_count);
        for v in &status.applied {
            let _ = writeln!(out, "  ✓ {}", v.to_string().green());
        }
    }

    let _ = writeln!(out);

    if status.pending.is_empty() {
        let _ = writeln!(out, "⏳ Pending Migrations: None");
    } else {
        let _ = writeln!(out, "⏳ Pending Migrations ({}):", status.pending_count);
        for pending in &status.pending {
            let _ = writeln!(out, "  ⏳ {}", describe(pending).yellow());
        }
    }

    let _ = writeln!(
        out,
        "\n📈 Summary: {} applied, {} pending",
        status.applied_count, status.pending_count
    );
}

fn render_plan(out: &mut String, direction: MigrationDirection, migrations: &[PendingMigration]) {
    let verb = match direction {
        MigrationDirection::Up => "apply",
        MigrationDirection::Down => "roll back",
    };
    if migrations.is_empty() {
        let _ = writeln!(out, "Nothing to {verb}");
        return;
    }
    let _ = writeln!(out, "Would {} {} migration(s):", verb, migrations.len());
    for (i, m) in migrations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, describe(m));
    }
}

/// `1610069160 create_users (2021-01-08 01:26:00)`
fn describe(m: &PendingMigration) -> String {
    match m.created_at {
        Some(at) => format!(
            "{} {} ({})",
            m.version,
            m.name,
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        None => format!("{} {}", m.version, m.name),
    }
}
