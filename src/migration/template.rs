//! Scaffolding for new migration files

use crate::migration::MigrationError;
use chrono::{DateTime, Local, TimeZone};

/// `<unix_seconds>-<name>.sql`
///
/// # Errors
///
/// Returns `MigrationError::InvalidName` for an empty name or one containing a
/// path separator.
pub fn file_name<Tz: TimeZone>(name: &str, now: &DateTime<Tz>) -> Result<String, MigrationError> {
    validate_name(name)?;
    Ok(format!("{}-{}.sql", now.timestamp(), name))
}

/// Body of a new migration file, trimmed
pub fn render<Tz: TimeZone>(
    name: &str,
    now: &DateTime<Tz>,
    template_up: &str,
    template_down: &str,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let text = format!(
        "\n-- Migration:  {}\n-- Created at: {}\n-- ==== UP ====\n\n{}\n\n-- ==== DOWN ====\n\n{}\n",
        name,
        now.format("%Y-%m-%d %H:%M:%S"),
        template_up.trim(),
        template_down.trim(),
    );
    text.trim().to_string()
}

/// Current local time, which is what `Created at:` shows
pub fn now() -> DateTime<Local> {
    Local::now()
}

fn validate_name(name: &str) -> Result<(), MigrationError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(MigrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{DEFAULT_TEMPLATE_DOWN, DEFAULT_TEMPLATE_UP};
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 8, 1, 26, 0).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("new_table", &fixed_time()).unwrap(),
            "1610069160-new_table.sql"
        );
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "a/b", "..\\up"] {
            assert!(matches!(
                file_name(bad, &fixed_time()),
                Err(MigrationError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_render_default_templates() {
        let text = render("new_table", &fixed_time(), DEFAULT_TEMPLATE_UP, DEFAULT_TEMPLATE_DOWN);
        let expected = "-- Migration:  new_table\n\
-- Created at: 2021-01-08 01:26:00\n\
-- ==== UP ====\n\
\n\
PRAGMA foreign_keys = ON;\n\
\n\
BEGIN;\n\
COMMIT;\n\
\n\
-- ==== DOWN ====\n\
\n\
PRAGMA foreign_keys = OFF;\n\
\n\
BEGIN;\n\
COMMIT;";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_templates() {
        let text = render("x", &fixed_time(), "  ", "");
        assert!(text.starts_with("-- Migration:  x"));
        assert!(text.ends_with("-- ==== DOWN ===="));
    }
}
