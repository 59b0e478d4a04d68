//! Splits a migration file into its UP and DOWN sections

use regex::Regex;
use std::io::{self, BufRead};

/// The two SQL bodies found in a migration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub up_sql: String,
    pub down_sql: String,
    pub up_found: bool,
    pub down_found: bool,
}

impl Sections {
    /// Both markers were seen, DOWN after UP
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.up_found && self.down_found
    }
}

/// Scan `reader` line by line and collect the UP and DOWN bodies.
///
/// Marker lines are consumed. Lines before the UP marker are dropped. A line
/// matching both patterns counts as the UP marker while no UP marker has been
/// seen; after that only the DOWN pattern is checked. Lines keep their
/// terminators, so the bodies are the file text verbatim.
///
/// # Errors
///
/// Returns the underlying I/O error for anything other than end-of-stream,
/// including invalid UTF-8.
pub fn parse_sections<R: BufRead>(
    mut reader: R,
    up_marker: &Regex,
    down_marker: &Regex,
) -> io::Result<Sections> {
    let mut sections = Sections::default();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        if !sections.up_found && up_marker.is_match(&line) {
            sections.up_found = true;
            continue;
        }
        if sections.up_found && !sections.down_found && down_marker.is_match(&line) {
            sections.down_found = true;
            continue;
        }

        if sections.down_found {
            sections.down_sql.push_str(&line);
        } else if sections.up_found {
            sections.up_sql.push_str(&line);
        }
    }

    Ok(sections)
}
