//! sqlmig command-line library
//!
//! Argument parsing and command dispatch live here so they can be tested
//! against a fake [`Migrate`](sqlmig::Migrate); the binary (main.rs) only
//! wires up logging, settings and the database.

pub mod cli;
pub mod output;

pub use cli::{dispatch, step_limit, version_target, Cli, Commands, Outcome};
