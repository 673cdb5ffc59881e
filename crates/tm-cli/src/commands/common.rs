//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use tm_core::Direction;
use tm_migrate::{Action, Callback, Migration};

use crate::context::RuntimeContext;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the command has already reported the failure.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load a migration file, resolved against the project directory.
pub(crate) fn load_migration(ctx: &RuntimeContext, file: &str) -> Result<Migration> {
    let path = ctx.resolve_path(file);
    Migration::load(Path::new(&path))
        .with_context(|| format!("Failed to load migration '{}'", file))
}

/// Prints one line per migration event on stderr.
pub(crate) struct ConsoleCallback;

impl Callback for ConsoleCallback {
    fn before_migration(&self, migration: &str, direction: Direction) {
        eprintln!("[verbose] {} {}: starting", migration, direction);
    }

    fn after_migration(&self, migration: &str, direction: Direction) {
        eprintln!("[verbose] {} {}: finished", migration, direction);
    }

    fn before_action(&self, _migration: &str, action: &Action) {
        eprintln!("[verbose]   -> {}", action);
    }

    fn after_action(&self, _migration: &str, action: &Action) {
        eprintln!("[verbose]   ok {}", action);
    }
}
