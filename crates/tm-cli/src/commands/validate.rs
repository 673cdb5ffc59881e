//! Validate command implementation

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tm_core::{Direction, MigrationFile, Operation, OperationType};
use tm_migrate::plan;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Validation result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
struct ValidationIssue {
    severity: Severity,
    message: String,
    file: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.severity, self.message, self.file)
    }
}

/// Execute the validate command
pub fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let files = migration_files(&ctx, &args.files)?;
    if files.is_empty() {
        println!("No migration files found");
        return Ok(());
    }

    let mut issues = Vec::new();
    let mut loaded = Vec::new();
    for path in &files {
        let file = path.display().to_string();
        match MigrationFile::load(path) {
            Ok(migration) => {
                validate_migration(&migration, &file, &mut issues);
                loaded.push((migration, file));
            }
            Err(e) => issues.push(ValidationIssue {
                severity: Severity::Error,
                message: e.to_string(),
                file,
            }),
        }
    }
    validate_dependencies(&loaded, &mut issues);

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;

    if !issues.is_empty() {
        println!();
        for issue in &issues {
            println!("{}", issue);
        }
    }
    println!(
        "\n{} file(s) checked: {} error(s), {} warning(s)",
        files.len(),
        errors,
        warnings
    );

    if errors > 0 {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Explicit files, or every migration under `<project>/migrations`.
fn migration_files(ctx: &RuntimeContext, files: &[String]) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files.iter().map(|f| ctx.resolve_path(f).into()).collect());
    }

    let mut found = Vec::new();
    for extension in ["yml", "yaml"] {
        let pattern = ctx
            .project_dir
            .join("migrations")
            .join(format!("*.{}", extension));
        let pattern = pattern.display().to_string();
        for entry in glob::glob(&pattern).context("Invalid migration glob pattern")? {
            found.push(entry.context("Failed to read migrations directory")?);
        }
    }
    found.sort();
    Ok(found)
}

/// Print each direction's execution plan, recording issues.
fn validate_migration(migration: &MigrationFile, file: &str, issues: &mut Vec<ValidationIssue>) {
    println!("{}", migration.name);
    for direction in [Direction::Up, Direction::Down] {
        let operations = migration.spec.operations(direction);
        if operations.is_empty() {
            println!("  {}: (empty)", direction);
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                message: format!("'{}' has no {} operations", migration.name, direction),
                file: file.to_string(),
            });
            continue;
        }

        match plan(operations) {
            Ok(steps) => {
                let summary: Vec<String> = steps
                    .iter()
                    .map(|(op, parsed)| describe_step(*op, parsed))
                    .collect();
                println!("  {}: {}", direction, summary.join(", "));
            }
            Err(e) => {
                println!("  {}: invalid", direction);
                issues.push(ValidationIssue {
                    severity: Severity::Error,
                    message: format!("{} ({})", e, direction),
                    file: file.to_string(),
                });
            }
        }
    }
}

fn describe_step(op: OperationType, parsed: &Operation) -> String {
    let tables = match parsed {
        Operation::CreateTable(tables) => tables.len(),
        Operation::DropTable(tables) => tables.len(),
        Operation::RenameTable(renames) => renames.len(),
        Operation::Alter { tables, .. } => tables.len(),
    };
    format!("{} ({} table{})", op, tables, if tables == 1 { "" } else { "s" })
}

/// Dependencies must name another migration in the validated set.
fn validate_dependencies(loaded: &[(MigrationFile, String)], issues: &mut Vec<ValidationIssue>) {
    let known: HashSet<&str> = loaded.iter().map(|(m, _)| m.name.as_str()).collect();
    for (migration, file) in loaded {
        for dependency in &migration.spec.dependencies {
            if !known.contains(dependency.as_str()) {
                issues.push(ValidationIssue {
                    severity: Severity::Warning,
                    message: format!(
                        "'{}' depends on '{}', which was not validated",
                        migration.name, dependency
                    ),
                    file: file.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
