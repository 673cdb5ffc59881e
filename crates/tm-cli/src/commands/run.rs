//! Run command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tm_db::DuckDbSchemaBuilder;
use tm_migrate::{MigrationOptions, Migrator, RunPhase, RunReport, RunState};

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{self, ConsoleCallback, ExitCode};
use crate::context::RuntimeContext;

/// JSON shape printed when a run fails
#[derive(Debug, Serialize)]
struct RunFailure<'a> {
    migration: &'a str,
    direction: &'a str,
    success: bool,
    state: RunState,
    phase: Option<RunPhase>,
    error: String,
    failed_at: DateTime<Utc>,
}

/// Execute the run command
pub fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let migration = common::load_migration(&ctx, &args.file)?;
    let json_mode = args.output == OutputFormat::Json;

    let options = resolve_options(&ctx, args);
    ctx.verbose(&format!(
        "Running {} {} on connection '{}' (precheck: {}, dry run: {})",
        migration.name, args.direction, options.connection, options.precheck, options.dry_run
    ));

    let conn = ctx.connect(&options.connection)?;
    let callback = ConsoleCallback;
    let mut migrator = Migrator::new(&conn, &DuckDbSchemaBuilder).with_options(options);
    if ctx.verbose && !json_mode {
        migrator = migrator.with_callback(&callback);
    }

    match migrator.run(&migration, &args.direction) {
        Ok(report) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(err) if json_mode => {
            let failure = RunFailure {
                migration: &migration.name,
                direction: &args.direction,
                success: false,
                state: migrator.state(),
                phase: err.phase(),
                error: err.to_string(),
                failed_at: Utc::now(),
            };
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Err(ExitCode(1).into())
        }
        Err(err) => Err(anyhow::Error::new(err))
            .with_context(|| format!("Migration '{}' failed", migration.name)),
    }
}

/// Config values, overridden by whatever flags were given.
fn resolve_options(ctx: &RuntimeContext, args: &RunArgs) -> MigrationOptions {
    let mut options = MigrationOptions::from(&ctx.config);
    options.dry_run |= args.dry_run;
    if let Some(precheck) = &args.precheck {
        options.precheck = precheck.clone();
    }
    options.connection = ctx
        .connection_name(args.connection.as_deref())
        .to_string();
    options
}

fn print_report(report: &RunReport) {
    if report.dry_run {
        println!(
            "-- Dry run: {} ({}), {} statement(s)",
            report.migration,
            report.direction,
            report.statements.len()
        );
        for sql in &report.statements {
            println!("{}\n", sql);
        }
        return;
    }

    println!(
        "Applied {} ({}): {} statement(s) in {}ms",
        report.migration,
        report.direction,
        report.statements.len(),
        report.duration.as_millis()
    );
}
