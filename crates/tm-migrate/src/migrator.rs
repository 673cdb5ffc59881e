//! Run controller: transaction boundary, migration hooks and rollback.

use crate::accumulate::accumulate;
use crate::collaborators::{CacheInvalidator, VersionTracker};
use crate::context::ExecutionContext;
use crate::error::{MigrateError, MigrateResult, RunPhase};
use crate::flush::flush;
use crate::hooks::{Callback, DefaultHooks, HookDispatcher, MigrationHooks};
use crate::order::plan;
use crate::precheck::{Precheck, PrecheckRegistry, DEFAULT_PRECHECK};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tm_core::{Config, CoreResult, Direction, MigrationFile, MigrationSpec, Operation, DEFAULT_CONNECTION};
use tm_db::{Connection, SchemaBuilder};

/// A migration ready to run: its name, operations and own hooks.
pub struct Migration {
    pub name: String,
    pub spec: MigrationSpec,
    hooks: Box<dyn MigrationHooks>,
}

impl Migration {
    pub fn new(name: impl Into<String>, spec: MigrationSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            hooks: Box::new(DefaultHooks),
        }
    }

    /// Load a migration file; the name is the file stem.
    pub fn load(path: &Path) -> CoreResult<Self> {
        Ok(MigrationFile::load(path)?.into())
    }

    /// Replace the migration's before/after hooks
    pub fn with_hooks(mut self, hooks: impl MigrationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn hooks(&self) -> &dyn MigrationHooks {
        self.hooks.as_ref()
    }
}

impl From<MigrationFile> for Migration {
    fn from(file: MigrationFile) -> Self {
        Migration::new(file.name, file.spec)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Options for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOptions {
    /// Generate SQL without executing it
    pub dry_run: bool,
    /// Connection name, resolved by the caller
    pub connection: String,
    /// Precheck strategy name
    pub precheck: String,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            connection: DEFAULT_CONNECTION.to_string(),
            precheck: DEFAULT_PRECHECK.to_string(),
        }
    }
}

impl From<&Config> for MigrationOptions {
    fn from(config: &Config) -> Self {
        Self {
            dry_run: config.dry_run,
            connection: config.connection.clone(),
            precheck: config.precheck.clone(),
        }
    }
}

/// Where the run controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    TransactionOpen,
    Executing,
    CacheCleared,
    Committed,
    RolledBack,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::TransactionOpen => "transaction_open",
            RunState::Executing => "executing",
            RunState::CacheCleared => "cache_cleared",
            RunState::Committed => "committed",
            RunState::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub migration: String,
    pub direction: Direction,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Executed statements, or the generated ones for a dry run
    pub statements: Vec<String>,
    pub success: bool,
}

/// Applies migrations to one connection.
pub struct Migrator<'a> {
    conn: &'a dyn Connection,
    builder: &'a dyn SchemaBuilder,
    options: MigrationOptions,
    prechecks: PrecheckRegistry,
    callback: Option<&'a dyn Callback>,
    cache: Option<&'a dyn CacheInvalidator>,
    version: Option<&'a dyn VersionTracker>,
    state: RunState,
}

impl<'a> Migrator<'a> {
    pub fn new(conn: &'a dyn Connection, builder: &'a dyn SchemaBuilder) -> Self {
        Self {
            conn,
            builder,
            options: MigrationOptions::default(),
            prechecks: PrecheckRegistry::default(),
            callback: None,
            cache: None,
            version: None,
            state: RunState::Idle,
        }
    }

    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a precheck strategy and select it.
    pub fn with_precheck(mut self, name: impl Into<String>, precheck: impl Precheck + 'static) -> Self {
        let name = name.into();
        self.prechecks.register(name.clone(), precheck);
        self.options.precheck = name;
        self
    }

    pub fn with_callback(mut self, callback: &'a dyn Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_cache(mut self, cache: &'a dyn CacheInvalidator) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_version_tracker(mut self, version: &'a dyn VersionTracker) -> Self {
        self.version = Some(version);
        self
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// State reached by the last run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run one direction of a migration.
    ///
    /// The direction and precheck strategy are resolved before the
    /// connection is touched. Everything after that runs in one transaction
    /// (none for a dry run) and any failure rolls it back and is returned
    /// as [`MigrateError::Migration`].
    pub fn run(&mut self, migration: &Migration, direction: &str) -> MigrateResult<RunReport> {
        self.state = RunState::Idle;
        let direction = Direction::parse(direction)
            .ok_or_else(|| MigrateError::InvalidDirection(direction.to_string()))?;
        let precheck = self.prechecks.load(&self.options.precheck)?;

        let dry_run = self.options.dry_run;
        let started_at = Utc::now();
        let timer = Instant::now();

        log::info!(
            "Running migration '{}' {}{}",
            migration.name,
            direction,
            if dry_run { " (dry run)" } else { "" }
        );

        if !dry_run {
            self.conn
                .begin()
                .map_err(|e| wrap(migration, RunPhase::Begin, MigrateError::Transaction(e)))?;
            self.state = RunState::TransactionOpen;
        }

        let hooks = HookDispatcher::new(
            &migration.name,
            dry_run,
            precheck.as_ref(),
            self.callback,
            migration.hooks(),
        );
        let mut ctx = ExecutionContext::new(direction, dry_run, self.conn, self.builder, hooks);

        if let Err((phase, err)) = self.drive(migration, &mut ctx) {
            if !dry_run {
                log::warn!(
                    "Migration '{}' failed during {}, rolling back: {}",
                    migration.name,
                    phase,
                    err
                );
                if let Err(rollback_err) = self.conn.rollback() {
                    log::warn!("Rollback failed: {}", rollback_err);
                }
            }
            self.state = RunState::RolledBack;
            return Err(wrap(migration, phase, err));
        }

        let statements = ctx.into_statements();
        log::info!(
            "Migration '{}' {} finished: {} statement(s)",
            migration.name,
            direction,
            statements.len()
        );

        Ok(RunReport {
            migration: migration.name.clone(),
            direction,
            dry_run,
            started_at,
            duration: timer.elapsed(),
            statements,
            success: true,
        })
    }

    fn drive(
        &mut self,
        migration: &Migration,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<(), (RunPhase, MigrateError)> {
        let direction = ctx.direction;

        ctx.hooks
            .before_migration(direction, self.conn)
            .map_err(|e| (RunPhase::BeforeMigration, e))?;
        self.state = RunState::Executing;

        dispatch(ctx, migration).map_err(|e| (RunPhase::Dispatch, e))?;
        flush(ctx).map_err(|e| (RunPhase::Flush, e))?;

        self.clear_caches();
        self.state = RunState::CacheCleared;

        ctx.hooks
            .after_migration(direction, self.conn)
            .map_err(|e| (RunPhase::AfterMigration, e))?;

        if !ctx.dry_run {
            self.conn
                .commit()
                .map_err(|e| (RunPhase::Commit, MigrateError::Transaction(e)))?;
        }
        self.state = RunState::Committed;
        Ok(())
    }

    fn clear_caches(&self) {
        if let Some(cache) = self.cache {
            cache.clear_all();
        }
        if let Some(version) = self.version {
            version.refresh();
        }
    }
}

/// Route every operation of the run's direction, in execution order.
fn dispatch(ctx: &mut ExecutionContext<'_>, migration: &Migration) -> MigrateResult<()> {
    let operations = migration.spec.operations(ctx.direction);
    for (op, operation) in plan(operations)? {
        log::debug!("Dispatching {}", op);
        match operation {
            Operation::CreateTable(tables) => crate::structural::create_tables(ctx, &tables)?,
            Operation::DropTable(tables) => crate::structural::drop_tables(ctx, &tables)?,
            Operation::RenameTable(renames) => crate::structural::rename_tables(ctx, &renames)?,
            Operation::Alter { kind, tables } => accumulate(ctx, kind, &tables)?,
        }
    }
    Ok(())
}

fn wrap(migration: &Migration, phase: RunPhase, source: MigrateError) -> MigrateError {
    MigrateError::Migration {
        migration: migration.name.clone(),
        phase,
        source: Box::new(source),
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
