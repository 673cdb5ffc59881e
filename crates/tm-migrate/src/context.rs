//! Per-run execution state.

use crate::error::{MigrateError, MigrateResult};
use crate::hooks::HookDispatcher;
use indexmap::IndexMap;
use tm_core::{AlterationSet, Direction, TableName};
use tm_db::{Connection, SchemaBuilder};

/// State owned by one `run()`: collaborators, the dry-run log, executed
/// statements and the accumulated alterations.
pub struct ExecutionContext<'a> {
    pub direction: Direction,
    pub dry_run: bool,
    pub conn: &'a dyn Connection,
    pub builder: &'a dyn SchemaBuilder,
    pub hooks: HookDispatcher<'a>,
    log: Vec<String>,
    executed: Vec<String>,
    alterations: IndexMap<TableName, AlterationSet>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        direction: Direction,
        dry_run: bool,
        conn: &'a dyn Connection,
        builder: &'a dyn SchemaBuilder,
        hooks: HookDispatcher<'a>,
    ) -> Self {
        Self {
            direction,
            dry_run,
            conn,
            builder,
            hooks,
            log: Vec::new(),
            executed: Vec::new(),
            alterations: IndexMap::new(),
        }
    }

    /// Record generated SQL in dry-run mode.
    pub fn log_query(&mut self, sql: String) {
        log::debug!("[dry-run] {}", sql);
        self.log.push(sql);
    }

    /// Execute SQL against the connection.
    pub fn execute(&mut self, sql: &str) -> MigrateResult<()> {
        self.conn
            .execute(sql)
            .map_err(|e| MigrateError::SqlExecution {
                message: e.to_string(),
                sql: sql.to_string(),
            })?;
        self.executed.push(sql.to_string());
        Ok(())
    }

    /// Generated SQL in dry-run mode, in logical execution order
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Statements executed so far
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// The alteration bucket for `table`, created on first use.
    pub fn alterations_for(&mut self, table: &TableName) -> &mut AlterationSet {
        self.alterations.entry(table.clone()).or_default()
    }

    pub fn alterations(&self) -> &IndexMap<TableName, AlterationSet> {
        &self.alterations
    }

    /// Drain the accumulated alterations for flushing.
    pub fn take_alterations(&mut self) -> IndexMap<TableName, AlterationSet> {
        std::mem::take(&mut self.alterations)
    }

    /// Statements for the run report: the dry-run log or the executed list.
    pub fn into_statements(self) -> Vec<String> {
        if self.dry_run {
            self.log
        } else {
            self.executed
        }
    }
}
