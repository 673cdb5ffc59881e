//! Test doubles shared by the unit tests.

use crate::context::ExecutionContext;
use crate::hooks::{Action, Callback, DefaultHooks, HookDispatcher};
use crate::precheck::Precheck;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use tm_core::{
    Direction, FieldDef, FieldName, IndexDef, IndexName, MigrationSpec, TableName,
    TableParameters,
};
use tm_db::{Connection, DbError, DbResult, DuckDbConnection, DuckDbSchemaBuilder};

/// In-memory DuckDB connection that records every call made through the
/// `Connection` trait.
pub(crate) struct RecordingConnection {
    inner: DuckDbConnection,
    calls: RefCell<Vec<String>>,
    fail_on: Option<String>,
    columns: HashMap<String, IndexMap<FieldName, FieldDef>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            inner: DuckDbConnection::in_memory().unwrap(),
            calls: RefCell::new(Vec::new()),
            fail_on: None,
            columns: HashMap::new(),
        }
    }

    /// Fail any `execute` whose SQL contains `pattern`.
    pub fn failing_on(mut self, pattern: &str) -> Self {
        self.fail_on = Some(pattern.to_string());
        self
    }

    /// Report fixed columns for `table` instead of introspecting.
    pub fn with_columns(mut self, table: &str, yaml: &str) -> Self {
        let columns: IndexMap<FieldName, FieldDef> = serde_yaml::from_str(yaml).unwrap();
        self.columns.insert(table.to_string(), columns);
        self
    }

    /// Run setup SQL without recording it.
    pub fn setup(&self, sql: &str) -> &Self {
        self.inner.execute(sql).unwrap();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// SQL passed to `execute`, in order
    pub fn executed(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.strip_prefix("execute: ").map(str::to_string))
            .collect()
    }

    pub fn inner(&self) -> &DuckDbConnection {
        &self.inner
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl Connection for RecordingConnection {
    fn execute(&self, sql: &str) -> DbResult<()> {
        self.record(format!("execute: {sql}"));
        if let Some(pattern) = &self.fail_on {
            if sql.contains(pattern.as_str()) {
                return Err(DbError::ExecutionError(format!("injected failure on {pattern}")));
            }
        }
        self.inner.execute(sql)
    }

    fn begin(&self) -> DbResult<()> {
        self.record("begin");
        self.inner.begin()
    }

    fn commit(&self) -> DbResult<()> {
        self.record("commit");
        self.inner.commit()
    }

    fn rollback(&self) -> DbResult<()> {
        self.record("rollback");
        self.inner.rollback()
    }

    fn table_exists(&self, table: &TableName) -> DbResult<bool> {
        self.record(format!("table_exists: {table}"));
        self.inner.table_exists(table)
    }

    fn list_tables(&self) -> DbResult<Vec<TableName>> {
        self.record("list_tables");
        self.inner.list_tables()
    }

    fn describe_table(&self, table: &TableName) -> DbResult<IndexMap<FieldName, FieldDef>> {
        self.record(format!("describe_table: {table}"));
        match self.columns.get(table.as_str()) {
            Some(columns) => Ok(columns.clone()),
            None => self.inner.describe_table(table),
        }
    }

    fn list_indexes(&self, table: &TableName) -> DbResult<IndexMap<IndexName, IndexDef>> {
        self.record(format!("list_indexes: {table}"));
        self.inner.list_indexes(table)
    }

    fn read_table_parameters(&self, table: &TableName) -> DbResult<TableParameters> {
        self.record(format!("read_table_parameters: {table}"));
        self.inner.read_table_parameters(table)
    }

    fn quote_identifier(&self, name: &str) -> String {
        self.inner.quote_identifier(name)
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}

/// Callback that records every notification as a line of text.
#[derive(Default)]
pub(crate) struct RecordingCallback {
    events: RefCell<Vec<String>>,
}

impl RecordingCallback {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Callback for RecordingCallback {
    fn before_migration(&self, migration: &str, direction: Direction) {
        self.events
            .borrow_mut()
            .push(format!("before_migration {migration} {direction}"));
    }

    fn after_migration(&self, migration: &str, direction: Direction) {
        self.events
            .borrow_mut()
            .push(format!("after_migration {migration} {direction}"));
    }

    fn before_action(&self, _migration: &str, action: &Action) {
        self.events.borrow_mut().push(format!("before {action}"));
    }

    fn after_action(&self, _migration: &str, action: &Action) {
        self.events.borrow_mut().push(format!("after {action}"));
    }
}

pub(crate) fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

pub(crate) fn spec(text: &str) -> MigrationSpec {
    MigrationSpec::from_yaml(text).unwrap()
}

/// Execution context over `conn` with the DuckDB builder and default hooks.
pub(crate) fn context<'a>(
    conn: &'a RecordingConnection,
    dry_run: bool,
    precheck: &'a dyn Precheck,
    callback: Option<&'a dyn Callback>,
) -> ExecutionContext<'a> {
    let hooks = HookDispatcher::new("test_migration", dry_run, precheck, callback, &DefaultHooks);
    ExecutionContext::new(Direction::Up, dry_run, conn, &DuckDbSchemaBuilder, hooks)
}
