//! Precheck strategies.
//!
//! A precheck is consulted before every mutating action and may veto it.
//! Strategies are registered by name in a [`PrecheckRegistry`] and selected
//! through configuration.

use crate::error::{MigrateError, MigrateResult};
use crate::hooks::{Action, ActionData, ActionKind};
use std::collections::HashMap;
use std::rc::Rc;
use tm_core::{FieldName, IndexName, TableName};
use tm_db::{Connection, DbError};

/// Name of the permissive default strategy
pub const DEFAULT_PRECHECK: &str = "allow";

/// Gate evaluated before each action.
pub trait Precheck {
    /// `Ok(false)` skips the action; an error aborts the run.
    fn before_action(&self, conn: &dyn Connection, action: &Action) -> MigrateResult<bool>;
}

/// Allows every action
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Precheck for AllowAll {
    fn before_action(&self, _conn: &dyn Connection, _action: &Action) -> MigrateResult<bool> {
        Ok(true)
    }
}

/// Skips actions that would fail against the live schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecheckCondition;

impl Precheck for PrecheckCondition {
    fn before_action(&self, conn: &dyn Connection, action: &Action) -> MigrateResult<bool> {
        match conflict(conn, action)? {
            Some(reason) => {
                log::info!("Skipping {}: {}", action, reason);
                Ok(false)
            }
            None => Ok(true),
        }
    }
}

/// Fails the run on actions that would fail against the live schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecheckException;

impl Precheck for PrecheckException {
    fn before_action(&self, conn: &dyn Connection, action: &Action) -> MigrateResult<bool> {
        match conflict(conn, action)? {
            Some(message) => Err(MigrateError::PrecheckFailed {
                action: action.to_string(),
                message,
            }),
            None => Ok(true),
        }
    }
}

fn introspection(err: DbError) -> MigrateError {
    MigrateError::Introspection(err)
}

fn table_exists(conn: &dyn Connection, table: &TableName) -> MigrateResult<bool> {
    conn.table_exists(table).map_err(introspection)
}

fn field_exists(conn: &dyn Connection, table: &TableName, field: &FieldName) -> MigrateResult<bool> {
    Ok(conn
        .describe_table(table)
        .map_err(introspection)?
        .contains_key(field))
}

fn index_exists(conn: &dyn Connection, table: &TableName, index: &IndexName) -> MigrateResult<bool> {
    Ok(conn
        .list_indexes(table)
        .map_err(introspection)?
        .contains_key(index))
}

/// Why `action` would fail against the current schema, if it would.
fn conflict(conn: &dyn Connection, action: &Action) -> MigrateResult<Option<String>> {
    let table = action.table();
    let exists = table_exists(conn, table)?;

    let reason = match (&action.kind, &action.data) {
        (ActionKind::CreateTable, _) if exists => Some(format!("table '{table}' already exists")),
        (ActionKind::CreateTable, _) => None,
        (_, _) if !exists => Some(format!("table '{table}' does not exist")),
        (ActionKind::RenameTable, ActionData::RenameTable { new_name, .. }) => {
            if table_exists(conn, new_name)? {
                Some(format!("table '{new_name}' already exists"))
            } else {
                None
            }
        }
        (ActionKind::AddField, ActionData::Field { field, .. }) => field_exists(conn, table, field)?
            .then(|| format!("field '{table}.{field}' already exists")),
        (ActionKind::DropField | ActionKind::ChangeField, ActionData::Field { field, .. }) => {
            (!field_exists(conn, table, field)?)
                .then(|| format!("field '{table}.{field}' does not exist"))
        }
        (
            ActionKind::RenameField,
            ActionData::RenameField {
                old_name, new_name, ..
            },
        ) => {
            if !field_exists(conn, table, old_name)? {
                Some(format!("field '{table}.{old_name}' does not exist"))
            } else if field_exists(conn, table, new_name)? {
                Some(format!("field '{table}.{new_name}' already exists"))
            } else {
                None
            }
        }
        (ActionKind::AddIndex, ActionData::Index { index, .. }) => index_exists(conn, table, index)?
            .then(|| format!("index '{index}' already exists on '{table}'")),
        (ActionKind::DropIndex | ActionKind::ChangeIndex, ActionData::Index { index, .. }) => {
            (!index_exists(conn, table, index)?)
                .then(|| format!("index '{index}' does not exist on '{table}'"))
        }
        (
            ActionKind::RenameIndex,
            ActionData::RenameIndex {
                old_name, new_name, ..
            },
        ) => {
            if !index_exists(conn, table, old_name)? {
                Some(format!("index '{old_name}' does not exist on '{table}'"))
            } else if index_exists(conn, table, new_name)? {
                Some(format!("index '{new_name}' already exists on '{table}'"))
            } else {
                None
            }
        }
        _ => None,
    };
    Ok(reason)
}

/// Named precheck strategies.
///
/// The built-in `allow`, `condition` and `exception` strategies are always
/// present; others may be registered.
pub struct PrecheckRegistry {
    strategies: HashMap<String, Rc<dyn Precheck>>,
}

impl Default for PrecheckRegistry {
    fn default() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(DEFAULT_PRECHECK, AllowAll);
        registry.register("condition", PrecheckCondition);
        registry.register("exception", PrecheckException);
        registry
    }
}

impl PrecheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any strategy of the same name.
    pub fn register(&mut self, name: impl Into<String>, precheck: impl Precheck + 'static) {
        self.strategies.insert(name.into(), Rc::new(precheck));
    }

    /// Resolve a strategy by name.
    pub fn load(&self, name: &str) -> MigrateResult<Rc<dyn Precheck>> {
        self.strategies.get(name).cloned().ok_or_else(|| {
            let mut available: Vec<&str> = self.strategies.keys().map(|k| k.as_str()).collect();
            available.sort_unstable();
            MigrateError::PrecheckLoadFailure {
                name: name.to_string(),
                message: format!("no strategy registered (available: {})", available.join(", ")),
            }
        })
    }

    /// Registered strategy names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "precheck_test.rs"]
mod tests;
