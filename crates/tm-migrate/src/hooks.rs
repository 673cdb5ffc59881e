//! Actions, observers and the hook dispatcher.
//!
//! Two independent hook kinds surround every action: a [`Precheck`] that may
//! veto the single action, and a [`Callback`] that is only notified. The
//! migration's own [`MigrationHooks`] may abort the whole run before or
//! after it executes.

use crate::error::{MigrateError, MigrateResult};
use crate::precheck::Precheck;
use serde::Serialize;
use std::fmt;
use tm_core::{AlterationKind, Direction, FieldName, IndexName, TableName};
use tm_db::Connection;

/// Kind of action reported to prechecks and callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateTable,
    DropTable,
    RenameTable,
    AddField,
    DropField,
    ChangeField,
    RenameField,
    AddIndex,
    DropIndex,
    ChangeIndex,
    RenameIndex,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateTable => "create_table",
            ActionKind::DropTable => "drop_table",
            ActionKind::RenameTable => "rename_table",
            ActionKind::AddField => "add_field",
            ActionKind::DropField => "drop_field",
            ActionKind::ChangeField => "change_field",
            ActionKind::RenameField => "rename_field",
            ActionKind::AddIndex => "add_index",
            ActionKind::DropIndex => "drop_index",
            ActionKind::ChangeIndex => "change_index",
            ActionKind::RenameIndex => "rename_index",
        }
    }

    /// `<kind>_field` for an alteration kind
    pub fn field(kind: AlterationKind) -> Self {
        match kind {
            AlterationKind::Add => ActionKind::AddField,
            AlterationKind::Drop => ActionKind::DropField,
            AlterationKind::Change => ActionKind::ChangeField,
            AlterationKind::Rename => ActionKind::RenameField,
        }
    }

    /// `<kind>_index` for an alteration kind
    pub fn index(kind: AlterationKind) -> Self {
        match kind {
            AlterationKind::Add => ActionKind::AddIndex,
            AlterationKind::Drop => ActionKind::DropIndex,
            AlterationKind::Change => ActionKind::ChangeIndex,
            AlterationKind::Rename => ActionKind::RenameIndex,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionData {
    Table {
        table: TableName,
    },
    RenameTable {
        old_name: TableName,
        new_name: TableName,
    },
    Field {
        table: TableName,
        field: FieldName,
    },
    RenameField {
        table: TableName,
        old_name: FieldName,
        new_name: FieldName,
    },
    Index {
        table: TableName,
        index: IndexName,
    },
    RenameIndex {
        table: TableName,
        old_name: IndexName,
        new_name: IndexName,
    },
}

/// One action passed through the hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub data: ActionData,
}

impl Action {
    pub fn create_table(table: &TableName) -> Self {
        Self {
            kind: ActionKind::CreateTable,
            data: ActionData::Table {
                table: table.clone(),
            },
        }
    }

    pub fn drop_table(table: &TableName) -> Self {
        Self {
            kind: ActionKind::DropTable,
            data: ActionData::Table {
                table: table.clone(),
            },
        }
    }

    pub fn rename_table(old_name: &TableName, new_name: &TableName) -> Self {
        Self {
            kind: ActionKind::RenameTable,
            data: ActionData::RenameTable {
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            },
        }
    }

    /// A non-rename field action (`add_field`, `drop_field`, `change_field`)
    pub fn field(kind: AlterationKind, table: &TableName, field: &FieldName) -> Self {
        Self {
            kind: ActionKind::field(kind),
            data: ActionData::Field {
                table: table.clone(),
                field: field.clone(),
            },
        }
    }

    pub fn rename_field(table: &TableName, old_name: &FieldName, new_name: &FieldName) -> Self {
        Self {
            kind: ActionKind::RenameField,
            data: ActionData::RenameField {
                table: table.clone(),
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            },
        }
    }

    /// A non-rename index action (`add_index`, `drop_index`, `change_index`)
    pub fn index(kind: AlterationKind, table: &TableName, index: &IndexName) -> Self {
        Self {
            kind: ActionKind::index(kind),
            data: ActionData::Index {
                table: table.clone(),
                index: index.clone(),
            },
        }
    }

    pub fn rename_index(table: &TableName, old_name: &IndexName, new_name: &IndexName) -> Self {
        Self {
            kind: ActionKind::RenameIndex,
            data: ActionData::RenameIndex {
                table: table.clone(),
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            },
        }
    }

    /// The table the action applies to; for table renames, the old name.
    pub fn table(&self) -> &TableName {
        match &self.data {
            ActionData::Table { table }
            | ActionData::Field { table, .. }
            | ActionData::RenameField { table, .. }
            | ActionData::Index { table, .. }
            | ActionData::RenameIndex { table, .. } => table,
            ActionData::RenameTable { old_name, .. } => old_name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ActionData::Table { table } => write!(f, "{} {}", self.kind, table),
            ActionData::RenameTable { old_name, new_name } => {
                write!(f, "{} {} -> {}", self.kind, old_name, new_name)
            }
            ActionData::Field { table, field } => write!(f, "{} {}.{}", self.kind, table, field),
            ActionData::RenameField {
                table,
                old_name,
                new_name,
            } => write!(f, "{} {}.{} -> {}", self.kind, table, old_name, new_name),
            ActionData::Index { table, index } => write!(f, "{} {}.{}", self.kind, table, index),
            ActionData::RenameIndex {
                table,
                old_name,
                new_name,
            } => write!(f, "{} {}.{} -> {}", self.kind, table, old_name, new_name),
        }
    }
}

/// Before or after the migration body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => f.write_str("before"),
            HookPhase::After => f.write_str("after"),
        }
    }
}

/// Observer notified around a run and each of its actions.
///
/// Every method defaults to a no-op. Callbacks cannot veto anything.
pub trait Callback {
    fn before_migration(&self, _migration: &str, _direction: Direction) {}

    fn after_migration(&self, _migration: &str, _direction: Direction) {}

    fn before_action(&self, _migration: &str, _action: &Action) {}

    fn after_action(&self, _migration: &str, _action: &Action) {}
}

/// A migration's own before/after hooks.
///
/// Returning `Ok(false)` aborts the run with [`MigrateError::HookAbort`].
pub trait MigrationHooks {
    fn before(&self, _direction: Direction, _conn: &dyn Connection) -> MigrateResult<bool> {
        Ok(true)
    }

    fn after(&self, _direction: Direction, _conn: &dyn Connection) -> MigrateResult<bool> {
        Ok(true)
    }
}

/// Hooks that always proceed
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl MigrationHooks for DefaultHooks {}

/// Routes actions through the precheck and the callback for one run.
///
/// In dry-run mode the precheck always allows and no callback or migration
/// hook is invoked.
pub struct HookDispatcher<'a> {
    migration: &'a str,
    dry_run: bool,
    precheck: &'a dyn Precheck,
    callback: Option<&'a dyn Callback>,
    hooks: &'a dyn MigrationHooks,
}

impl<'a> HookDispatcher<'a> {
    pub fn new(
        migration: &'a str,
        dry_run: bool,
        precheck: &'a dyn Precheck,
        callback: Option<&'a dyn Callback>,
        hooks: &'a dyn MigrationHooks,
    ) -> Self {
        Self {
            migration,
            dry_run,
            precheck,
            callback,
            hooks,
        }
    }

    /// Ask the precheck whether `action` may run.
    pub fn precheck(&self, conn: &dyn Connection, action: &Action) -> MigrateResult<bool> {
        if self.dry_run {
            return Ok(true);
        }
        let allowed = self.precheck.before_action(conn, action)?;
        if !allowed {
            log::debug!("Precheck skipped {}", action);
        }
        Ok(allowed)
    }

    pub fn before_action(&self, action: &Action) {
        if self.dry_run {
            return;
        }
        log::debug!("Before {}", action);
        if let Some(callback) = self.callback {
            callback.before_action(self.migration, action);
        }
    }

    pub fn after_action(&self, action: &Action) {
        if self.dry_run {
            return;
        }
        log::debug!("After {}", action);
        if let Some(callback) = self.callback {
            callback.after_action(self.migration, action);
        }
    }

    pub fn before_migration(&self, direction: Direction, conn: &dyn Connection) -> MigrateResult<()> {
        self.migration_hook(HookPhase::Before, direction, conn)
    }

    pub fn after_migration(&self, direction: Direction, conn: &dyn Connection) -> MigrateResult<()> {
        self.migration_hook(HookPhase::After, direction, conn)
    }

    fn migration_hook(
        &self,
        phase: HookPhase,
        direction: Direction,
        conn: &dyn Connection,
    ) -> MigrateResult<()> {
        if self.dry_run {
            return Ok(());
        }

        if let Some(callback) = self.callback {
            match phase {
                HookPhase::Before => callback.before_migration(self.migration, direction),
                HookPhase::After => callback.after_migration(self.migration, direction),
            }
        }

        let proceed = match phase {
            HookPhase::Before => self.hooks.before(direction, conn)?,
            HookPhase::After => self.hooks.after(direction, conn)?,
        };
        if proceed {
            Ok(())
        } else {
            Err(MigrateError::HookAbort { phase })
        }
    }
}

#[cfg(test)]
#[path = "hooks_test.rs"]
mod tests;
