//! Turns accumulated alterations into one statement per table.

use crate::context::ExecutionContext;
use crate::error::MigrateResult;
use crate::hooks::Action;
use tm_core::{AlterationKind, AlterationSet, TableName};

/// Build and run one combined ALTER per table with pending alterations.
///
/// Prechecks ran when each entry was accumulated and are not consulted
/// again here; flush only notifies callbacks. If the schema changes between
/// accumulation and this point, entries are not re-validated and an approval
/// can be stale by the time its statement executes.
pub fn flush(ctx: &mut ExecutionContext<'_>) -> MigrateResult<()> {
    for (table, set) in ctx.take_alterations() {
        if set.is_empty() {
            continue;
        }

        let sql = ctx.builder.build_alter_sql(&table, &set);
        if sql.trim().is_empty() {
            log::debug!("No statement generated for {}", table);
            continue;
        }
        if ctx.dry_run {
            ctx.log_query(sql);
            continue;
        }

        let actions = flush_actions(&table, &set);
        for action in &actions {
            ctx.hooks.before_action(action);
        }

        ctx.execute(&sql)?;

        for action in &actions {
            ctx.hooks.after_action(action);
        }
    }
    Ok(())
}

/// Callback actions for a table's alterations, grouped add, drop, change,
/// with indexes before fields in each group.
///
/// A change entry whose `name` differs from its key is a rename.
pub fn flush_actions(table: &TableName, set: &AlterationSet) -> Vec<Action> {
    let mut actions = Vec::with_capacity(set.len());

    for index in set.add.indexes.keys() {
        actions.push(Action::index(AlterationKind::Add, table, index));
    }
    for field in set.add.fields.keys() {
        actions.push(Action::field(AlterationKind::Add, table, field));
    }

    for index in &set.drop.indexes {
        actions.push(Action::index(AlterationKind::Drop, table, index));
    }
    for field in &set.drop.fields {
        actions.push(Action::field(AlterationKind::Drop, table, field));
    }

    for index in set.change.indexes.keys() {
        actions.push(Action::index(AlterationKind::Change, table, index));
    }
    for (field, def) in &set.change.fields {
        match def.name.as_ref().filter(|name| *name != field) {
            Some(new_name) => actions.push(Action::rename_field(table, field, new_name)),
            None => actions.push(Action::field(AlterationKind::Change, table, field)),
        }
    }

    actions
}

#[cfg(test)]
#[path = "flush_test.rs"]
mod tests;
