//! Whole-table operations, executed immediately in the run's transaction.
//!
//! Callbacks are notified for every table whether or not the precheck
//! allowed it; SQL is only generated for allowed tables.

use crate::context::ExecutionContext;
use crate::error::MigrateResult;
use crate::hooks::Action;
use indexmap::IndexMap;
use tm_core::{TableDef, TableName};

pub fn create_tables(
    ctx: &mut ExecutionContext<'_>,
    tables: &IndexMap<TableName, TableDef>,
) -> MigrateResult<()> {
    for (table, def) in tables {
        let action = Action::create_table(table);
        let allowed = ctx.hooks.precheck(ctx.conn, &action)?;
        ctx.hooks.before_action(&action);

        if allowed {
            let sql = ctx.builder.build_create_sql(table, def);
            if ctx.dry_run {
                ctx.log_query(sql);
                continue;
            }
            ctx.execute(&sql)?;
        }

        ctx.hooks.after_action(&action);
    }
    Ok(())
}

pub fn drop_tables(ctx: &mut ExecutionContext<'_>, tables: &[TableName]) -> MigrateResult<()> {
    for table in tables {
        let action = Action::drop_table(table);
        let allowed = ctx.hooks.precheck(ctx.conn, &action)?;
        ctx.hooks.before_action(&action);

        if allowed {
            let sql = ctx.builder.build_drop_sql(table);
            if ctx.dry_run {
                ctx.log_query(sql);
                continue;
            }
            ctx.execute(&sql)?;
        }

        ctx.hooks.after_action(&action);
    }
    Ok(())
}

/// Rename tables with `ALTER TABLE .. RENAME TO ..`, built here rather than
/// by the schema builder.
///
/// In dry-run mode the first allowed rename is logged and the remaining
/// renames of this operation are not visited.
pub fn rename_tables(
    ctx: &mut ExecutionContext<'_>,
    renames: &IndexMap<TableName, TableName>,
) -> MigrateResult<()> {
    for (old_name, new_name) in renames {
        let action = Action::rename_table(old_name, new_name);
        let allowed = ctx.hooks.precheck(ctx.conn, &action)?;

        if allowed && ctx.dry_run {
            let sql = rename_sql(ctx, old_name, new_name);
            ctx.log_query(sql);
            return Ok(());
        }

        ctx.hooks.before_action(&action);
        if allowed {
            let sql = rename_sql(ctx, old_name, new_name);
            ctx.execute(&sql)?;
        }
        ctx.hooks.after_action(&action);
    }
    Ok(())
}

/// The target keeps the source's schema, so only its table part is written.
fn rename_sql(ctx: &ExecutionContext<'_>, old_name: &TableName, new_name: &TableName) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {};",
        ctx.conn.quote_table(old_name),
        ctx.conn.quote_identifier(new_name.table())
    )
}

#[cfg(test)]
#[path = "structural_test.rs"]
mod tests;
