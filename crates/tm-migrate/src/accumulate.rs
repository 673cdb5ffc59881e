//! Field and index alterations, collected per table and flushed later.
//!
//! Nothing is executed here. Each field and each index is gated by the
//! precheck on its own, so a veto drops that entry and nothing else.
//! Column definitions and the table's current indexes are read once per
//! table; the indexes travel with the set so the builder can recreate them
//! around column statements.

use crate::context::ExecutionContext;
use crate::error::{MigrateError, MigrateResult};
use crate::hooks::Action;
use indexmap::IndexMap;
use tm_core::{
    AlterationKind, CoreError, FieldDef, FieldName, FieldRequest, FieldRequests, IndexDef,
    IndexName, IndexRequest, TableName,
};
use tm_db::Connection;

/// Accumulate one field-level operation.
pub fn accumulate(
    ctx: &mut ExecutionContext<'_>,
    kind: AlterationKind,
    tables: &IndexMap<TableName, FieldRequests>,
) -> MigrateResult<()> {
    for (table, requests) in tables {
        ctx.alterations_for(table);
        accumulate_indexes(ctx, kind, table, &requests.indexes)?;
        accumulate_fields(ctx, kind, table, &requests.fields)?;
    }
    Ok(())
}

fn accumulate_fields(
    ctx: &mut ExecutionContext<'_>,
    kind: AlterationKind,
    table: &TableName,
    fields: &IndexMap<FieldName, FieldRequest>,
) -> MigrateResult<()> {
    // Current columns, read once per table and only when needed.
    let mut current: Option<IndexMap<FieldName, FieldDef>> = None;

    for (field, request) in fields {
        let action = match request {
            FieldRequest::RenameTo(new_name) => Action::rename_field(table, field, new_name),
            _ => Action::field(kind, table, field),
        };
        if !ctx.hooks.precheck(ctx.conn, &action)? {
            continue;
        }
        existing_indexes(ctx, table)?;

        match (kind, request) {
            (AlterationKind::Add, FieldRequest::Define(def)) => {
                ctx.alterations_for(table)
                    .add
                    .fields
                    .insert(field.clone(), def.clone());
            }
            (AlterationKind::Drop, FieldRequest::Drop) => {
                ctx.alterations_for(table).drop.fields.insert(field.clone());
            }
            (AlterationKind::Change, FieldRequest::Define(requested)) => {
                let columns = describe(ctx.conn, table, &mut current)?;
                let def = changed_definition(requested, columns.get(field));
                ctx.alterations_for(table).change.fields.insert(field.clone(), def);
            }
            (AlterationKind::Rename, FieldRequest::RenameTo(new_name)) => {
                let columns = describe(ctx.conn, table, &mut current)?;
                let mut def = columns.get(field).cloned().unwrap_or_default();
                def.name = Some(new_name.clone());
                ctx.alterations_for(table).change.fields.insert(field.clone(), def);
            }
            _ => return Err(mismatch(kind, table)),
        }
    }
    Ok(())
}

fn accumulate_indexes(
    ctx: &mut ExecutionContext<'_>,
    kind: AlterationKind,
    table: &TableName,
    indexes: &IndexMap<IndexName, IndexRequest>,
) -> MigrateResult<()> {
    for (index, request) in indexes {
        let action = match request {
            IndexRequest::RenameTo(new_name) => Action::rename_index(table, index, new_name),
            _ => Action::index(kind, table, index),
        };
        if !ctx.hooks.precheck(ctx.conn, &action)? {
            continue;
        }

        match (kind, request) {
            (AlterationKind::Add, IndexRequest::Define(def)) => {
                ctx.alterations_for(table)
                    .add
                    .indexes
                    .insert(index.clone(), def.clone());
            }
            (AlterationKind::Drop, IndexRequest::Drop) => {
                ctx.alterations_for(table).drop.indexes.insert(index.clone());
            }
            (AlterationKind::Change, IndexRequest::Define(def)) => {
                ctx.alterations_for(table)
                    .change
                    .indexes
                    .insert(index.clone(), def.clone());
            }
            (AlterationKind::Rename, IndexRequest::RenameTo(new_name)) => {
                let def = existing_indexes(ctx, table)?
                    .get(index)
                    .cloned()
                    .ok_or_else(|| {
                        MigrateError::InvalidPayload(CoreError::InvalidPayload {
                            operation: "rename_field".to_string(),
                            message: format!("index '{index}' does not exist on '{table}'"),
                        })
                    })?;
                // Indexes cannot be renamed in place: drop and recreate.
                let set = ctx.alterations_for(table);
                set.drop.indexes.insert(index.clone());
                set.add.indexes.insert(new_name.clone(), def);
            }
            _ => return Err(mismatch(kind, table)),
        }
    }
    Ok(())
}

/// Definition stored for `alter_field`.
///
/// Without a type, or with the current type, the request is merged over the
/// current definition. A different type replaces the definition outright.
/// Date and time types never carry a length.
pub fn changed_definition(requested: &FieldDef, current: Option<&FieldDef>) -> FieldDef {
    let mut def = match current {
        Some(current) if requested.type_name.is_none() || requested.same_type_as(current) => {
            requested.merged_over(current)
        }
        _ => requested.clone(),
    };
    if def.length.is_some() && def.is_temporal() {
        def.length = None;
    }
    def
}

/// The table's current indexes, read when the set first needs them.
/// Structural operations have all run by then.
fn existing_indexes<'s>(
    ctx: &'s mut ExecutionContext<'_>,
    table: &TableName,
) -> MigrateResult<&'s IndexMap<IndexName, IndexDef>> {
    let conn = ctx.conn;
    let set = ctx.alterations_for(table);
    if set.existing_indexes.is_none() {
        set.existing_indexes = Some(conn.list_indexes(table).map_err(MigrateError::Introspection)?);
    }
    Ok(set.existing_indexes.get_or_insert_with(IndexMap::new))
}

fn describe<'c>(
    conn: &dyn Connection,
    table: &TableName,
    cache: &'c mut Option<IndexMap<FieldName, FieldDef>>,
) -> MigrateResult<&'c IndexMap<FieldName, FieldDef>> {
    if cache.is_none() {
        *cache = Some(conn.describe_table(table).map_err(MigrateError::Introspection)?);
    }
    Ok(cache.get_or_insert_with(IndexMap::new))
}

fn mismatch(kind: AlterationKind, table: &TableName) -> MigrateError {
    MigrateError::InvalidPayload(CoreError::InvalidPayload {
        operation: kind.to_string(),
        message: format!("table '{table}': request does not match the operation"),
    })
}

#[cfg(test)]
#[path = "accumulate_test.rs"]
mod tests;
