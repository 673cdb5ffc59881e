//! DuckDB schema builder.
//!
//! DuckDB accepts a single action per `ALTER TABLE`, so a combined
//! alteration is rendered as a sequence of statements in one text that the
//! connection executes as a batch.

use crate::traits::SchemaBuilder;
use crate::types::{default_clause, quote_ident, quote_literal, sql_type};
use tm_core::schema::PRIMARY_INDEX;
use tm_core::{AlterationSet, FieldDef, FieldName, IndexDef, IndexName, KeyKind, TableDef, TableName};

/// Builds DuckDB DDL from abstract definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbSchemaBuilder;

impl DuckDbSchemaBuilder {
    pub fn new() -> Self {
        Self
    }
}

fn quote_table(table: &TableName) -> String {
    match table.parts() {
        (Some(schema), name) => format!("{}.{}", quote_ident(schema), quote_ident(name)),
        (None, name) => quote_ident(name),
    }
}

/// Indexes live in their table's schema
fn quote_index(table: &TableName, index: &IndexName) -> String {
    match table.parts() {
        (Some(schema), _) => format!("{}.{}", quote_ident(schema), quote_ident(index)),
        (None, _) => quote_ident(index),
    }
}

fn column_list(columns: &[FieldName]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_index_sql(table: &TableName, index: &IndexName, def: &IndexDef) -> String {
    format!(
        "CREATE {}INDEX {} ON {} ({});",
        if def.unique { "UNIQUE " } else { "" },
        quote_ident(index),
        quote_table(table),
        column_list(&def.column)
    )
}

/// An untouched index as it must be recreated after the column statements:
/// renamed columns follow their new name, and an index that covers a
/// dropped column is not recreated.
fn carried_index(alterations: &AlterationSet, def: &IndexDef) -> Option<IndexDef> {
    let mut columns = Vec::with_capacity(def.column.len());
    for column in &def.column {
        if alterations.drop.fields.contains(column) {
            return None;
        }
        let renamed = alterations
            .change
            .fields
            .get(column)
            .and_then(|field_def| field_def.name.as_ref());
        columns.push(renamed.unwrap_or(column).clone());
    }
    Some(IndexDef {
        column: columns,
        unique: def.unique,
    })
}

fn column_comment_sql(table: &TableName, field: &str, comment: &str) -> String {
    format!(
        "COMMENT ON COLUMN {}.{} IS {};",
        quote_table(table),
        quote_ident(field),
        quote_literal(comment)
    )
}

fn column_definition(field: &FieldName, def: &FieldDef) -> String {
    let mut sql = format!("{} {}", quote_ident(field), sql_type(def));
    if def.null == Some(false) {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = default_clause(def) {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default);
    }
    if def.key == Some(KeyKind::Unique) {
        sql.push_str(" UNIQUE");
    }
    sql
}

impl SchemaBuilder for DuckDbSchemaBuilder {
    fn build_create_sql(&self, table: &TableName, def: &TableDef) -> String {
        let mut columns: Vec<String> = def
            .fields
            .iter()
            .map(|(field, field_def)| format!("    {}", column_definition(field, field_def)))
            .collect();

        let primary_key: Vec<FieldName> = def.primary_key().into_iter().cloned().collect();
        if !primary_key.is_empty() {
            columns.push(format!("    PRIMARY KEY ({})", column_list(&primary_key)));
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n{}\n);",
            quote_table(table),
            columns.join(",\n")
        )];

        for (index, index_def) in &def.indexes {
            if index.as_str() != PRIMARY_INDEX {
                statements.push(create_index_sql(table, index, index_def));
            }
        }

        if let Some(comment) = &def.parameters.comment {
            statements.push(format!(
                "COMMENT ON TABLE {} IS {};",
                quote_table(table),
                quote_literal(comment)
            ));
        }
        for (field, field_def) in &def.fields {
            if let Some(comment) = &field_def.comment {
                statements.push(column_comment_sql(table, field, comment));
            }
        }

        statements.join("\n")
    }

    fn build_drop_sql(&self, table: &TableName) -> String {
        format!("DROP TABLE {};", quote_table(table))
    }

    fn build_alter_sql(&self, table: &TableName, alterations: &AlterationSet) -> String {
        let quoted = quote_table(table);
        let mut statements = Vec::new();

        // DuckDB refuses ALTER TABLE while any secondary index exists, so
        // indexes are dropped first and created last against the final
        // columns. The primary key cannot be altered and is skipped.
        let cycled: Vec<(&IndexName, &IndexDef)> = if alterations.alters_columns() {
            alterations
                .untouched_indexes()
                .filter(|(index, _)| index.as_str() != PRIMARY_INDEX)
                .collect()
        } else {
            Vec::new()
        };
        let mut recreated: Vec<String> = cycled
            .iter()
            .filter_map(|(index, def)| {
                carried_index(alterations, def).map(|def| create_index_sql(table, index, &def))
            })
            .collect();

        let dropped_indexes = alterations
            .drop
            .indexes
            .iter()
            .chain(alterations.change.indexes.keys())
            .chain(cycled.iter().map(|(index, _)| *index));
        for index in dropped_indexes {
            if index.as_str() != PRIMARY_INDEX {
                statements.push(format!("DROP INDEX {};", quote_index(table, index)));
            }
        }

        for field in &alterations.drop.fields {
            statements.push(format!(
                "ALTER TABLE {} DROP COLUMN {};",
                quoted,
                quote_ident(field)
            ));
        }

        for (field, def) in &alterations.change.fields {
            let mut column = field.as_str();
            if let Some(new_name) = def.name.as_ref().filter(|n| *n != field) {
                statements.push(format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {};",
                    quoted,
                    quote_ident(field),
                    quote_ident(new_name)
                ));
                column = new_name.as_str();
            }
            let column_ident = quote_ident(column);

            let default = default_clause(def);
            if default.is_none() {
                statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    quoted, column_ident
                ));
            }
            if def.type_name.is_some() {
                statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {};",
                    quoted,
                    column_ident,
                    sql_type(def)
                ));
            }
            if let Some(default) = default {
                statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    quoted, column_ident, default
                ));
            }
            match def.null {
                Some(false) => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;",
                    quoted, column_ident
                )),
                Some(true) => statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL;",
                    quoted, column_ident
                )),
                None => {}
            }
            if let Some(comment) = &def.comment {
                statements.push(column_comment_sql(table, column, comment));
            }
        }

        for (field, def) in &alterations.add.fields {
            // ADD COLUMN accepts no constraints, so NOT NULL and UNIQUE
            // follow as separate statements.
            let mut sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quoted,
                quote_ident(field),
                sql_type(def)
            );
            if let Some(default) = default_clause(def) {
                sql.push_str(" DEFAULT ");
                sql.push_str(&default);
            }
            sql.push(';');
            statements.push(sql);

            if def.null == Some(false) {
                statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;",
                    quoted,
                    quote_ident(field)
                ));
            }
            if matches!(def.key, Some(KeyKind::Unique | KeyKind::Primary)) {
                let index = IndexName::new(format!("{}_{}_key", table.table(), field));
                let index_def = IndexDef::on([field.as_str()]).unique();
                recreated.push(create_index_sql(table, &index, &index_def));
            }
            if let Some(comment) = &def.comment {
                statements.push(column_comment_sql(table, field, comment));
            }
        }

        statements.append(&mut recreated);

        let created_indexes = alterations
            .add
            .indexes
            .iter()
            .chain(alterations.change.indexes.iter());
        for (index, def) in created_indexes {
            if index.as_str() != PRIMARY_INDEX {
                statements.push(create_index_sql(table, index, def));
            }
        }

        statements.join("\n")
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
