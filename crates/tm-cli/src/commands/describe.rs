//! Describe command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tm_core::{FieldDef, KeyKind, TableName};
use tm_db::types::{default_clause, sql_type};
use tm_db::Connection;

use crate::cli::{DescribeArgs, GlobalArgs, OutputFormat};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// One column as reported by introspection
#[derive(Debug, Serialize)]
struct ColumnRow {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<KeyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct IndexRow {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

#[derive(Debug, Serialize)]
struct TableDescription {
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    columns: Vec<ColumnRow>,
    indexes: Vec<IndexRow>,
}

/// Execute the describe command
pub fn execute(args: &DescribeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let name = ctx.connection_name(args.connection.as_deref());
    let conn = ctx.connect(name)?;
    let json_mode = args.output == OutputFormat::Json;

    let Some(table) = &args.table else {
        let tables = conn.list_tables().context("Failed to list tables")?;
        let names: Vec<String> = tables.iter().map(|t| t.to_string()).collect();
        if json_mode {
            println!("{}", serde_json::to_string_pretty(&names)?);
        } else if names.is_empty() {
            println!("No tables");
        } else {
            for name in &names {
                println!("{}", name);
            }
        }
        return Ok(());
    };

    let Some(table) = TableName::try_new(table.as_str()) else {
        eprintln!("Table name must not be empty");
        return Err(ExitCode(2).into());
    };
    if !conn.table_exists(&table)? {
        eprintln!("Table '{}' not found", table);
        return Err(ExitCode(1).into());
    }

    let description = describe_table(&conn, &table)?;
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&description)?);
    } else {
        print_description(&description);
    }
    Ok(())
}

fn describe_table(conn: &dyn Connection, table: &TableName) -> Result<TableDescription> {
    let fields = conn
        .describe_table(table)
        .with_context(|| format!("Failed to describe '{}'", table))?;
    let indexes = conn
        .list_indexes(table)
        .with_context(|| format!("Failed to list indexes of '{}'", table))?;
    let parameters = conn.read_table_parameters(table)?;

    Ok(TableDescription {
        table: table.to_string(),
        comment: parameters.comment,
        columns: fields
            .iter()
            .map(|(name, def)| column_row(name.as_str(), def))
            .collect(),
        indexes: indexes
            .iter()
            .map(|(name, def)| IndexRow {
                name: name.to_string(),
                columns: def.column.iter().map(|c| c.to_string()).collect(),
                unique: def.unique,
            })
            .collect(),
    })
}

fn column_row(name: &str, def: &FieldDef) -> ColumnRow {
    ColumnRow {
        name: name.to_string(),
        type_name: sql_type(def),
        nullable: def.null.unwrap_or(true),
        default: default_clause(def),
        key: def.key,
        comment: def.comment.clone(),
    }
}

fn print_description(description: &TableDescription) {
    println!("{}", description.table);
    if let Some(comment) = &description.comment {
        println!("  -- {}", comment);
    }

    let width = description
        .columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for column in &description.columns {
        let mut line = format!(
            "  {:<width$}  {}",
            column.name,
            column.type_name,
            width = width
        );
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            line.push_str(&format!(" DEFAULT {}", default));
        }
        match column.key {
            Some(KeyKind::Primary) => line.push_str(" PRIMARY KEY"),
            Some(KeyKind::Unique) => line.push_str(" UNIQUE"),
            None => {}
        }
        println!("{}", line);
    }

    if !description.indexes.is_empty() {
        println!("  indexes:");
        for index in &description.indexes {
            println!(
                "    {} ({}){}",
                index.name,
                index.columns.join(", "),
                if index.unique { " unique" } else { "" }
            );
        }
    }
}

#[cfg(test)]
#[path = "describe_test.rs"]
mod tests;
