//! DuckDB connection with DDL execution and catalog introspection

use crate::error::{DbError, DbResult};
use crate::traits::Connection;
use crate::types::{abstract_type, quote_ident};
use duckdb::params;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::Path;
use tm_core::schema::PRIMARY_INDEX;
use tm_core::{FieldDef, FieldName, IndexDef, IndexName, KeyKind, TableName, TableParameters};

/// Schema used for unqualified table names
const DEFAULT_SCHEMA: &str = "main";

/// DuckDB connection
pub struct DuckDbConnection {
    conn: duckdb::Connection,
}

impl DuckDbConnection {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = duckdb::Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Split a table name into catalog schema and table
    fn locate(table: &TableName) -> (&str, &str) {
        let (schema, name) = table.parts();
        (schema.unwrap_or(DEFAULT_SCHEMA), name)
    }

    fn transaction(&self, operation: &str, sql: &str) -> DbResult<()> {
        log::debug!("{}", sql);
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::TransactionError {
                operation: operation.to_string(),
                message: e.to_string(),
            })
    }

    /// Columns of the primary key and of single-column UNIQUE constraints
    fn key_columns(&self, schema: &str, table: &str) -> DbResult<(Vec<String>, HashSet<String>)> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT UNNEST(constraint_column_names) FROM duckdb_constraints() \
                 WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
                 AND constraint_type = 'PRIMARY KEY'",
            )
            .map_err(introspection)?;
        let primary = stmt
            .query_map(params![schema, table], |row| row.get::<_, String>(0))
            .map_err(introspection)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(introspection)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT constraint_column_names[1] FROM duckdb_constraints() \
                 WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
                 AND constraint_type = 'UNIQUE' AND len(constraint_column_names) = 1",
            )
            .map_err(introspection)?;
        let unique = stmt
            .query_map(params![schema, table], |row| row.get::<_, String>(0))
            .map_err(introspection)?
            .collect::<Result<HashSet<_>, _>>()
            .map_err(introspection)?;

        Ok((primary, unique))
    }
}

fn introspection(err: duckdb::Error) -> DbError {
    DbError::IntrospectionError(err.to_string())
}

/// Column list of a `CREATE [UNIQUE] INDEX name ON table(a, b)` statement
fn index_columns(sql: &str) -> Vec<FieldName> {
    let (Some(open), Some(close)) = (sql.find('('), sql.rfind(')')) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    sql[open + 1..close]
        .split(',')
        .filter_map(|col| FieldName::try_new(col.trim().trim_matches('"')))
        .collect()
}

impl Connection for DuckDbConnection {
    fn execute(&self, sql: &str) -> DbResult<()> {
        log::debug!("{}", sql);
        self.conn.execute_batch(sql).map_err(DbError::from)
    }

    fn begin(&self) -> DbResult<()> {
        self.transaction("begin", "BEGIN TRANSACTION")
    }

    fn commit(&self) -> DbResult<()> {
        self.transaction("commit", "COMMIT")
    }

    fn rollback(&self) -> DbResult<()> {
        self.transaction("rollback", "ROLLBACK")
    }

    fn table_exists(&self, table: &TableName) -> DbResult<bool> {
        let (schema, name) = Self::locate(table);
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_catalog = current_database() AND table_schema = ? \
                 AND table_name = ? AND table_type = 'BASE TABLE'",
                params![schema, name],
                |row| row.get(0),
            )
            .map_err(introspection)?;
        Ok(count > 0)
    }

    fn list_tables(&self) -> DbResult<Vec<TableName>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_catalog = current_database() AND table_type = 'BASE TABLE' \
                 ORDER BY table_schema, table_name",
            )
            .map_err(introspection)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(introspection)?;

        let mut tables = Vec::new();
        for row in rows {
            let (schema, name) = row.map_err(introspection)?;
            let qualified = if schema == DEFAULT_SCHEMA {
                name
            } else {
                format!("{schema}.{name}")
            };
            if let Some(table) = TableName::try_new(qualified) {
                tables.push(table);
            }
        }
        Ok(tables)
    }

    fn describe_table(&self, table: &TableName) -> DbResult<IndexMap<FieldName, FieldDef>> {
        let (schema, name) = Self::locate(table);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT column_name, data_type, CAST(character_maximum_length AS BIGINT), \
                 is_nullable, column_default \
                 FROM information_schema.columns \
                 WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ? \
                 ORDER BY ordinal_position",
            )
            .map_err(introspection)?;
        let rows = stmt
            .query_map(params![schema, name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(introspection)?;

        let (primary, unique) = self.key_columns(schema, name)?;

        let mut fields = IndexMap::new();
        for row in rows {
            let (column, data_type, max_length, is_nullable, default) =
                row.map_err(introspection)?;
            let Some(field) = FieldName::try_new(column.clone()) else {
                continue;
            };
            let type_name = abstract_type(&data_type);
            let length = if type_name == "string" {
                max_length.and_then(|n| u32::try_from(n).ok()).map(Some)
            } else {
                None
            };
            let key = if primary.contains(&column) {
                Some(KeyKind::Primary)
            } else if unique.contains(&column) {
                Some(KeyKind::Unique)
            } else {
                None
            };

            fields.insert(
                field,
                FieldDef {
                    type_name: Some(type_name),
                    length,
                    null: Some(is_nullable.eq_ignore_ascii_case("YES")),
                    default_expr: default,
                    key,
                    ..Default::default()
                },
            );
        }

        if fields.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(fields)
    }

    fn list_indexes(&self, table: &TableName) -> DbResult<IndexMap<IndexName, IndexDef>> {
        let (schema, name) = Self::locate(table);
        let mut indexes = IndexMap::new();

        let (primary, _) = self.key_columns(schema, name)?;
        if !primary.is_empty() {
            indexes.insert(IndexName::new(PRIMARY_INDEX), IndexDef::on(primary).unique());
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT index_name, is_unique, sql FROM duckdb_indexes() \
                 WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
                 ORDER BY index_name",
            )
            .map_err(introspection)?;
        let rows = stmt
            .query_map(params![schema, name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })
            .map_err(introspection)?;

        for row in rows {
            let (index_name, is_unique, sql) = row.map_err(introspection)?;
            let Some(index) = IndexName::try_new(index_name) else {
                continue;
            };
            indexes.insert(
                index,
                IndexDef {
                    column: sql.as_deref().map(index_columns).unwrap_or_default(),
                    unique: is_unique,
                },
            );
        }
        Ok(indexes)
    }

    fn read_table_parameters(&self, table: &TableName) -> DbResult<TableParameters> {
        let (schema, name) = Self::locate(table);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT comment FROM duckdb_tables() \
                 WHERE database_name = current_database() AND schema_name = ? AND table_name = ?",
            )
            .map_err(introspection)?;
        let mut comments = stmt
            .query_map(params![schema, name], |row| row.get::<_, Option<String>>(0))
            .map_err(introspection)?;

        match comments.next() {
            Some(comment) => Ok(TableParameters {
                comment: comment.map_err(introspection)?.filter(|c| !c.is_empty()),
            }),
            None => Err(DbError::TableNotFound(table.to_string())),
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ident(name)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
