//! Collaborator contracts used by the migration engine.
//!
//! The engine never talks to a driver directly: it executes text through a
//! [`Connection`] and asks a [`SchemaBuilder`] for dialect SQL. Both are
//! synchronous because a migration runs strictly sequentially inside a single
//! transaction.

use crate::error::DbResult;
use indexmap::IndexMap;
use tm_core::{
    AlterationSet, FieldDef, FieldName, IndexDef, IndexName, TableDef, TableName, TableParameters,
};

/// A live database connection with DDL and introspection primitives.
pub trait Connection {
    /// Execute SQL text. The text may hold several `;`-separated statements.
    fn execute(&self, sql: &str) -> DbResult<()>;

    fn begin(&self) -> DbResult<()>;

    fn commit(&self) -> DbResult<()>;

    fn rollback(&self) -> DbResult<()>;

    /// Check whether a base table exists
    fn table_exists(&self, table: &TableName) -> DbResult<bool>;

    /// All base tables, ordered by schema then name
    fn list_tables(&self) -> DbResult<Vec<TableName>>;

    /// Current column definitions in ordinal order.
    ///
    /// Returns [`DbError::TableNotFound`](crate::DbError::TableNotFound) for
    /// a missing table.
    fn describe_table(&self, table: &TableName) -> DbResult<IndexMap<FieldName, FieldDef>>;

    /// Explicit indexes plus the primary key (as `PRIMARY`)
    fn list_indexes(&self, table: &TableName) -> DbResult<IndexMap<IndexName, IndexDef>>;

    fn read_table_parameters(&self, table: &TableName) -> DbResult<TableParameters>;

    /// Quote a single identifier for this dialect
    fn quote_identifier(&self, name: &str) -> String;

    /// Quote a possibly schema-qualified table name
    fn quote_table(&self, table: &TableName) -> String {
        match table.parts() {
            (Some(schema), name) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            ),
            (None, name) => self.quote_identifier(name),
        }
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Turns abstract definitions into dialect SQL.
pub trait SchemaBuilder {
    /// CREATE TABLE plus any index and comment statements for one table
    fn build_create_sql(&self, table: &TableName, def: &TableDef) -> String;

    fn build_drop_sql(&self, table: &TableName) -> String;

    /// One combined statement text applying every entry of `alterations`
    fn build_alter_sql(&self, table: &TableName, alterations: &AlterationSet) -> String;
}
