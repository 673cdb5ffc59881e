//! Strongly-typed table, field and index names.

use crate::newtype_string::define_identifier;

define_identifier! {
    /// A table name, optionally schema-qualified (`schema.table`).
    pub struct TableName;
}

define_identifier! {
    /// A column name within a table.
    pub struct FieldName;
}

define_identifier! {
    /// An index name within a table.
    pub struct IndexName;
}

impl TableName {
    /// Split into `(schema, table)`; the schema is `None` when unqualified.
    pub fn parts(&self) -> (Option<&str>, &str) {
        match self.as_str().rsplit_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, self.as_str()),
        }
    }

    /// The unqualified table part.
    pub fn table(&self) -> &str {
        self.parts().1
    }
}

#[cfg(test)]
#[path = "names_test.rs"]
mod tests;
