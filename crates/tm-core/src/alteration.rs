//! Per-table buckets of accumulated field and index alterations.

use crate::names::{FieldName, IndexName};
use crate::schema::{FieldDef, IndexDef};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;

/// Internal alteration kind that field-level operations map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlterationKind {
    Add,
    Drop,
    Change,
    Rename,
}

impl AlterationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlterationKind::Add => "add",
            AlterationKind::Drop => "drop",
            AlterationKind::Change => "change",
            AlterationKind::Rename => "rename",
        }
    }
}

impl fmt::Display for AlterationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields and indexes carrying full definitions (`add` and `change`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefinitionBucket {
    pub fields: IndexMap<FieldName, FieldDef>,
    pub indexes: IndexMap<IndexName, IndexDef>,
}

impl DefinitionBucket {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.indexes.is_empty()
    }
}

/// Fields and indexes to drop; only names are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DropBucket {
    pub fields: IndexSet<FieldName>,
    pub indexes: IndexSet<IndexName>,
}

impl DropBucket {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.indexes.is_empty()
    }
}

/// Everything accumulated for one table during a run.
///
/// Renames live in `change`: the entry is keyed by the current column name
/// and its definition's `name` holds the new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlterationSet {
    pub add: DefinitionBucket,
    pub drop: DropBucket,
    pub change: DefinitionBucket,
    /// Secondary indexes on the table when the set was first given a field
    /// entry. `None` until read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_indexes: Option<IndexMap<IndexName, IndexDef>>,
}

impl AlterationSet {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.drop.is_empty() && self.change.is_empty()
    }

    /// Number of individual field and index entries.
    pub fn len(&self) -> usize {
        self.add.fields.len()
            + self.add.indexes.len()
            + self.drop.fields.len()
            + self.drop.indexes.len()
            + self.change.fields.len()
            + self.change.indexes.len()
    }

    /// True when the set renders column statements, not only index ones.
    pub fn alters_columns(&self) -> bool {
        !(self.add.fields.is_empty() && self.drop.fields.is_empty() && self.change.fields.is_empty())
    }

    /// Existing indexes that no entry in this set drops, changes or adds.
    pub fn untouched_indexes(&self) -> impl Iterator<Item = (&IndexName, &IndexDef)> {
        self.existing_indexes
            .iter()
            .flatten()
            .filter(move |(index, _)| {
                !self.drop.indexes.contains(*index)
                    && !self.change.indexes.contains_key(*index)
                    && !self.add.indexes.contains_key(*index)
            })
    }
}
