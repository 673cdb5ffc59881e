//! Operation types and their typed payloads.
//!
//! Migration files map operation-type keys to loosely shaped YAML payloads.
//! [`Operation::parse`] turns one of those payloads into a typed value so the
//! engine never inspects raw YAML.

use crate::alteration::AlterationKind;
use crate::error::{CoreError, CoreResult};
use crate::names::{FieldName, IndexName, TableName};
use crate::schema::{FieldDef, IndexDef, TableDef, INDEXES_KEY};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;

/// A recognized operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateTable,
    DropTable,
    RenameTable,
    CreateField,
    DropField,
    AlterField,
    RenameField,
}

impl OperationType {
    /// Fixed execution order. Drops and renames come before additions to
    /// avoid name collisions, and whole-table operations come before field
    /// operations that rely on the final table identity.
    pub const EXECUTION_ORDER: [OperationType; 7] = [
        OperationType::DropTable,
        OperationType::RenameTable,
        OperationType::CreateTable,
        OperationType::DropField,
        OperationType::RenameField,
        OperationType::AlterField,
        OperationType::CreateField,
    ];

    /// Parse an operation key as written in a migration file.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "create_table" => Some(OperationType::CreateTable),
            "drop_table" => Some(OperationType::DropTable),
            "rename_table" => Some(OperationType::RenameTable),
            "create_field" => Some(OperationType::CreateField),
            "drop_field" => Some(OperationType::DropField),
            "alter_field" => Some(OperationType::AlterField),
            "rename_field" => Some(OperationType::RenameField),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::CreateTable => "create_table",
            OperationType::DropTable => "drop_table",
            OperationType::RenameTable => "rename_table",
            OperationType::CreateField => "create_field",
            OperationType::DropField => "drop_field",
            OperationType::AlterField => "alter_field",
            OperationType::RenameField => "rename_field",
        }
    }

    /// Position in [`EXECUTION_ORDER`](Self::EXECUTION_ORDER).
    pub fn priority(&self) -> usize {
        match self {
            OperationType::DropTable => 0,
            OperationType::RenameTable => 1,
            OperationType::CreateTable => 2,
            OperationType::DropField => 3,
            OperationType::RenameField => 4,
            OperationType::AlterField => 5,
            OperationType::CreateField => 6,
        }
    }

    /// The alteration kind for field-level operations, `None` for
    /// whole-table operations.
    pub fn alteration_kind(&self) -> Option<AlterationKind> {
        match self {
            OperationType::CreateField => Some(AlterationKind::Add),
            OperationType::DropField => Some(AlterationKind::Drop),
            OperationType::AlterField => Some(AlterationKind::Change),
            OperationType::RenameField => Some(AlterationKind::Rename),
            OperationType::CreateTable | OperationType::DropTable | OperationType::RenameTable => {
                None
            }
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with one field inside a field-level operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRequest {
    /// Add or change with this (possibly partial) definition
    Define(FieldDef),
    /// Drop the field
    Drop,
    /// Rename the field
    RenameTo(FieldName),
}

/// What to do with one index inside a field-level operation.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexRequest {
    Define(IndexDef),
    Drop,
    RenameTo(IndexName),
}

/// Field and index requests for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRequests {
    pub fields: IndexMap<FieldName, FieldRequest>,
    pub indexes: IndexMap<IndexName, IndexRequest>,
}

/// A typed operation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable(IndexMap<TableName, TableDef>),
    DropTable(Vec<TableName>),
    RenameTable(IndexMap<TableName, TableName>),
    Alter {
        kind: AlterationKind,
        tables: IndexMap<TableName, FieldRequests>,
    },
}

impl Operation {
    /// Parse the payload of an operation of type `op`.
    pub fn parse(op: OperationType, payload: &Value) -> CoreResult<Self> {
        match op {
            OperationType::CreateTable => {
                let mut tables = IndexMap::new();
                for (key, value) in mapping(op, payload)? {
                    let table: TableName = name(op, key)?;
                    let def = TableDef::from_value(op.as_str(), value)?;
                    tables.insert(table, def);
                }
                Ok(Operation::CreateTable(tables))
            }
            OperationType::DropTable => Ok(Operation::DropTable(names(op, payload)?)),
            OperationType::RenameTable => {
                let mut renames = IndexMap::new();
                for (old, new) in mapping(op, payload)? {
                    renames.insert(name(op, old)?, name(op, new)?);
                }
                Ok(Operation::RenameTable(renames))
            }
            OperationType::CreateField => parse_alter(op, AlterationKind::Add, payload),
            OperationType::DropField => parse_alter(op, AlterationKind::Drop, payload),
            OperationType::AlterField => parse_alter(op, AlterationKind::Change, payload),
            OperationType::RenameField => parse_alter(op, AlterationKind::Rename, payload),
        }
    }
}

fn invalid(op: OperationType, message: impl Into<String>) -> CoreError {
    CoreError::InvalidPayload {
        operation: op.as_str().to_string(),
        message: message.into(),
    }
}

fn mapping(op: OperationType, value: &Value) -> CoreResult<&Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| invalid(op, format!("expected a mapping, found {}", kind_of(value))))
}

fn name<T>(op: OperationType, value: &Value) -> CoreResult<T>
where
    T: for<'a> TryFrom<&'a str>,
{
    value
        .as_str()
        .and_then(|s| T::try_from(s).ok())
        .ok_or_else(|| invalid(op, format!("expected a non-empty name, found {value:?}")))
}

/// A list of names, or the keys of a mapping.
fn names<T>(op: OperationType, value: &Value) -> CoreResult<Vec<T>>
where
    T: for<'a> TryFrom<&'a str>,
{
    match value {
        Value::Sequence(items) => items.iter().map(|item| name(op, item)).collect(),
        Value::Mapping(map) => map.keys().map(|key| name(op, key)).collect(),
        other => Err(invalid(
            op,
            format!("expected a list of names, found {}", kind_of(other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn parse_alter(op: OperationType, kind: AlterationKind, payload: &Value) -> CoreResult<Operation> {
    let mut tables = IndexMap::new();
    for (key, value) in mapping(op, payload)? {
        let table: TableName = name(op, key)?;
        let requests = match (kind, value) {
            // drop_field tolerates a plain list of field names
            (AlterationKind::Drop, Value::Sequence(_)) => FieldRequests {
                fields: names::<FieldName>(op, value)?
                    .into_iter()
                    .map(|field| (field, FieldRequest::Drop))
                    .collect(),
                indexes: IndexMap::new(),
            },
            (_, Value::Mapping(fields)) => parse_field_requests(op, kind, fields)?,
            (_, other) => {
                return Err(invalid(
                    op,
                    format!(
                        "table '{table}': expected a mapping of fields, found {}",
                        kind_of(other)
                    ),
                ))
            }
        };
        tables.insert(table, requests);
    }
    Ok(Operation::Alter { kind, tables })
}

fn parse_field_requests(
    op: OperationType,
    kind: AlterationKind,
    fields: &Mapping,
) -> CoreResult<FieldRequests> {
    let mut requests = FieldRequests::default();
    for (key, value) in fields {
        if key.as_str() == Some(INDEXES_KEY) {
            requests.indexes = parse_index_requests(op, kind, value)?;
            continue;
        }
        let field: FieldName = name(op, key)?;
        let request = match kind {
            AlterationKind::Add | AlterationKind::Change => {
                let def = FieldDef::from_value(value)
                    .map_err(|e| invalid(op, format!("field '{field}': {e}")))?;
                FieldRequest::Define(def)
            }
            AlterationKind::Drop => FieldRequest::Drop,
            AlterationKind::Rename => FieldRequest::RenameTo(name(op, value)?),
        };
        requests.fields.insert(field, request);
    }
    Ok(requests)
}

fn parse_index_requests(
    op: OperationType,
    kind: AlterationKind,
    value: &Value,
) -> CoreResult<IndexMap<IndexName, IndexRequest>> {
    match kind {
        // Index drops may be a list of names; convert to the keyed form.
        AlterationKind::Drop => Ok(names::<IndexName>(op, value)?
            .into_iter()
            .map(|index| (index, IndexRequest::Drop))
            .collect()),
        AlterationKind::Add | AlterationKind::Change => {
            let defs: IndexMap<IndexName, IndexDef> = serde_yaml::from_value(value.clone())
                .map_err(|e| invalid(op, format!("indexes: {e}")))?;
            Ok(defs
                .into_iter()
                .map(|(index, def)| (index, IndexRequest::Define(def)))
                .collect())
        }
        AlterationKind::Rename => {
            let mut renames = IndexMap::new();
            for (old, new) in mapping(op, value)? {
                renames.insert(name(op, old)?, IndexRequest::RenameTo(name(op, new)?));
            }
            Ok(renames)
        }
    }
}

#[cfg(test)]
#[path = "operation_test.rs"]
mod tests;
