//! Abstract column, index and table definitions.
//!
//! These are dialect-independent descriptions. A schema builder turns them
//! into SQL and a connection produces them from introspection, so both sides
//! of a migration speak the same shape.

use crate::error::{CoreError, CoreResult};
use crate::names::{FieldName, IndexName};
use crate::serde_helpers::{explicit_null, one_or_many};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Reserved key holding index definitions inside table and field payloads.
pub const INDEXES_KEY: &str = "indexes";

/// Reserved key holding table parameters inside a table payload.
pub const TABLE_PARAMETERS_KEY: &str = "tableParameters";

/// Index name denoting the primary key.
pub const PRIMARY_INDEX: &str = "PRIMARY";

/// Column-level key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Part of the primary key
    Primary,
    /// Unique column
    Unique,
}

/// A column definition.
///
/// Every attribute is optional so a definition can be a partial request
/// (`{type: date}`) that is later merged over the column's current state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    /// New column name; set by renames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<FieldName>,

    /// Abstract type name (`string`, `integer`, `date`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// `Some(None)` is an explicit `length: ~`, which clears a current length
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub length: Option<Option<u32>>,

    /// Whether the column accepts NULL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null: Option<bool>,

    /// Literal default value, quoted by the schema builder. An explicit
    /// `default: ~` is kept as `Some(Value::Null)` and removes the default.
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Default as a raw SQL expression, as reported by introspection.
    /// Emitted verbatim; never set from migration files.
    #[serde(skip)]
    pub default_expr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldDef {
    /// Definition with only a type set.
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    /// Decode a definition from an already-parsed YAML value.
    ///
    /// Inside a parsed `Value` the `null:` attribute key is YAML null rather
    /// than the string `"null"`, so keys are normalized first.
    pub fn from_value(value: &Value) -> Result<Self, serde_yaml::Error> {
        let value = match value {
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(key, item)| match key {
                        Value::Null => (Value::String("null".to_string()), item.clone()),
                        _ => (key.clone(), item.clone()),
                    })
                    .collect(),
            ),
            other => other.clone(),
        };
        serde_yaml::from_value(value)
    }

    /// Length to emit, if any.
    pub fn effective_length(&self) -> Option<u32> {
        self.length.flatten()
    }

    /// Overlay `self` on top of `base`: attributes set here win, including
    /// explicit nulls, and the rest are taken from `base`.
    pub fn merged_over(&self, base: &FieldDef) -> FieldDef {
        // A literal default and an expression default are one attribute.
        let (default, default_expr) = if self.default.is_some() || self.default_expr.is_some() {
            (self.default.clone(), self.default_expr.clone())
        } else {
            (base.default.clone(), base.default_expr.clone())
        };

        FieldDef {
            name: self.name.clone().or_else(|| base.name.clone()),
            type_name: self.type_name.clone().or_else(|| base.type_name.clone()),
            length: self.length.or(base.length),
            null: self.null.or(base.null),
            default,
            default_expr,
            key: self.key.or(base.key),
            comment: self.comment.clone().or_else(|| base.comment.clone()),
        }
    }

    /// True for the date/time type family (`date`, `datetime`, `time`,
    /// `timestamp`), which carries no length attribute.
    pub fn is_temporal(&self) -> bool {
        self.type_name.as_deref().is_some_and(|t| {
            let t = t.to_ascii_lowercase();
            t.starts_with("date") || t.starts_with("time")
        })
    }

    /// True when this definition declares a type equal to `other`'s type.
    pub fn same_type_as(&self, other: &FieldDef) -> bool {
        match (&self.type_name, &other.type_name) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

/// An index definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDef {
    /// Indexed columns, in order
    #[serde(deserialize_with = "one_or_many")]
    pub column: Vec<FieldName>,

    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    /// Index over the given columns.
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: columns.into_iter().map(FieldName::new).collect(),
            unique: false,
        }
    }

    /// Mark the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Table-level parameters.
///
/// Dialect-specific keys such as `charset` or `engine` are accepted and
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A complete table definition as used by `create_table`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDef {
    pub fields: IndexMap<FieldName, FieldDef>,
    pub indexes: IndexMap<IndexName, IndexDef>,
    pub parameters: TableParameters,
}

impl TableDef {
    /// Parse a table payload: every key is a field except the reserved
    /// `indexes` and `tableParameters` keys.
    ///
    /// `operation` names the payload's operation for error messages.
    pub fn from_value(operation: &str, value: &Value) -> CoreResult<Self> {
        let invalid = |message: String| CoreError::InvalidPayload {
            operation: operation.to_string(),
            message,
        };

        let map = value
            .as_mapping()
            .ok_or_else(|| invalid("expected a mapping of fields".to_string()))?;

        let mut def = TableDef::default();
        for (key, item) in map {
            let key = key
                .as_str()
                .ok_or_else(|| invalid(format!("field names must be strings, found {key:?}")))?;
            match key {
                INDEXES_KEY => {
                    def.indexes = serde_yaml::from_value(item.clone())
                        .map_err(|e| invalid(format!("indexes: {e}")))?;
                }
                TABLE_PARAMETERS_KEY => {
                    def.parameters = serde_yaml::from_value(item.clone())
                        .map_err(|e| invalid(format!("tableParameters: {e}")))?;
                }
                _ => {
                    let field = FieldName::try_new(key)
                        .ok_or_else(|| invalid("empty field name".to_string()))?;
                    let field_def = FieldDef::from_value(item)
                        .map_err(|e| invalid(format!("field '{field}': {e}")))?;
                    def.fields.insert(field, field_def);
                }
            }
        }

        if def.fields.is_empty() {
            return Err(invalid("table defines no fields".to_string()));
        }
        Ok(def)
    }

    /// Columns of the primary key: fields keyed `primary`, or the columns of
    /// an index named `PRIMARY`.
    pub fn primary_key(&self) -> Vec<&FieldName> {
        if let Some(index) = self.indexes.get(PRIMARY_INDEX) {
            return index.column.iter().collect();
        }
        self.fields
            .iter()
            .filter(|(_, f)| f.key == Some(KeyKind::Primary))
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
