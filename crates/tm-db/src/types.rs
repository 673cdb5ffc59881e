//! DuckDB type names, identifier quoting and literal rendering.

use serde_yaml::Value;
use tm_core::FieldDef;

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal with single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// DuckDB column type for an abstract field definition.
///
/// Unknown type names pass through upper-cased, so dialect types such as
/// `DECIMAL(10,2)` can be written directly.
pub fn sql_type(def: &FieldDef) -> String {
    let Some(type_name) = def.type_name.as_deref() else {
        return "VARCHAR".to_string();
    };

    match type_name.to_ascii_lowercase().as_str() {
        "string" => match def.effective_length() {
            Some(len) => format!("VARCHAR({len})"),
            None => "VARCHAR".to_string(),
        },
        "text" => "VARCHAR".to_string(),
        "integer" => "INTEGER".to_string(),
        "biginteger" => "BIGINT".to_string(),
        "smallinteger" => "SMALLINT".to_string(),
        "float" => "DOUBLE".to_string(),
        "decimal" => "DECIMAL(18,3)".to_string(),
        "boolean" => "BOOLEAN".to_string(),
        "date" => "DATE".to_string(),
        "datetime" | "timestamp" => "TIMESTAMP".to_string(),
        "time" => "TIME".to_string(),
        "binary" => "BLOB".to_string(),
        "uuid" => "UUID".to_string(),
        _ => type_name.to_ascii_uppercase(),
    }
}

/// Abstract type name for a DuckDB `data_type` as reported by
/// `information_schema.columns`.
pub fn abstract_type(data_type: &str) -> String {
    let upper = data_type.trim().to_ascii_uppercase();
    let name = match upper.as_str() {
        "VARCHAR" => "string",
        "INTEGER" => "integer",
        "BIGINT" => "biginteger",
        "SMALLINT" => "smallinteger",
        "DOUBLE" => "float",
        "BOOLEAN" => "boolean",
        "DATE" => "date",
        "TIMESTAMP" => "timestamp",
        "TIME" => "time",
        "BLOB" => "binary",
        "UUID" => "uuid",
        _ => return upper,
    };
    name.to_string()
}

/// Render a YAML scalar as a SQL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_literal(s),
        other => quote_literal(
            serde_yaml::to_string(other)
                .unwrap_or_default()
                .trim_end(),
        ),
    }
}

/// The DEFAULT clause value for a definition, if any.
///
/// Introspected expressions are emitted verbatim; literals are quoted.
/// An explicit `default: ~` has no clause.
pub fn default_clause(def: &FieldDef) -> Option<String> {
    if let Some(expr) = &def.default_expr {
        return Some(expr.clone());
    }
    def.default
        .as_ref()
        .filter(|value| !value.is_null())
        .map(sql_literal)
}
