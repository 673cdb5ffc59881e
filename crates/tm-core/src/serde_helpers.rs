//! Shared serde helper functions used across multiple modules.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accept either a single value or a list of values.
///
/// Index definitions name their columns as `column: email` or
/// `column: [last_name, first_name]`.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Keep an explicitly written `~` apart from an absent attribute.
///
/// Used with `#[serde(default)]`: a missing key stays `None`, `key: ~`
/// becomes `Some` of the type's null (`None` or `Value::Null`).
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Serde default for the precheck strategy name.
pub(crate) fn default_precheck() -> String {
    "allow".to_string()
}
