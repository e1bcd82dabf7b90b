//! Untyped property bags and the append merge used by load hooks.
//!
//! Declarations arrive as JSON objects. Module types decode the bag into a
//! typed struct with serde; load hooks extend it through [`append`] before
//! that happens.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::BuildError;

/// A module's raw properties, keyed by property name.
pub type Properties = Map<String, Value>;

/// Merge `src` into `dst`.
///
/// Lists append, skipping values already present. Strings concatenate,
/// booleans OR, objects merge recursively. A `null` in `src` leaves `dst`
/// untouched. Any other kind mismatch is an error naming the property.
pub fn append(dst: &mut Properties, src: Properties) -> Result<(), BuildError> {
    append_at("", dst, src)
}

fn append_at(prefix: &str, dst: &mut Properties, src: Properties) -> Result<(), BuildError> {
    for (key, value) in src {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        if value.is_null() {
            continue;
        }

        let Some(existing) = dst.get_mut(&key) else {
            dst.insert(key, value);
            continue;
        };

        match (existing, value) {
            (Value::Array(have), Value::Array(more)) => {
                for item in more {
                    if !have.contains(&item) {
                        have.push(item);
                    }
                }
            }
            (Value::String(have), Value::String(more)) => have.push_str(&more),
            (Value::Bool(have), Value::Bool(more)) => *have |= more,
            (Value::Object(have), Value::Object(more)) => append_at(&path, have, more)?,
            (slot @ Value::Null, value) => *slot = value,
            (have, more) => {
                return Err(BuildError::InvalidProperty {
                    property: path,
                    reason: format!(
                        "cannot append {} to {}",
                        kind_name(&more),
                        kind_name(have)
                    ),
                })
            }
        }
    }
    Ok(())
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Decode a property bag into a typed struct.
pub fn decode<T: DeserializeOwned>(props: &Properties) -> Result<T, BuildError> {
    serde_json::from_value(Value::Object(props.clone())).map_err(|e| {
        BuildError::InvalidProperty {
            property: "<module>".to_string(),
            reason: e.to_string(),
        }
    })
}

/// Remove and return the string property `key`, which must be non-empty.
pub fn take_required_string(props: &mut Properties, key: &'static str) -> Result<String, BuildError> {
    match props.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(BuildError::MissingProperty(key)),
        Some(other) => Err(BuildError::InvalidProperty {
            property: key.to_string(),
            reason: format!("expected string, found {}", kind_name(&other)),
        }),
    }
}

/// Remove and return the boolean property `key`, defaulting to false.
pub fn take_bool(props: &mut Properties, key: &'static str) -> Result<bool, BuildError> {
    match props.remove(key) {
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Null) | None => Ok(false),
        Some(other) => Err(BuildError::InvalidProperty {
            property: key.to_string(),
            reason: format!("expected bool, found {}", kind_name(&other)),
        }),
    }
}
