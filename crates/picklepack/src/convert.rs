//! `Value` ⇄ `serde_json::Value` interop for fixtures and debugging.

use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("`{kind}` has no JSON representation")]
    Unrepresentable { kind: &'static str },
    #[error("dict key is not a string")]
    NonStringKey,
}

/// Converts a plain value graph to JSON.
///
/// Tensors, objects, and non-finite doubles have no JSON form; dict keys
/// must be strings. Cyclic graphs are not supported here.
pub fn value_to_json(value: &Value) -> Result<JsonValue, ConvertError> {
    match value {
        Value::None => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Int(int) => Ok(JsonValue::Number(Number::from(*int))),
        Value::Double(double) => Number::from_f64(*double)
            .map(JsonValue::Number)
            .ok_or(ConvertError::Unrepresentable {
                kind: "non-finite double",
            }),
        Value::Str(s) => Ok(JsonValue::String(s.clone())),
        Value::List(items) => items
            .borrow()
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::Dict(pairs) => {
            let mut map = Map::new();
            for (key, val) in pairs.borrow().iter() {
                let key = match key {
                    Value::Str(s) => s.clone(),
                    _ => return Err(ConvertError::NonStringKey),
                };
                map.insert(key, value_to_json(val)?);
            }
            Ok(JsonValue::Object(map))
        }
        Value::Object(_) => Err(ConvertError::Unrepresentable { kind: "object" }),
        Value::Tensor(_) => Err(ConvertError::Unrepresentable { kind: "tensor" }),
    }
}

/// Converts JSON to a plain value graph. Numbers that fit `i64` become
/// integers, everything else becomes a double.
pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::None,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(number) => match number.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        JsonValue::Object(map) => Value::dict(
            map.iter()
                .map(|(key, val)| (Value::Str(key.clone()), json_to_value(val)))
                .collect(),
        ),
    }
}
