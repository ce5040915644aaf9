//! JSON encoding and decoding: json:encode, json:decode, json:pretty
//!
//! Type mapping:
//! - Lisp Map ↔ JSON object (map keys are rendered via `to-str`, same as printing)
//! - Lisp List/Vector ↔ JSON array
//! - Lisp Number ↔ JSON number
//! - Lisp String ↔ JSON string
//! - Lisp Bool ↔ JSON boolean
//! - Lisp Nil ↔ JSON null
//!
//! Decoding always produces a `Map`, never a `Vector` — JSON has no concept
//! distinguishing the two.

use crate::env::Environment;
use crate::error::EvalError;
use crate::help::HelpEntry;
use crate::value::Value;
use std::sync::Arc;

fn value_to_json(value: &Value) -> Result<serde_json::Value, EvalError> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| EvalError::value_error("json:encode", format!("cannot convert {} to JSON", n))),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::List(items) | Value::Vector(items) => {
            let encoded: Result<Vec<_>, _> = items.iter().map(value_to_json).collect();
            Ok(serde_json::Value::Array(encoded?))
        }
        Value::Map(pairs) => {
            let mut obj = serde_json::Map::new();
            for (key, val) in pairs {
                obj.insert(format!("{}", key), value_to_json(val)?);
            }
            Ok(serde_json::Value::Object(obj))
        }
        other => Err(EvalError::value_error("json:encode", format!("cannot convert {} to JSON", other.type_name()))),
    }
}

pub(crate) fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Vector(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Map(
            obj.iter()
                .map(|(k, v)| (Value::String(k.clone()), json_to_value(v)))
                .collect(),
        ),
    }
}

fn builtin_json_encode(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("json:encode", "1", args.len()));
    }
    let json = value_to_json(&args[0])?;
    let text = serde_json::to_string(&json).map_err(|e| EvalError::runtime("json:encode", e.to_string()))?;
    Ok(Value::String(text))
}

fn builtin_json_decode(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("json:decode", "1", args.len()));
    }
    let text = match &args[0] {
        Value::String(s) => s,
        other => return Err(EvalError::type_error("json:decode", "string", other, 1)),
    };
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| EvalError::value_error("json:decode", e.to_string()))?;
    Ok(json_to_value(&json))
}

fn builtin_json_pretty(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("json:pretty", "1", args.len()));
    }
    let json = value_to_json(&args[0])?;
    let text = serde_json::to_string_pretty(&json).map_err(|e| EvalError::runtime("json:pretty", e.to_string()))?;
    Ok(Value::String(text))
}

pub fn register(env: &Arc<Environment>) {
    env.define("json:encode".to_string(), Value::BuiltIn(builtin_json_encode));
    env.define("json:decode".to_string(), Value::BuiltIn(builtin_json_decode));
    env.define("json:pretty".to_string(), Value::BuiltIn(builtin_json_pretty));

    let entries = [
        ("json:encode", "(json:encode value)", "Encodes a Lisp value as a JSON string.", "(json:encode {\"name\" \"Alice\"}) => \"{\\\"name\\\":\\\"Alice\\\"}\""),
        ("json:decode", "(json:decode json-string)", "Decodes a JSON string into a Lisp value. Objects decode to Map, arrays to Vector.", "(json:decode \"[1,2,3]\") => [1 2 3]"),
        ("json:pretty", "(json:pretty value)", "Like json:encode, but indented for readability.", "(json:pretty {\"x\" 1}) => pretty-printed JSON"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: vec!["json:encode".to_string(), "json:decode".to_string(), "json:pretty".to_string()],
            category: "JSON".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip_on_map() {
        let m = Value::Map(vec![(Value::String("a".to_string()), Value::Number(1.0))]);
        let encoded = builtin_json_encode(&[m]).unwrap();
        let decoded = builtin_json_decode(&[encoded]).unwrap();
        assert!(matches!(decoded, Value::Map(_)));
    }

    #[test]
    fn test_decode_rejects_non_string() {
        assert!(builtin_json_decode(&[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_decode_array_produces_vector() {
        let decoded = builtin_json_decode(&[Value::String("[1,2,3]".to_string())]).unwrap();
        assert!(matches!(decoded, Value::Vector(ref v) if v.len() == 3));
    }
}
