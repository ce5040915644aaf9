//! String conversion: to-str, to-int, to-float, to-bool

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

/// `(to-str val)` — renders val the same way `print` would.
pub fn builtin_to_str(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("to-str", "1", args.len()));
    }
    Ok(Value::String(format!("{}", args[0])))
}

/// `(to-int val)` — parses a string, truncates a number, or converts a bool.
pub fn builtin_to_int(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("to-int", "1", args.len()));
    }
    let n = match &args[0] {
        Value::Number(n) => n.trunc(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| EvalError::value_error("to-int", format!("cannot parse {:?} as an integer", s)))?
            .trunc(),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => return Err(EvalError::type_error("to-int", "number, string or boolean", other, 1)),
    };
    Ok(Value::Number(n))
}

/// `(to-float val)` — parses a string or converts a number/bool to a float.
pub fn builtin_to_float(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("to-float", "1", args.len()));
    }
    let n = match &args[0] {
        Value::Number(n) => *n,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| EvalError::value_error("to-float", format!("cannot parse {:?} as a float", s)))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        other => return Err(EvalError::type_error("to-float", "number, string or boolean", other, 1)),
    };
    Ok(Value::Number(n))
}

/// `(to-bool val)` — the same truthiness rule as `if`/`and`/`or`: only
/// `false` and `nil` convert to `false`.
pub fn builtin_to_bool(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("to-bool", "1", args.len()));
    }
    Ok(Value::Bool(args[0].is_truthy()))
}

pub fn register(env: &Arc<Environment>) {
    env.define("to-str".to_string(), Value::BuiltIn(builtin_to_str));
    env.define("to-int".to_string(), Value::BuiltIn(builtin_to_int));
    env.define("to-float".to_string(), Value::BuiltIn(builtin_to_float));
    env.define("to-bool".to_string(), Value::BuiltIn(builtin_to_bool));

    let entries = [
        ("to-str", "(to-str val)", "Renders val as a string, the same way print would.", "(to-str 42) => \"42\""),
        ("to-int", "(to-int val)", "Converts a number, string or boolean to an integer-valued number.", "(to-int \"42\") => 42"),
        ("to-float", "(to-float val)", "Converts a number, string or boolean to a float.", "(to-float \"3.5\") => 3.5"),
        ("to-bool", "(to-bool val)", "Converts val to a boolean using standard truthiness.", "(to-bool 0) => true"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: vec!["to-str".to_string(), "to-int".to_string(), "to-float".to_string(), "to-bool".to_string()],
            category: "String conversion".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int_parses_string() {
        assert!(matches!(builtin_to_int(&[Value::String("42".to_string())]), Ok(Value::Number(n)) if n == 42.0));
    }

    #[test]
    fn test_to_int_rejects_garbage() {
        assert!(builtin_to_int(&[Value::String("not a number".to_string())]).is_err());
    }

    #[test]
    fn test_to_bool_truthiness() {
        assert!(matches!(builtin_to_bool(&[Value::Number(0.0)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_to_bool(&[Value::Nil]), Ok(Value::Bool(false))));
    }
}
