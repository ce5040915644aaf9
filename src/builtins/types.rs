//! Type predicates: is-number?, is-string?, is-list?, is-vector?, is-map?,
//! is-boolean?, is-nil?, is-function?, plus a bonus symbol?

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

macro_rules! predicate {
    ($fn_name:ident, $name:literal, $pattern:pat) => {
        pub fn $fn_name(args: &[Value]) -> Result<Value, EvalError> {
            if args.len() != 1 {
                return Err(EvalError::arity($name, "1", args.len()));
            }
            Ok(Value::Bool(matches!(args[0], $pattern)))
        }
    };
}

predicate!(builtin_is_number_p, "is-number?", Value::Number(_));
predicate!(builtin_is_string_p, "is-string?", Value::String(_));
predicate!(builtin_is_list_p, "is-list?", Value::List(_));
predicate!(builtin_is_vector_p, "is-vector?", Value::Vector(_));
predicate!(builtin_is_map_p, "is-map?", Value::Map(_));
predicate!(builtin_is_boolean_p, "is-boolean?", Value::Bool(_));
predicate!(builtin_is_nil_p, "is-nil?", Value::Nil);
predicate!(builtin_symbol_p, "symbol?", Value::Symbol(_));

/// `(is-function? val)` tests if val is callable (a lambda or builtin).
pub fn builtin_is_function_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("is-function?", "1", args.len()));
    }
    Ok(Value::Bool(args[0].is_callable()))
}

pub fn register(env: &Arc<Environment>) {
    env.define("is-number?".to_string(), Value::BuiltIn(builtin_is_number_p));
    env.define("is-string?".to_string(), Value::BuiltIn(builtin_is_string_p));
    env.define("is-list?".to_string(), Value::BuiltIn(builtin_is_list_p));
    env.define("is-vector?".to_string(), Value::BuiltIn(builtin_is_vector_p));
    env.define("is-map?".to_string(), Value::BuiltIn(builtin_is_map_p));
    env.define("is-boolean?".to_string(), Value::BuiltIn(builtin_is_boolean_p));
    env.define("is-nil?".to_string(), Value::BuiltIn(builtin_is_nil_p));
    env.define("is-function?".to_string(), Value::BuiltIn(builtin_is_function_p));
    env.define("symbol?".to_string(), Value::BuiltIn(builtin_symbol_p));

    let entries = [
        ("is-number?", "(is-number? val)", "Tests if val is a number.", "(is-number? 42) => true"),
        ("is-string?", "(is-string? val)", "Tests if val is a string.", "(is-string? \"hi\") => true"),
        ("is-list?", "(is-list? val)", "Tests if val is a list.", "(is-list? '(1 2)) => true"),
        ("is-vector?", "(is-vector? val)", "Tests if val is a vector.", "(is-vector? [1 2]) => true"),
        ("is-map?", "(is-map? val)", "Tests if val is a hash-map.", "(is-map? (hash-map :a 1)) => true"),
        ("is-boolean?", "(is-boolean? val)", "Tests if val is a boolean.", "(is-boolean? true) => true"),
        ("is-nil?", "(is-nil? val)", "Tests if val is nil.", "(is-nil? nil) => true"),
        ("is-function?", "(is-function? val)", "Tests if val is callable (a function or builtin).", "(is-function? (fn [x] x)) => true"),
        ("symbol?", "(symbol? val)", "Tests if val is a symbol.", "(symbol? 'hello) => true"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: vec!["is-nil?".to_string(), "is-function?".to_string()],
            category: "Type predicates".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_number() {
        assert!(matches!(builtin_is_number_p(&[Value::Number(1.0)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_is_number_p(&[Value::Nil]), Ok(Value::Bool(false))));
    }

    #[test]
    fn test_is_vector_vs_list() {
        assert!(matches!(builtin_is_vector_p(&[Value::Vector(vec![])]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_is_vector_p(&[Value::List(vec![])]), Ok(Value::Bool(false))));
    }

    #[test]
    fn test_is_function() {
        assert!(matches!(builtin_is_function_p(&[Value::BuiltIn(builtin_is_number_p)]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_is_function_p(&[Value::Number(1.0)]), Ok(Value::Bool(false))));
    }
}
