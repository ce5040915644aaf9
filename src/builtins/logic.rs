//! Logic operations: and, or, not
//!
//! Ordinary (eagerly-evaluated) builtins, not special forms — by the time
//! these run, every argument has already been evaluated, so there is no
//! short-circuiting of side effects. Truthiness follows the universal rule:
//! only `false` and `nil` are falsy, every other value (including `0` and
//! `""`) is truthy.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

/// Returns `false` if any argument is falsy, otherwise the last argument.
pub fn builtin_and(args: &[Value]) -> Result<Value, EvalError> {
    let mut last = Value::Bool(true);
    for arg in args {
        if !arg.is_truthy() {
            return Ok(Value::Bool(false));
        }
        last = arg.clone();
    }
    Ok(last)
}

/// Returns the first truthy argument, or `false` if all are falsy.
pub fn builtin_or(args: &[Value]) -> Result<Value, EvalError> {
    for arg in args {
        if arg.is_truthy() {
            return Ok(arg.clone());
        }
    }
    Ok(Value::Bool(false))
}

/// Returns `true` if the argument is falsy (`false` or `nil`), else `false`.
pub fn builtin_not(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("not", "1", args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

pub fn register(env: &Arc<Environment>) {
    env.define("and".to_string(), Value::BuiltIn(builtin_and));
    env.define("or".to_string(), Value::BuiltIn(builtin_or));
    env.define("not".to_string(), Value::BuiltIn(builtin_not));

    crate::help::register_help(crate::help::HelpEntry {
        name: "and".to_string(),
        signature: "(and ...)".to_string(),
        description: "Returns false if any argument is falsy, otherwise returns the last argument.".to_string(),
        examples: vec!["(and true true true) => true".to_string(), "(and 1 2 3) => 3".to_string()],
        related: vec!["or".to_string(), "not".to_string()],
        category: "Logic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "or".to_string(),
        signature: "(or ...)".to_string(),
        description: "Returns the first truthy argument, or false if all are falsy.".to_string(),
        examples: vec!["(or false false true) => true".to_string(), "(or nil 2) => 2".to_string()],
        related: vec!["and".to_string(), "not".to_string()],
        category: "Logic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "not".to_string(),
        signature: "(not val)".to_string(),
        description: "Returns true if val is falsy (false or nil), otherwise false.".to_string(),
        examples: vec!["(not false) => true".to_string(), "(not 5) => false".to_string()],
        related: vec!["and".to_string(), "or".to_string()],
        category: "Logic".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_generalizes_to_truthiness() {
        let args = [Value::Number(0.0), Value::String("".to_string())];
        assert!(matches!(builtin_and(&args), Ok(Value::String(s)) if s.is_empty()));
    }

    #[test]
    fn test_or_short_circuits_value() {
        let args = [Value::Bool(false), Value::Number(2.0)];
        assert!(matches!(builtin_or(&args), Ok(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn test_not() {
        assert!(matches!(builtin_not(&[Value::Nil]), Ok(Value::Bool(true))));
        assert!(matches!(builtin_not(&[Value::Number(0.0)]), Ok(Value::Bool(false))));
    }
}
