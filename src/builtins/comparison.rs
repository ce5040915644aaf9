//! Comparison operations: =, <, >, <=, >=, equal?
//!
//! `=` compares numeric magnitude (variadic chain). `equal?` performs deep
//! structural equality across all value types, keeping the two concerns
//! distinct rather than overloading one operator.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

fn as_number(fn_name: &str, arg: &Value, position: usize) -> Result<f64, EvalError> {
    match arg {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::type_error(fn_name, "number", other, position)),
    }
}

fn chain(fn_name: &str, args: &[Value], op: impl Fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity(fn_name, "at least 2", args.len()));
    }
    for i in 0..args.len() - 1 {
        let a = as_number(fn_name, &args[i], i + 1)?;
        let b = as_number(fn_name, &args[i + 1], i + 2)?;
        if !op(a, b) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// `(= ...)` compares numeric magnitude across a chain of numbers.
pub fn builtin_eq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity("=", "at least 2", args.len()));
    }
    for pair in args.windows(2) {
        if !pair[0].numeric_eq(&pair[1]) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// `(equal? a b)` performs deep structural equality.
pub fn builtin_equal(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("equal?", "2", args.len()));
    }
    Ok(Value::Bool(args[0].equal(&args[1])))
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, EvalError> {
    chain("<", args, |a, b| a < b)
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, EvalError> {
    chain(">", args, |a, b| a > b)
}

pub fn builtin_le(args: &[Value]) -> Result<Value, EvalError> {
    chain("<=", args, |a, b| a <= b)
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, EvalError> {
    chain(">=", args, |a, b| a >= b)
}

pub fn register(env: &Arc<Environment>) {
    env.define("=".to_string(), Value::BuiltIn(builtin_eq));
    env.define("equal?".to_string(), Value::BuiltIn(builtin_equal));
    env.define("<".to_string(), Value::BuiltIn(builtin_lt));
    env.define(">".to_string(), Value::BuiltIn(builtin_gt));
    env.define("<=".to_string(), Value::BuiltIn(builtin_le));
    env.define(">=".to_string(), Value::BuiltIn(builtin_ge));

    crate::help::register_help(crate::help::HelpEntry {
        name: "=".to_string(),
        signature: "(= ...)".to_string(),
        description: "Tests numeric magnitude equality across a chain of numbers.".to_string(),
        examples: vec!["(= 5 5 5) => true".to_string(), "(= 5 6) => false".to_string()],
        related: vec!["equal?".to_string()],
        category: "Comparison".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "equal?".to_string(),
        signature: "(equal? a b)".to_string(),
        description: "Tests deep structural equality. Vectors and lists with the same elements are not equal? to each other.".to_string(),
        examples: vec!["(equal? [1 2] [1 2]) => true".to_string(), "(equal? '(1 2) [1 2]) => false".to_string()],
        related: vec!["=".to_string()],
        category: "Comparison".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "<".to_string(),
        signature: "(< ...)".to_string(),
        description: "Tests if each argument is strictly less than the next.".to_string(),
        examples: vec!["(< 1 2 3) => true".to_string(), "(< 1 1) => false".to_string()],
        related: vec![">".to_string(), "<=".to_string(), ">=".to_string()],
        category: "Comparison".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: ">".to_string(),
        signature: "(> ...)".to_string(),
        description: "Tests if each argument is strictly greater than the next.".to_string(),
        examples: vec!["(> 3 2 1) => true".to_string()],
        related: vec!["<".to_string(), "<=".to_string(), ">=".to_string()],
        category: "Comparison".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "<=".to_string(),
        signature: "(<= ...)".to_string(),
        description: "Tests if each argument is less than or equal to the next.".to_string(),
        examples: vec!["(<= 1 2 2 3) => true".to_string()],
        related: vec!["<".to_string(), ">".to_string(), ">=".to_string()],
        category: "Comparison".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: ">=".to_string(),
        signature: "(>= ...)".to_string(),
        description: "Tests if each argument is greater than or equal to the next.".to_string(),
        examples: vec!["(>= 3 2 2 1) => true".to_string()],
        related: vec!["<".to_string(), ">".to_string(), "<=".to_string()],
        category: "Comparison".to_string(),
    });
}
