//! Arithmetic operations: +, -, *, /, %, abs, min, max

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

/// `(+ ...)` returns the sum of all arguments. `(+) => 0`.
pub fn builtin_add(args: &[Value]) -> Result<Value, EvalError> {
    let mut sum = 0.0;
    for (i, arg) in args.iter().enumerate() {
        sum += as_number("+", arg, i + 1)?;
    }
    Ok(Value::Number(sum))
}

/// `(- ...)` subtracts subsequent arguments from the first; negates a single argument.
pub fn builtin_sub(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("-", "at least 1", 0));
    }
    let first = as_number("-", &args[0], 1)?;
    if args.len() == 1 {
        return Ok(Value::Number(-first));
    }
    let mut result = first;
    for (i, arg) in args[1..].iter().enumerate() {
        result -= as_number("-", arg, i + 2)?;
    }
    Ok(Value::Number(result))
}

/// `(* ...)` returns the product of all arguments. `(*) => 1`.
pub fn builtin_mul(args: &[Value]) -> Result<Value, EvalError> {
    let mut product = 1.0;
    for (i, arg) in args.iter().enumerate() {
        product *= as_number("*", arg, i + 1)?;
    }
    Ok(Value::Number(product))
}

/// `(/ ...)` divides the first argument by subsequent ones; reciprocates a single argument.
pub fn builtin_div(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("/", "at least 1", 0));
    }
    let first = as_number("/", &args[0], 1)?;
    if args.len() == 1 {
        if first == 0.0 {
            return Err(EvalError::zero_division("/"));
        }
        return Ok(Value::Number(1.0 / first));
    }
    let mut result = first;
    for (i, arg) in args[1..].iter().enumerate() {
        let n = as_number("/", arg, i + 2)?;
        if n == 0.0 {
            return Err(EvalError::zero_division("/"));
        }
        result /= n;
    }
    Ok(Value::Number(result))
}

/// `(% num1 num2)` returns the remainder of num1 / num2.
pub fn builtin_mod(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("%", "2", args.len()));
    }
    let a = as_number("%", &args[0], 1)?;
    let b = as_number("%", &args[1], 2)?;
    if b == 0.0 {
        return Err(EvalError::zero_division("%"));
    }
    Ok(Value::Number(a % b))
}

/// `(abs n)` returns the absolute value of n.
pub fn builtin_abs(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("abs", "1", args.len()));
    }
    Ok(Value::Number(as_number("abs", &args[0], 1)?.abs()))
}

/// `(min ...)` returns the smallest of its arguments.
pub fn builtin_min(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("min", "at least 1", 0));
    }
    let mut result = as_number("min", &args[0], 1)?;
    for (i, arg) in args[1..].iter().enumerate() {
        result = result.min(as_number("min", arg, i + 2)?);
    }
    Ok(Value::Number(result))
}

/// `(max ...)` returns the largest of its arguments.
pub fn builtin_max(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("max", "at least 1", 0));
    }
    let mut result = as_number("max", &args[0], 1)?;
    for (i, arg) in args[1..].iter().enumerate() {
        result = result.max(as_number("max", arg, i + 2)?);
    }
    Ok(Value::Number(result))
}

pub fn register(env: &Arc<Environment>) {
    env.define("+".to_string(), Value::BuiltIn(builtin_add));
    env.define("-".to_string(), Value::BuiltIn(builtin_sub));
    env.define("*".to_string(), Value::BuiltIn(builtin_mul));
    env.define("/".to_string(), Value::BuiltIn(builtin_div));
    env.define("%".to_string(), Value::BuiltIn(builtin_mod));
    env.define("abs".to_string(), Value::BuiltIn(builtin_abs));
    env.define("min".to_string(), Value::BuiltIn(builtin_min));
    env.define("max".to_string(), Value::BuiltIn(builtin_max));

    crate::help::register_help(crate::help::HelpEntry {
        name: "+".to_string(),
        signature: "(+ ...)".to_string(),
        description: "Returns the sum of all arguments.".to_string(),
        examples: vec!["(+ 1 2 3) => 6".to_string(), "(+) => 0".to_string()],
        related: vec!["-".to_string(), "*".to_string(), "/".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "-".to_string(),
        signature: "(- ...)".to_string(),
        description: "Subtracts subsequent arguments from the first. With one argument, negates it.".to_string(),
        examples: vec!["(- 10 3 2) => 5".to_string(), "(- 5) => -5".to_string()],
        related: vec!["+".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "*".to_string(),
        signature: "(* ...)".to_string(),
        description: "Returns the product of all arguments.".to_string(),
        examples: vec!["(* 2 3 4) => 24".to_string(), "(*) => 1".to_string()],
        related: vec!["/".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "/".to_string(),
        signature: "(/ ...)".to_string(),
        description: "Divides the first argument by subsequent ones. With one argument, returns its reciprocal.".to_string(),
        examples: vec!["(/ 20 4) => 5".to_string(), "(/ 100 2 5) => 10".to_string()],
        related: vec!["%".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "%".to_string(),
        signature: "(% num1 num2)".to_string(),
        description: "Returns the remainder when num1 is divided by num2.".to_string(),
        examples: vec!["(% 17 5) => 2".to_string()],
        related: vec!["/".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "abs".to_string(),
        signature: "(abs n)".to_string(),
        description: "Returns the absolute value of n.".to_string(),
        examples: vec!["(abs -5) => 5".to_string()],
        related: vec!["min".to_string(), "max".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "min".to_string(),
        signature: "(min ...)".to_string(),
        description: "Returns the smallest of its arguments.".to_string(),
        examples: vec!["(min 3 1 2) => 1".to_string()],
        related: vec!["max".to_string()],
        category: "Arithmetic".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "max".to_string(),
        signature: "(max ...)".to_string(),
        description: "Returns the largest of its arguments.".to_string(),
        examples: vec!["(max 3 1 2) => 3".to_string()],
        related: vec!["min".to_string()],
        category: "Arithmetic".to_string(),
    });
}
