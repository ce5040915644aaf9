//! BDD assertion built-ins: assert-equal?, assert-true?, assert-false?,
//! assert-nil?, assert-not-nil?
//!
//! Ordinary functions, not special forms — unlike `assert-raises?` (a
//! special form in `eval.rs`, since it must delay evaluation of its guarded
//! form). Each assertion here raises `EvalError::AssertionFailure` with a
//! descriptive message on mismatch and otherwise returns `true`. Equality
//! uses the deep `equal?` contract, not numeric `=`.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

pub fn builtin_assert_equal_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("assert-equal?", "2", args.len()));
    }
    if args[0].equal(&args[1]) {
        Ok(Value::Bool(true))
    } else {
        Err(EvalError::assertion(format!(
            "expected {} to equal {}",
            args[0], args[1]
        )))
    }
}

pub fn builtin_assert_true_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("assert-true?", "1", args.len()));
    }
    if matches!(args[0], Value::Bool(true)) {
        Ok(Value::Bool(true))
    } else {
        Err(EvalError::assertion(format!("expected true, got {}", args[0])))
    }
}

pub fn builtin_assert_false_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("assert-false?", "1", args.len()));
    }
    if matches!(args[0], Value::Bool(false)) {
        Ok(Value::Bool(true))
    } else {
        Err(EvalError::assertion(format!("expected false, got {}", args[0])))
    }
}

pub fn builtin_assert_nil_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("assert-nil?", "1", args.len()));
    }
    if matches!(args[0], Value::Nil) {
        Ok(Value::Bool(true))
    } else {
        Err(EvalError::assertion(format!("expected nil, got {}", args[0])))
    }
}

pub fn builtin_assert_not_nil_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("assert-not-nil?", "1", args.len()));
    }
    if matches!(args[0], Value::Nil) {
        Err(EvalError::assertion("expected a non-nil value, got nil"))
    } else {
        Ok(Value::Bool(true))
    }
}

pub fn register(env: &Arc<Environment>) {
    env.define("assert-equal?".to_string(), Value::BuiltIn(builtin_assert_equal_q));
    env.define("assert-true?".to_string(), Value::BuiltIn(builtin_assert_true_q));
    env.define("assert-false?".to_string(), Value::BuiltIn(builtin_assert_false_q));
    env.define("assert-nil?".to_string(), Value::BuiltIn(builtin_assert_nil_q));
    env.define("assert-not-nil?".to_string(), Value::BuiltIn(builtin_assert_not_nil_q));

    let entries = [
        ("assert-equal?", "(assert-equal? actual expected)", "Asserts deep structural equality. Raises an assertion failure on mismatch.", "(assert-equal? (+ 1 1) 2) => true"),
        ("assert-true?", "(assert-true? val)", "Asserts val is exactly true.", "(assert-true? (> 2 1)) => true"),
        ("assert-false?", "(assert-false? val)", "Asserts val is exactly false.", "(assert-false? (> 1 2)) => true"),
        ("assert-nil?", "(assert-nil? val)", "Asserts val is nil.", "(assert-nil? nil) => true"),
        ("assert-not-nil?", "(assert-not-nil? val)", "Asserts val is not nil.", "(assert-not-nil? 1) => true"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            examples: vec![example.to_string()],
            related: vec!["assert-raises?".to_string(), "then".to_string()],
            category: "BDD".to_string(),
        });
    }
}
