//! Console I/O operations: print, println, read-line

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::io::BufRead;
use std::sync::Arc;

fn write_args(args: &[Value]) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            print!(" ");
        }
        match arg {
            Value::String(s) => print!("{}", s),
            other => print!("{}", other),
        }
    }
}

/// Prints values to stdout without a trailing newline. Returns nil.
pub fn builtin_print(args: &[Value]) -> Result<Value, EvalError> {
    write_args(args);
    Ok(Value::Nil)
}

/// Prints values to stdout followed by a newline. Returns nil.
pub fn builtin_println(args: &[Value]) -> Result<Value, EvalError> {
    write_args(args);
    println!();
    Ok(Value::Nil)
}

/// Reads a line from stdin, without the trailing newline. Returns nil at EOF.
pub fn builtin_read_line(args: &[Value]) -> Result<Value, EvalError> {
    if !args.is_empty() {
        return Err(EvalError::arity("read-line", "0", args.len()));
    }
    let mut line = String::new();
    let bytes = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| EvalError::runtime("read-line", e))?;
    if bytes == 0 {
        return Ok(Value::Nil);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::String(line))
}

pub fn register(env: &Arc<Environment>) {
    env.define("print".to_string(), Value::BuiltIn(builtin_print));
    env.define("println".to_string(), Value::BuiltIn(builtin_println));
    env.define("read-line".to_string(), Value::BuiltIn(builtin_read_line));

    crate::help::register_help(crate::help::HelpEntry {
        name: "print".to_string(),
        signature: "(print ...)".to_string(),
        description: "Prints values to stdout without a trailing newline. Returns nil.".to_string(),
        examples: vec!["(print \"hello\") => outputs: hello".to_string()],
        related: vec!["println".to_string()],
        category: "Console I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "println".to_string(),
        signature: "(println ...)".to_string(),
        description: "Prints values to stdout followed by a newline. Returns nil.".to_string(),
        examples: vec!["(println \"hello\") => outputs: hello\\n".to_string()],
        related: vec!["print".to_string()],
        category: "Console I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "read-line".to_string(),
        signature: "(read-line)".to_string(),
        description: "Reads a line from stdin, without the trailing newline. Returns nil at EOF.".to_string(),
        examples: vec!["(read-line) => \"hello\"".to_string()],
        related: vec!["print".to_string()],
        category: "Console I/O".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_returns_nil() {
        assert!(matches!(builtin_print(&[Value::Number(1.0)]), Ok(Value::Nil)));
    }

    #[test]
    fn test_read_line_wrong_arity() {
        assert!(builtin_read_line(&[Value::Nil]).is_err());
    }
}
