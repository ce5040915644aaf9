//! Documentation built-ins: help, doc, print-doc
//!
//! `help` shows the quick reference or, given a symbol, the same detail
//! `doc` would print. `doc` returns a function's documentation as a string;
//! `print-doc` prints it and returns nil — the same split as `print` vs
//! `to-str`.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::sync::Arc;

fn lookup_doc(fn_name: &str, args: &[Value]) -> Result<String, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(fn_name, "1", args.len()));
    }
    match &args[0] {
        Value::Symbol(name) => crate::help::get_help(name)
            .map(|entry| crate::help::format_help_entry(&entry))
            .ok_or_else(|| EvalError::runtime(fn_name, format!("no documentation found for '{}'", name))),
        other => Err(EvalError::type_error(fn_name, "symbol", other, 1)),
    }
}

/// `(help)` prints the quick reference; `(help 'name)` prints that entry.
pub fn builtin_help(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        println!("{}", crate::help::format_quick_reference());
        return Ok(Value::Nil);
    }
    println!("{}", lookup_doc("help", args)?);
    Ok(Value::Nil)
}

/// `(doc 'name)` returns the entry's formatted documentation as a string.
pub fn builtin_doc(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(lookup_doc("doc", args)?))
}

/// `(print-doc 'name)` prints the entry's documentation and returns nil.
pub fn builtin_print_doc(args: &[Value]) -> Result<Value, EvalError> {
    println!("{}", lookup_doc("print-doc", args)?);
    Ok(Value::Nil)
}

pub fn register(env: &Arc<Environment>) {
    env.define("help".to_string(), Value::BuiltIn(builtin_help));
    env.define("doc".to_string(), Value::BuiltIn(builtin_doc));
    env.define("print-doc".to_string(), Value::BuiltIn(builtin_print_doc));

    crate::help::register_help(crate::help::HelpEntry {
        name: "help".to_string(),
        signature: "(help) or (help 'name)".to_string(),
        description: "With no arguments, prints the quick reference. With a symbol, prints that entry's documentation.".to_string(),
        examples: vec!["(help) => prints quick reference".to_string(), "(help 'map) => prints map's documentation".to_string()],
        related: vec!["doc".to_string(), "print-doc".to_string()],
        category: "Help system".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "doc".to_string(),
        signature: "(doc 'name)".to_string(),
        description: "Returns a function's documentation as a string.".to_string(),
        examples: vec!["(doc 'map) => \"(map f coll) ...\"".to_string()],
        related: vec!["print-doc".to_string(), "help".to_string()],
        category: "Help system".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "print-doc".to_string(),
        signature: "(print-doc 'name)".to_string(),
        description: "Prints a function's documentation. Returns nil.".to_string(),
        examples: vec!["(print-doc 'map) => prints map's documentation".to_string()],
        related: vec!["doc".to_string(), "help".to_string()],
        category: "Help system".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_unknown_symbol_errors() {
        assert!(builtin_doc(&[Value::Symbol("not-a-real-fn".to_string())]).is_err());
    }

    #[test]
    fn test_doc_requires_symbol() {
        assert!(builtin_doc(&[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_help_with_no_args_ok() {
        assert!(matches!(builtin_help(&[]), Ok(Value::Nil)));
    }
}
