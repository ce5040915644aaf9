//! Filesystem I/O operations: slurp, spit, file-exists?, file-size, list-files
//!
//! All operations are restricted to whitelisted paths via capability-based
//! sandboxing (see `crate::sandbox`).

use crate::env::Environment;
use crate::error::EvalError;
use crate::sandbox::SandboxError;
use crate::value::Value;
use std::sync::Arc;

use super::sandbox;

fn as_str<'a>(fn_name: &str, arg: &'a Value, position: usize) -> Result<&'a str, EvalError> {
    match arg {
        Value::String(s) => Ok(s),
        other => Err(EvalError::type_error(fn_name, "string", other, position)),
    }
}

fn map_sandbox_error(fn_name: &str, path: &str, err: SandboxError) -> EvalError {
    match err {
        SandboxError::FileNotFound(_) => EvalError::file_not_found(path),
        SandboxError::PathNotAllowed(_) => EvalError::permission(path),
        SandboxError::FileTooLarge(msg) => EvalError::value_error(fn_name, msg),
        other => EvalError::runtime(fn_name, other),
    }
}

/// `(slurp path)` reads an entire file's contents as a string.
pub fn builtin_slurp(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("slurp", "1", args.len()));
    }
    let path = as_str("slurp", &args[0], 1)?;
    sandbox()
        .read_file(path)
        .map(Value::String)
        .map_err(|e| map_sandbox_error("slurp", path, e))
}

/// `(spit path contents)` writes contents to a file, creating it if needed.
pub fn builtin_spit(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("spit", "2", args.len()));
    }
    let path = as_str("spit", &args[0], 1)?;
    let contents = as_str("spit", &args[1], 2)?;
    sandbox()
        .write_file(path, contents)
        .map(|_| Value::Bool(true))
        .map_err(|e| map_sandbox_error("spit", path, e))
}

/// `(file-exists? path)` tests if a file exists and is accessible.
pub fn builtin_file_exists_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("file-exists?", "1", args.len()));
    }
    let path = as_str("file-exists?", &args[0], 1)?;
    sandbox()
        .file_exists(path)
        .map(Value::Bool)
        .map_err(|e| map_sandbox_error("file-exists?", path, e))
}

/// `(file-size path)` returns a file's size in bytes.
pub fn builtin_file_size(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("file-size", "1", args.len()));
    }
    let path = as_str("file-size", &args[0], 1)?;
    sandbox()
        .file_size(path)
        .map(|size| Value::Number(size as f64))
        .map_err(|e| map_sandbox_error("file-size", path, e))
}

/// `(list-files directory)` returns the filenames in a directory.
pub fn builtin_list_files(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("list-files", "1", args.len()));
    }
    let dir = as_str("list-files", &args[0], 1)?;
    sandbox()
        .list_files(dir)
        .map(|files| Value::List(files.into_iter().map(Value::String).collect()))
        .map_err(|e| map_sandbox_error("list-files", dir, e))
}

pub fn register(env: &Arc<Environment>) {
    env.define("slurp".to_string(), Value::BuiltIn(builtin_slurp));
    env.define("spit".to_string(), Value::BuiltIn(builtin_spit));
    env.define("file-exists?".to_string(), Value::BuiltIn(builtin_file_exists_p));
    env.define("file-size".to_string(), Value::BuiltIn(builtin_file_size));
    env.define("list-files".to_string(), Value::BuiltIn(builtin_list_files));

    crate::help::register_help(crate::help::HelpEntry {
        name: "slurp".to_string(),
        signature: "(slurp path)".to_string(),
        description: "Reads and returns the contents of a file as a string. Path is relative to allowed sandbox directories.".to_string(),
        examples: vec!["(slurp \"data/input.txt\") => \"file contents\"".to_string()],
        related: vec!["spit".to_string(), "file-exists?".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "spit".to_string(),
        signature: "(spit path contents)".to_string(),
        description: "Writes contents to a file, creating it if it doesn't exist. Returns true on success.".to_string(),
        examples: vec!["(spit \"data/output.txt\" \"hello\") => true".to_string()],
        related: vec!["slurp".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "file-exists?".to_string(),
        signature: "(file-exists? path)".to_string(),
        description: "Tests if a file exists and is accessible in the sandbox.".to_string(),
        examples: vec!["(file-exists? \"data/file.txt\") => true".to_string()],
        related: vec!["file-size".to_string(), "slurp".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "file-size".to_string(),
        signature: "(file-size path)".to_string(),
        description: "Returns the size of a file in bytes. Errors if the file doesn't exist.".to_string(),
        examples: vec!["(file-size \"data/file.txt\") => 1024".to_string()],
        related: vec!["file-exists?".to_string()],
        category: "Filesystem I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "list-files".to_string(),
        signature: "(list-files directory)".to_string(),
        description: "Returns a list of filenames in a directory.".to_string(),
        examples: vec!["(list-files \"data\") => (\"file1.txt\" \"file2.txt\")".to_string()],
        related: vec!["file-exists?".to_string()],
        category: "Filesystem I/O".to_string(),
    });
}
