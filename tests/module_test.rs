//! End-to-end tests for the `import`/`export` special forms, exercised
//! through the evaluator rather than `modules::import` directly, against
//! real `.lpy` files on disk.

use lispy::builtins::register_builtins;
use lispy::config::ModuleConfig;
use lispy::env::Environment;
use lispy::eval::eval;
use lispy::modules;
use lispy::parser::parse_all;
use lispy::value::Value;
use serial_test::serial;
use std::io::Write;

fn write_module(dir: &std::path::Path, name: &str, source: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let mut file = std::fs::File::create(dir.join(format!("{}.lpy", name))).unwrap();
    file.write_all(source.as_bytes()).unwrap();
}

fn run_with_modules(dir: &std::path::Path, source: &str) -> Result<Value, lispy::error::EvalError> {
    modules::configure(ModuleConfig {
        load_paths: vec![dir.to_path_buf()],
        extension: "lpy".to_string(),
    });
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all(source).unwrap();
    let mut last = Value::Nil;
    for form in &forms {
        last = eval(form, &env)?;
    }
    Ok(last)
}

#[test]
#[serial]
fn test_import_then_use_an_exported_function() {
    let dir = std::env::temp_dir().join("lispy_integration_modules_basic");
    write_module(&dir, "mathlib", "(define square (fn [x] (* x x))) (export square)");

    let result = run_with_modules(&dir, "(import \"mathlib\") (square 5)").unwrap();
    assert_eq!(result, Value::Number(25.0));
}

#[test]
#[serial]
fn test_import_only_binds_the_requested_symbol() {
    let dir = std::env::temp_dir().join("lispy_integration_modules_only");
    write_module(
        &dir,
        "mathlib2",
        "(define square (fn [x] (* x x))) (define cube (fn [x] (* x x x))) (export square cube)",
    );

    let result = run_with_modules(&dir, "(import \"mathlib2\" :only (square)) (square 3)").unwrap();
    assert_eq!(result, Value::Number(9.0));

    let err = run_with_modules(&dir, "(import \"mathlib2\" :only (square)) (cube 3)").unwrap_err();
    assert!(err.message().contains("Unbound symbol"));
}

#[test]
#[serial]
fn test_import_as_prefix_namespaces_the_binding() {
    let dir = std::env::temp_dir().join("lispy_integration_modules_prefix");
    write_module(&dir, "strs2", "(define shout (fn [s] s)) (export shout)");

    let result = run_with_modules(&dir, "(import \"strs2\" :as \"str\") (str/shout \"hi\")").unwrap();
    assert_eq!(result, Value::String("hi".to_string()));
}

#[test]
#[serial]
fn test_importing_an_unexported_symbol_is_an_error_naming_both() {
    let dir = std::env::temp_dir().join("lispy_integration_modules_private");
    write_module(&dir, "secretlib", "(define secret 1) (export)");

    let err = run_with_modules(&dir, "(import \"secretlib\" :only (secret))").unwrap_err();
    assert!(err.message().contains("secretlib"));
    assert!(err.message().contains("secret"));
}

#[test]
#[serial]
fn test_diamond_import_shares_a_single_cached_module_instance() {
    let dir = std::env::temp_dir().join("lispy_integration_modules_diamond");
    write_module(&dir, "base", "(define counter 1) (export counter)");
    write_module(&dir, "left", "(import \"base\") (export counter)");
    write_module(&dir, "right", "(import \"base\") (export counter)");

    let result = run_with_modules(
        &dir,
        "(import \"left\") (import \"right\" :as \"r\") (+ counter r/counter)",
    )
    .unwrap();
    assert_eq!(result, Value::Number(2.0));
}
