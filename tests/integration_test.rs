//! End-to-end tests: parse + eval a whole script against a fresh
//! environment with builtins registered, covering the core language
//! features working together rather than any single builtin in isolation.

use lispy::builtins::register_builtins;
use lispy::env::Environment;
use lispy::error::EvalError;
use lispy::eval::eval;
use lispy::parser::parse_all;
use lispy::value::Value;
use std::sync::Arc;

fn run(source: &str) -> Result<Value, EvalError> {
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all(source).expect("parse error");
    let mut last = Value::Nil;
    for form in &forms {
        last = eval(form, &env)?;
    }
    Ok(last)
}

#[test]
fn test_arithmetic_and_comparison() {
    assert_eq!(run("(+ 1 2 (* 3 4))").unwrap(), Value::Number(15.0));
    assert_eq!(run("(> 5 2 1)").unwrap(), Value::Bool(true));
    assert_eq!(run("(/ 1 0)").unwrap_err().message(), "ZeroDivisionError: /: division by zero".to_string());
}

#[test]
fn test_let_sequential_binding_and_closures() {
    let result = run(
        "(let [x 1 y (+ x 1)]
           (define make-adder (fn [n] (fn [m] (+ n m))))
           ((make-adder x) y))",
    )
    .unwrap();
    assert_eq!(result, Value::Number(3.0));
}

#[test]
fn test_recursive_function_does_not_overflow_stack() {
    let result = run(
        "(define count-down (fn [n acc] (if (= n 0) acc (count-down (- n 1) (+ acc 1)))))
         (count-down 100000 0)",
    )
    .unwrap();
    assert_eq!(result, Value::Number(100000.0));
}

#[test]
fn test_cond_and_when() {
    assert_eq!(run("(cond (= 1 2) \"a\" (= 1 1) \"b\")").unwrap(), Value::String("b".to_string()));
    assert_eq!(run("(when (> 3 2) 1 2 3)").unwrap(), Value::Number(3.0));
    assert_eq!(run("(when (< 3 2) 1)").unwrap(), Value::Nil);
}

#[test]
fn test_thread_first_and_thread_last() {
    assert_eq!(run("(-> 5 (- 2))").unwrap(), Value::Number(3.0));
    assert_eq!(run("(->> 5 (- 2))").unwrap(), Value::Number(-3.0));
}

#[test]
fn test_collections_map_filter_reduce() {
    let result = run("(reduce + 0 (filter (fn [x] (> x 2)) (map (fn [x] (* x 2)) [1 2 3])))").unwrap();
    // map doubles to [2 4 6], filter keeps > 2 => [4 6], reduce sums => 10
    assert_eq!(result, Value::Number(10.0));
}

#[test]
fn test_vector_vs_list_are_distinguished_by_equal() {
    let result = run("(assert-equal? [1 2] '(1 2))");
    assert!(result.is_err());
}

#[test]
fn test_try_catch_finally_runs_cleanup_on_both_paths() {
    let ok = run(
        "(let [log (fn [] nil)]
           (try (+ 1 1) (catch e -1) (finally (log))))",
    )
    .unwrap();
    assert_eq!(ok, Value::Number(2.0));

    let caught = run("(try (throw \"boom\") (catch e e))").unwrap();
    assert_eq!(caught, Value::String("boom".to_string()));
}

#[test]
fn test_throw_with_structured_value_catchable() {
    let result = run("(try (throw {\"code\" 42}) (catch e (get e \"code\")))").unwrap();
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn test_doseq_side_effects() {
    let result = run(
        "(define total 0)
         (doseq [x [1 2 3]] (define total (+ total x)))
         total",
    )
    .unwrap();
    assert_eq!(result, Value::Number(6.0));
}

#[test]
fn test_lambda_arity_mismatch_is_an_arity_error() {
    let err = run("(define f (fn [a b] (+ a b))) (f 1)").unwrap_err();
    assert!(err.message().starts_with("ArityError:"));
}

#[test]
fn test_multiple_top_level_forms_share_one_environment() {
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all("(define x 10) (define y (* x 2)) (+ x y)").unwrap();
    let mut last = Value::Nil;
    for form in &forms {
        last = eval(form, &env).unwrap();
    }
    assert_eq!(last, Value::Number(30.0));
    assert!(matches!(env_lookup(&env, "y"), Some(Value::Number(n)) if n == 20.0));
}

fn env_lookup(env: &Arc<Environment>, name: &str) -> Option<Value> {
    env.get(name)
}
