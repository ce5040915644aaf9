//! End-to-end tests for the promise subsystem's built-ins: promise,
//! resolve, reject, promise-then, await, promise-all, async-filter, retry,
//! debounce, throttle.

use lispy::builtins::register_builtins;
use lispy::env::Environment;
use lispy::eval::eval;
use lispy::parser::parse_all;
use lispy::value::Value;

fn run(source: &str) -> Value {
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all(source).unwrap();
    let mut last = Value::Nil;
    for form in &forms {
        last = eval(form, &env).unwrap();
    }
    last
}

fn run_err(source: &str) -> String {
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all(source).unwrap();
    let mut result = Ok(Value::Nil);
    for form in &forms {
        result = eval(form, &env);
        if result.is_err() {
            break;
        }
    }
    result.unwrap_err().message()
}

#[test]
fn test_promise_spawns_a_worker_and_await_blocks_for_the_result() {
    let result = run("(await (promise (fn [] (+ 20 22))))");
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn test_resolve_and_reject_are_already_settled() {
    assert_eq!(run("(await (resolve 1))"), Value::Number(1.0));
    assert_eq!(run_err("(await (reject \"nope\"))"), "nope");
}

#[test]
fn test_promise_then_chains_and_flattens_nested_promises() {
    let result = run(
        "(await (promise-then (resolve 1)
           (fn [x] (promise-then (resolve (+ x 1)) (fn [y] (* y 10))))))",
    );
    assert_eq!(result, Value::Number(20.0));
}

#[test]
fn test_promise_all_preserves_index_order_for_mixed_values_and_promises() {
    let result = run("(await (promise-all [(resolve 1) 2 (promise (fn [] 3))]))");
    assert_eq!(result, Value::Vector(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
}

#[test]
fn test_promise_all_fails_fast_on_first_rejection() {
    let err = run_err("(await (promise-all [(resolve 1) (reject \"bad\")]))");
    assert_eq!(err, "bad");
}

#[test]
fn test_async_filter_keeps_predicate_shape_vector_in_vector_out() {
    let result = run("(await (async-filter [1 2 3 4] (fn [x] (= 0 (% x 2)))))");
    assert_eq!(result, Value::Vector(vec![Value::Number(2.0), Value::Number(4.0)]));
}

#[test]
fn test_retry_gives_up_after_max_attempts_and_reports_last_message() {
    let err = run_err(
        "(await (retry (fn [] (throw \"still failing\")) 3 0))",
    );
    assert!(err.starts_with("RetryError:"));
    assert!(err.contains("still failing"));
}

#[test]
fn test_retry_succeeds_once_the_operation_stops_failing() {
    let result = run(
        "(define attempts 0)
         (await (retry (fn []
                  (define attempts (+ attempts 1))
                  (if (< attempts 3) (throw \"not yet\") attempts))
                3 0))",
    );
    assert_eq!(result, Value::Number(3.0));
}

#[test]
fn test_debounce_rejects_a_native_builtin_target() {
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all("(debounce + 10)").unwrap();
    let err = eval(&forms[0], &env).unwrap_err();
    assert!(err.message().starts_with("TypeError:"));
}

#[test]
fn test_debounce_returns_a_callable_wrapper_matching_target_arity() {
    let result = run("(define f (debounce (fn [x] (* x 2)) 5)) (is-function? f)");
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_throttle_fires_immediately_on_first_call_then_drops_the_next() {
    let result = run(
        "(define f (throttle (fn [x] (* x 10)) 10000))
         (define first (f 4))
         (define second (f 5))
         [first second]",
    );
    assert_eq!(result, Value::Vector(vec![Value::Number(40.0), Value::Nil]));
}
