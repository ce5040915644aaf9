//! End-to-end tests for the BDD special forms (`describe`/`it`/`given`/
//! `action`/`then`/`assert-raises?`) and the feature/scenario/step tree they
//! populate in `lispy::bdd`.

use lispy::bdd;
use lispy::builtins::register_builtins;
use lispy::env::Environment;
use lispy::eval::eval;
use lispy::parser::parse_all;
use lispy::value::Value;
use serial_test::serial;

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

#[test]
#[serial]
fn test_passing_scenario_records_a_passed_step() {
    bdd::reset_for_test();
    run(
        "(describe \"addition\"
           (it \"adds two numbers\"
             (given \"two numbers\" (define a 2) (define b 2))
             (then \"their sum is correct\" (assert-equal? 4 (+ a b)))))",
    );
    let results = bdd::results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].scenarios[0].steps[1].status, "passed");
}

#[test]
#[serial]
fn test_failing_then_marks_step_failed_without_propagating_error() {
    bdd::reset_for_test();
    run(
        "(describe \"addition\"
           (it \"adds two numbers wrong on purpose\"
             (then \"the sum is wrong\" (assert-equal? 5 (+ 2 2)))))",
    );
    let results = bdd::results();
    let step = &results[0].scenarios[0].steps[0];
    assert_eq!(step.status, "failed");
    assert!(step.details.as_ref().unwrap().contains("expected"));
}

#[test]
#[serial]
fn test_when_inside_a_scenario_is_a_bdd_step_not_the_control_form() {
    bdd::reset_for_test();
    run(
        "(describe \"counter\"
           (it \"increments\"
             (given \"a counter at zero\" (define n 0))
             (when \"it is incremented\" (define n (+ n 1)))
             (then \"it is one\" (assert-equal? 1 n))))",
    );
    let results = bdd::results();
    let steps = &results[0].scenarios[0].steps;
    assert_eq!(steps[1].keyword, "When");
    assert_eq!(steps[2].status, "passed");
}

#[test]
#[serial]
fn test_assert_raises_matches_on_error_message_substring() {
    bdd::reset_for_test();
    let result = run("(assert-raises? \"division by zero\" (/ 1 0))");
    assert_eq!(result, Value::Bool(true));
}

#[test]
#[serial]
fn test_assert_raises_fails_when_no_error_is_raised() {
    bdd::reset_for_test();
    let env = Environment::new();
    register_builtins(&env);
    let forms = parse_all("(assert-raises? \"anything\" (+ 1 1))").unwrap();
    let err = eval(&forms[0], &env).unwrap_err();
    assert!(err.message().starts_with("AssertionFailure:"));
}

#[test]
#[serial]
fn test_nested_describe_yields_two_sibling_features() {
    bdd::reset_for_test();
    run("(describe \"outer\" (describe \"inner\" (it \"does nothing\" 1)))");
    let results = bdd::results();
    assert_eq!(results.len(), 2);
}
