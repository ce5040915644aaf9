// ABOUTME: Tree-walking evaluator: form dispatch, special forms, application

use crate::bdd;
use crate::env::Environment;
use crate::error::EvalError;
use crate::modules;
use crate::promise::{self, Promise};
use crate::value::Value;
use std::sync::Arc;

/// Evaluates `expr` in `env`. Tail positions (the last expression of a body
/// sequence, the selected branch of `if`/`cond`/`when`, a lambda call in
/// tail position) reassign `expr`/`env` and loop instead of recursing, so
/// self-recursive LisPy functions run in constant Rust stack depth.
pub fn eval(expr: &Value, env: &Arc<Environment>) -> Result<Value, EvalError> {
    let mut expr = expr.clone();
    let mut env = Arc::clone(env);

    loop {
        match &expr {
            Value::Nil
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Lambda { .. }
            | Value::BuiltIn(_)
            | Value::Promise(_) => return Ok(expr),

            Value::Symbol(name) => {
                if name.starts_with(':') {
                    return Ok(expr);
                }
                return env.lookup(name);
            }

            Value::Vector(items) => {
                let evaluated = items
                    .iter()
                    .map(|item| eval(item, &env))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Value::Vector(evaluated));
            }

            Value::Map(pairs) => {
                let evaluated = pairs
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), eval(v, &env)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                return Ok(Value::Map(evaluated));
            }

            Value::List(items) => {
                if items.is_empty() {
                    return Ok(Value::List(Vec::new()));
                }

                if let Some(name) = items[0].as_symbol_name() {
                    let args = &items[1..];
                    match name {
                        "quote" => return eval_quote(args),
                        "define" => return eval_define(args, &env),
                        "fn" => return eval_fn(args, &env),
                        "if" => {
                            let (next_expr, next_env) = eval_if(args, &env)?;
                            expr = next_expr;
                            env = next_env;
                            continue;
                        }
                        "cond" => match eval_cond(args, &env)? {
                            Some((next_expr, next_env)) => {
                                expr = next_expr;
                                env = next_env;
                                continue;
                            }
                            None => return Ok(Value::Nil),
                        },
                        "when" => {
                            if is_bdd_step(args) {
                                return eval_bdd_when(args, &env);
                            }
                            match eval_control_when(args, &env)? {
                                Some((next_expr, next_env)) => {
                                    expr = next_expr;
                                    env = next_env;
                                    continue;
                                }
                                None => return Ok(Value::Nil),
                            }
                        }
                        "let" => {
                            let (next_expr, next_env) = eval_let(args, &env)?;
                            expr = next_expr;
                            env = next_env;
                            continue;
                        }
                        "->" => {
                            expr = expand_thread_first(args)?;
                            continue;
                        }
                        "->>" => {
                            expr = expand_thread_last(args)?;
                            continue;
                        }
                        "throw" => return eval_throw(args, &env),
                        "try" => return eval_try(args, &env),
                        "doseq" => return eval_doseq(args, &env),
                        "import" => return eval_import(args, &env),
                        "export" => return eval_export(args, &env),
                        "describe" => return eval_describe(args, &env),
                        "it" => return eval_it(args, &env),
                        "given" => return eval_step("Given", args, &env),
                        "action" => return eval_step("Action", args, &env),
                        "then" => return eval_then(args, &env),
                        "assert-raises?" => return eval_assert_raises(args, &env),
                        _ => {}
                    }
                }

                let callable = eval(&items[0], &env)?;
                let args = items[1..]
                    .iter()
                    .map(|item| eval(item, &env))
                    .collect::<Result<Vec<_>, _>>()?;

                match callable {
                    Value::Lambda { params, body, env: closure_env, .. } => {
                        let (next_expr, next_env) = enter_lambda_body(&params, &body, &closure_env, args)?;
                        expr = next_expr;
                        env = next_env;
                        continue;
                    }
                    Value::BuiltIn(func) => return func(&args),
                    other => {
                        return Err(EvalError::type_error("apply", "function", &other, 0));
                    }
                }
            }
        }
    }
}

/// Evaluates a sequence of body expressions, all but the last for side
/// effects, and returns the last expression *unevaluated* along with its
/// environment so the caller's TCO loop can tail-call into it. Used
/// wherever the language defines "evaluate body, return the last value".
fn eval_body_for_tail(body: &[Value], env: &Arc<Environment>) -> Result<(Value, Arc<Environment>), EvalError> {
    if body.is_empty() {
        return Ok((Value::Nil, Arc::clone(env)));
    }
    for expr in &body[..body.len() - 1] {
        eval(expr, env)?;
    }
    Ok((body[body.len() - 1].clone(), Arc::clone(env)))
}

/// Non-tail variant: fully evaluates and returns the body's last value.
/// Used inside special forms (`try`/`catch`, `doseq`, BDD steps) whose own
/// handler is not itself in tail position.
fn eval_body(body: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    let (tail_expr, tail_env) = eval_body_for_tail(body, env)?;
    eval(&tail_expr, &tail_env)
}

fn eval_quote(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::syntax(format!(
            "quote expects exactly 1 argument, got {}",
            args.len()
        )));
    }
    Ok(args[0].clone())
}

fn eval_define(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::syntax(format!(
            "define expects exactly 2 arguments, got {}",
            args.len()
        )));
    }
    let name = args[0]
        .as_symbol_name()
        .ok_or_else(|| EvalError::syntax("define's first argument must be a symbol"))?
        .to_string();
    let value = eval(&args[1], env)?;
    env.define(name, value.clone());
    Ok(value)
}

fn parse_params(form: &Value) -> Result<Vec<String>, EvalError> {
    let items = form
        .as_sequence()
        .ok_or_else(|| EvalError::syntax("fn's parameter list must be a vector or list"))?;
    let mut params = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .as_symbol_name()
            .ok_or_else(|| EvalError::syntax("fn parameters must be symbols"))?;
        if params.iter().any(|p: &String| p == name) {
            return Err(EvalError::syntax(format!("duplicate parameter name: {}", name)));
        }
        params.push(name.to_string());
    }
    Ok(params)
}

fn eval_fn(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("fn requires a parameter list"));
    }
    let params = parse_params(&args[0])?;
    let mut body = args[1..].to_vec();
    if body.is_empty() {
        return Err(EvalError::syntax("fn requires at least one body expression"));
    }
    let docstring = if body.len() > 1 {
        match &body[0] {
            Value::String(s) => {
                let doc = s.clone();
                body.remove(0);
                Some(doc)
            }
            _ => None,
        }
    } else {
        None
    };
    Ok(Value::Lambda {
        params,
        body,
        env: Arc::clone(env),
        docstring,
    })
}

fn eval_if(args: &[Value], env: &Arc<Environment>) -> Result<(Value, Arc<Environment>), EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::syntax(format!(
            "if expects 2 or 3 arguments, got {}",
            args.len()
        )));
    }
    let test = eval(&args[0], env)?;
    if test.is_truthy() {
        Ok((args[1].clone(), Arc::clone(env)))
    } else if args.len() == 3 {
        Ok((args[2].clone(), Arc::clone(env)))
    } else {
        Ok((Value::Nil, Arc::clone(env)))
    }
}

fn eval_cond(args: &[Value], env: &Arc<Environment>) -> Result<Option<(Value, Arc<Environment>)>, EvalError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(EvalError::syntax(
            "cond requires an even, non-zero number of arguments",
        ));
    }
    let mut pairs = args.chunks_exact(2);
    for pair in &mut pairs {
        let test = eval(&pair[0], env)?;
        if test.is_truthy() {
            return Ok(Some((pair[1].clone(), Arc::clone(env))));
        }
    }
    Ok(None)
}

/// True when the evaluator should treat `when` as a BDD step: a scenario is
/// currently active and the first (unevaluated) argument is a literal
/// string, matching the `given`/`action`/`then` step shape.
fn is_bdd_step(args: &[Value]) -> bool {
    bdd::is_scenario_context_active() && matches!(args.first(), Some(Value::String(_)))
}

fn eval_control_when(args: &[Value], env: &Arc<Environment>) -> Result<Option<(Value, Arc<Environment>)>, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("when requires a test expression"));
    }
    let test = eval(&args[0], env)?;
    if !test.is_truthy() {
        return Ok(None);
    }
    if args.len() == 1 {
        return Ok(Some((Value::Bool(true), Arc::clone(env))));
    }
    Ok(Some(eval_body_for_tail(&args[1..], env)?))
}

fn eval_let(args: &[Value], env: &Arc<Environment>) -> Result<(Value, Arc<Environment>), EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("let requires a binding vector"));
    }
    let bindings = args[0]
        .as_sequence()
        .ok_or_else(|| EvalError::syntax("let's first argument must be a binding vector"))?;
    if bindings.len() % 2 != 0 {
        return Err(EvalError::syntax("let binding vector must have even length"));
    }
    let child = Environment::with_parent(Arc::clone(env));
    for pair in bindings.chunks_exact(2) {
        let name = pair[0]
            .as_symbol_name()
            .ok_or_else(|| EvalError::syntax("let binding keys must be symbols"))?
            .to_string();
        let value = eval(&pair[1], &child)?;
        child.define(name, value);
    }
    eval_body_for_tail(&args[1..], &child)
}

/// `(-> x f (g a b))` => `(g (f x) a b)`.
fn expand_thread_first(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("-> requires an initial value"));
    }
    let mut acc = args[0].clone();
    for step in &args[1..] {
        acc = match step {
            Value::List(items) => {
                if items.is_empty() {
                    return Err(EvalError::syntax("-> pipeline step cannot be an empty list"));
                }
                let mut rewritten = vec![items[0].clone(), acc];
                rewritten.extend(items[1..].iter().cloned());
                Value::List(rewritten)
            }
            other => Value::List(vec![other.clone(), acc]),
        };
    }
    Ok(acc)
}

/// `(->> x (g a b))` => `(g a b x)`.
fn expand_thread_last(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("->> requires an initial value"));
    }
    let mut acc = args[0].clone();
    for step in &args[1..] {
        acc = match step {
            Value::List(items) => {
                if items.is_empty() {
                    return Err(EvalError::syntax("->> pipeline step cannot be an empty list"));
                }
                let mut rewritten = items.clone();
                rewritten.push(acc);
                Value::List(rewritten)
            }
            other => Value::List(vec![other.clone(), acc]),
        };
    }
    Ok(acc)
}

fn eval_throw(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::syntax(format!(
            "throw expects exactly 1 argument, got {}",
            args.len()
        )));
    }
    let value = eval(&args[0], env)?;
    Err(EvalError::UserThrown(value))
}

struct CatchClause<'a> {
    binding: &'a str,
    handler: &'a [Value],
}

struct TryClauses<'a> {
    body: &'a Value,
    catch: Option<CatchClause<'a>>,
    finally: Option<&'a [Value]>,
}

fn parse_try_clauses(args: &[Value]) -> Result<TryClauses<'_>, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("try requires a body expression"));
    }
    let mut catch = None;
    let mut finally = None;
    for clause in &args[1..] {
        let items = clause
            .as_sequence()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| EvalError::syntax("try clauses must be (catch ...) or (finally ...) lists"))?;
        match items[0].as_symbol_name() {
            Some("catch") => {
                if catch.is_some() {
                    return Err(EvalError::syntax("try may have at most one catch clause"));
                }
                if items.len() < 3 {
                    return Err(EvalError::syntax(
                        "catch requires a binding symbol and at least one handler expression",
                    ));
                }
                let binding = items[1]
                    .as_symbol_name()
                    .ok_or_else(|| EvalError::syntax("catch's binding must be a symbol"))?;
                catch = Some(CatchClause {
                    binding,
                    handler: &items[2..],
                });
            }
            Some("finally") => {
                if finally.is_some() {
                    return Err(EvalError::syntax("try may have at most one finally clause"));
                }
                if items.len() < 2 {
                    return Err(EvalError::syntax("finally requires at least one cleanup expression"));
                }
                finally = Some(&items[1..]);
            }
            _ => return Err(EvalError::syntax("try clauses must start with catch or finally")),
        }
    }
    Ok(TryClauses {
        body: &args[0],
        catch,
        finally,
    })
}

fn eval_try(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    let clauses = parse_try_clauses(args)?;

    let mut outcome = eval(clauses.body, env);
    if let Err(error) = outcome {
        outcome = match clauses.catch {
            Some(catch) => {
                let bound_value = match &error {
                    EvalError::UserThrown(v) => v.clone(),
                    other => Value::String(other.message()),
                };
                let child = Environment::extend(Arc::clone(env), vec![(catch.binding.to_string(), bound_value)]);
                eval_body(catch.handler, &child)
            }
            None => Err(error),
        };
    }

    if let Some(cleanup) = clauses.finally {
        eval_body(cleanup, env)?;
    }

    outcome
}

fn eval_doseq(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("doseq requires a binding form"));
    }
    let binding_form = args[0]
        .as_sequence()
        .ok_or_else(|| EvalError::syntax("doseq's first argument must be [binding coll-expr]"))?;
    if binding_form.len() != 2 {
        return Err(EvalError::syntax("doseq binding form must have exactly 2 elements"));
    }
    let binding_name = binding_form[0]
        .as_symbol_name()
        .ok_or_else(|| EvalError::syntax("doseq's binding must be a symbol"))?
        .to_string();
    let collection = eval(&binding_form[1], env)?;
    let items = collection
        .as_sequence()
        .ok_or_else(|| EvalError::type_error("doseq", "list or vector", &collection, 2))?
        .to_vec();

    for item in items {
        let child = Environment::extend(Arc::clone(env), vec![(binding_name.clone(), item)]);
        eval_body(&args[1..], &child)?;
    }
    Ok(Value::Nil)
}

fn parse_string_arg(value: &Value, context: &str) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(EvalError::type_error(context, "string", other, 1)),
    }
}

fn eval_import(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("import requires a module name string"));
    }
    let name_value = eval(&args[0], env)?;
    let name = parse_string_arg(&name_value, "import")?;

    let mut only = None;
    let mut as_prefix = None;
    let mut rest = &args[1..];
    while !rest.is_empty() {
        match rest[0].as_symbol_name() {
            Some(":only") => {
                let list = rest
                    .get(1)
                    .and_then(|v| v.as_sequence())
                    .ok_or_else(|| EvalError::syntax(":only requires a list of symbols"))?;
                let mut names = Vec::with_capacity(list.len());
                for item in list {
                    names.push(
                        item.as_symbol_name()
                            .ok_or_else(|| EvalError::syntax(":only entries must be symbols"))?
                            .to_string(),
                    );
                }
                only = Some(names);
                rest = &rest[2..];
            }
            Some(":as") => {
                let prefix_value = rest
                    .get(1)
                    .ok_or_else(|| EvalError::syntax(":as requires a prefix string"))?;
                let prefix_value = eval(prefix_value, env)?;
                as_prefix = Some(parse_string_arg(&prefix_value, "import")?);
                rest = &rest[2..];
            }
            _ => return Err(EvalError::syntax("import expects :only or :as modifiers")),
        }
    }

    modules::import(&name, only.as_deref(), as_prefix.as_deref(), env)?;
    Ok(Value::Nil)
}

fn eval_export(args: &[Value], _env: &Arc<Environment>) -> Result<Value, EvalError> {
    for arg in args {
        let name = arg
            .as_symbol_name()
            .ok_or_else(|| EvalError::syntax("export's arguments must be symbols"))?;
        modules::record_export(name);
    }
    Ok(Value::Nil)
}

fn eval_describe(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("describe requires a description string"));
    }
    let description = parse_string_arg(&eval(&args[0], env)?, "describe")?;
    bdd::start_feature(description);
    let result = eval_body(&args[1..], env);
    bdd::end_feature();
    result
}

fn eval_it(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("it requires a description string"));
    }
    let description = parse_string_arg(&eval(&args[0], env)?, "it")?;
    bdd::start_scenario(description);
    let result = eval_body(&args[1..], env);
    bdd::end_scenario();
    result
}

fn eval_step(keyword: &str, args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax(format!("{} requires a description string", keyword)));
    }
    let description = parse_string_arg(&eval(&args[0], env)?, keyword)?;
    bdd::add_step(keyword, description);
    eval_body(&args[1..], env)
}

fn eval_bdd_when(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    eval_step("When", args, env)
}

fn eval_then(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::syntax("then requires a description string"));
    }
    let description = parse_string_arg(&eval(&args[0], env)?, "then")?;
    bdd::add_step("Then", description);
    match eval_body(&args[1..], env) {
        Ok(value) => {
            bdd::mark_last_step_status("passed", None);
            Ok(value)
        }
        Err(EvalError::AssertionFailure { message }) => {
            bdd::mark_last_step_status("failed", Some(message));
            Ok(Value::Nil)
        }
        Err(other) => {
            bdd::mark_last_step_status("failed", Some(format!("Step error: {}", other.message())));
            Ok(Value::Nil)
        }
    }
}

fn eval_assert_raises(args: &[Value], env: &Arc<Environment>) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::syntax(format!(
            "assert-raises? expects exactly 2 arguments, got {}",
            args.len()
        )));
    }
    let expected = parse_string_arg(&eval(&args[0], env)?, "assert-raises?")?;
    match eval(&args[1], env) {
        Ok(_) => Err(EvalError::assertion(
            "Expected an EvaluationError to be raised, but no error was raised.",
        )),
        Err(EvalError::AssertionFailure { message }) if message.contains(&expected) => Ok(Value::Bool(true)),
        Err(other) => {
            let actual = other.message();
            if actual.contains(&expected) {
                Ok(Value::Bool(true))
            } else {
                Err(EvalError::assertion(format!(
                    "Expected error message containing '{}', but got '{}'.",
                    expected, actual
                )))
            }
        }
    }
}

/// Binds `args` to `params` in a fresh child of `closure_env` and returns the
/// body's tail expression plus that environment, for the caller's TCO loop.
fn enter_lambda_body(
    params: &[String],
    body: &[Value],
    closure_env: &Arc<Environment>,
    args: Vec<Value>,
) -> Result<(Value, Arc<Environment>), EvalError> {
    if params.len() != args.len() {
        return Err(EvalError::arity("function", params.len().to_string(), args.len()));
    }
    let bindings = params.iter().cloned().zip(args).collect();
    let call_env = Environment::extend(Arc::clone(closure_env), bindings);
    eval_body_for_tail(body, &call_env)
}

/// Applies a callable value to already-evaluated arguments. Used by
/// higher-order built-ins (`map`, `filter`, `reduce`, `every?`, `some`,
/// `sort`, `async-filter`, `promise-then`) so they don't need to reimplement
/// dispatch between user lambdas and native functions.
pub fn apply(callable: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
    match callable {
        Value::Lambda { params, body, env, .. } => {
            let (tail_expr, tail_env) = enter_lambda_body(params, body, env, args)?;
            eval(&tail_expr, &tail_env)
        }
        Value::BuiltIn(func) => func(&args),
        other => Err(EvalError::type_error("apply", "function", other, 0)),
    }
}

/// Resolves a value that may itself be a promise into its settled value,
/// blocking if necessary. Used by `await` (a built-in, not a special form)
/// and by combinators (`promise-then`, `async-filter`) that accept either a
/// plain value or a promise from a callback.
pub fn resolve_if_promise(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Promise(p) => promise::await_promise(&p),
        other => Ok(other),
    }
}

/// Spawns a worker thread that applies `callable` to `args` and settles a
/// promise with the outcome. Shared by `(promise thunk)`, `async-filter`'s
/// per-element predicate calls, and `retry`'s attempt loop.
pub fn apply_async(callable: Value, args: Vec<Value>) -> Arc<Promise> {
    promise::spawn_promise(move || apply(&callable, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;

    fn eval_source(source: &str, env: &Arc<Environment>) -> Result<Value, EvalError> {
        let form = parse_one(source).expect("test source must parse");
        eval(&form, env)
    }

    #[test]
    fn test_self_evaluating_atoms() {
        let env = Environment::new();
        assert!(matches!(eval_source("42", &env), Ok(Value::Number(n)) if n == 42.0));
        assert!(matches!(eval_source("\"hi\"", &env), Ok(Value::String(s)) if s == "hi"));
        assert!(matches!(eval_source("true", &env), Ok(Value::Bool(true))));
        assert!(matches!(eval_source("nil", &env), Ok(Value::Nil)));
    }

    #[test]
    fn test_keyword_symbol_self_evaluates() {
        let env = Environment::new();
        assert!(matches!(eval_source(":a", &env), Ok(Value::Symbol(s)) if s == ":a"));
    }

    #[test]
    fn test_empty_list_evaluates_to_itself() {
        let env = Environment::new();
        assert!(matches!(eval_source("()", &env), Ok(Value::List(items)) if items.is_empty()));
    }

    #[test]
    fn test_define_and_lookup() {
        let env = Environment::new();
        eval_source("(define x 10)", &env).unwrap();
        assert!(matches!(eval_source("x", &env), Ok(Value::Number(n)) if n == 10.0));
    }

    #[test]
    fn test_if_evaluates_only_selected_branch() {
        let env = Environment::new();
        eval_source("(define hits 0)", &env).unwrap();
        eval_source("(if true (define hits 1) (define hits 2))", &env).unwrap();
        assert!(matches!(eval_source("hits", &env), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_cond_first_truthy_wins() {
        let env = Environment::new();
        let result = eval_source("(cond false 1 true 2 true 3)", &env).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 2.0));
    }

    #[test]
    fn test_let_sequential_binding_sees_earlier_bindings() {
        let env = Environment::new();
        let result = eval_source("(let [x 5 y x] y)", &env).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn test_lexical_closure_captures_defining_scope() {
        let env = Environment::new();
        eval_source("(define make-const (fn [n] (fn [] n)))", &env).unwrap();
        eval_source("(define c (make-const 7))", &env).unwrap();
        eval_source("(define n 999)", &env).unwrap();
        let result = eval_source("(c)", &env).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn test_recursive_factorial_via_tco_does_not_overflow_stack() {
        let env = Environment::new();
        env.define(
            "*".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => unreachable!(),
            }),
        );
        env.define(
            "-".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => unreachable!(),
            }),
        );
        env.define(
            "<=".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => unreachable!(),
            }),
        );
        eval_source(
            "(define fact (fn [n] (if (<= n 1) 1 (* n (fact (- n 1))))))",
            &env,
        )
        .unwrap();
        let result = eval_source("(fact 5)", &env).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 120.0));
    }

    #[test]
    fn test_thread_first_and_thread_last() {
        let env = Environment::new();
        env.define(
            "-".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => unreachable!(),
            }),
        );
        let first = eval_source("(-> 5 (- 2))", &env).unwrap();
        assert!(matches!(first, Value::Number(n) if n == 3.0));
        let last = eval_source("(->> 5 (- 2))", &env).unwrap();
        assert!(matches!(last, Value::Number(n) if n == -3.0));
    }

    #[test]
    fn test_throw_and_catch_binds_raw_value() {
        let env = Environment::new();
        let result = eval_source(r#"(try (throw "oops") (catch e e))"#, &env).unwrap();
        assert!(matches!(result, Value::String(s) if s == "oops"));
    }

    #[test]
    fn test_try_finally_runs_on_success_and_failure_paths() {
        let env = Environment::new();
        eval_source("(define cleanups 0)", &env).unwrap();
        env.define(
            "+".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => unreachable!(),
            }),
        );
        eval_source("(try 1 (finally (define cleanups (+ cleanups 1))))", &env).unwrap();
        eval_source(
            r#"(try (throw "boom") (catch e e) (finally (define cleanups (+ cleanups 1))))"#,
            &env,
        )
        .unwrap();
        assert!(matches!(eval_source("cleanups", &env), Ok(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn test_try_without_catch_propagates_after_finally() {
        let env = Environment::new();
        let result = eval_source(r#"(try (throw "boom") (finally nil))"#, &env);
        assert!(matches!(result, Err(EvalError::UserThrown(Value::String(s))) if s == "boom"));
    }

    #[test]
    fn test_doseq_binds_fresh_scope_per_iteration() {
        let env = Environment::new();
        env.define(
            "+".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => unreachable!(),
            }),
        );
        eval_source("(define total 0)", &env).unwrap();
        eval_source("(doseq [x [1 2 3]] (define total (+ total x)))", &env).unwrap();
        assert!(matches!(eval_source("total", &env), Ok(Value::Number(n)) if n == 6.0));
    }

    #[test]
    fn test_bdd_describe_it_given_then_records_passing_step() {
        bdd::reset_for_test();
        let env = Environment::new();
        eval_source(
            r#"(describe "math" (it "adds" (given "two numbers" nil) (then "sum is right" true)))"#,
            &env,
        )
        .unwrap();
        let results = bdd::results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scenarios[0].steps.len(), 2);
        assert_eq!(results[0].scenarios[0].steps[1].status, "passed");
    }

    #[test]
    fn test_bdd_then_marks_assertion_failure_without_propagating() {
        bdd::reset_for_test();
        let env = Environment::new();
        env.define(
            "assert-true?".to_string(),
            Value::BuiltIn(|args| {
                if args[0].is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    Err(EvalError::assertion("expected true, got false"))
                }
            }),
        );
        eval_source(
            r#"(describe "math" (it "fails" (then "never true" (assert-true? false))))"#,
            &env,
        )
        .unwrap();
        let results = bdd::results();
        assert_eq!(results[0].scenarios[0].steps[0].status, "failed");
    }

    #[test]
    fn test_assert_raises_matches_substring() {
        let env = Environment::new();
        env.define(
            "boom".to_string(),
            Value::BuiltIn(|_args| Err(EvalError::value_error("boom", "bad value"))),
        );
        let result = eval_source(r#"(assert-raises? "bad value" (boom))"#, &env).unwrap();
        assert!(matches!(result, Value::Bool(true)));
    }

    #[test]
    fn test_assert_raises_fails_when_no_error_raised() {
        let env = Environment::new();
        let result = eval_source(r#"(assert-raises? "anything" 42)"#, &env);
        assert!(matches!(result, Err(EvalError::AssertionFailure { .. })));
    }

    #[test]
    fn test_apply_dispatches_lambda_and_builtin() {
        let env = Environment::new();
        env.define(
            "+".to_string(),
            Value::BuiltIn(|args| match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => unreachable!(),
            }),
        );
        let inc = eval_source("(fn [x] (+ x 1))", &env).unwrap();
        let result = apply(&inc, vec![Value::Number(41.0)]).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 42.0));
    }
}
