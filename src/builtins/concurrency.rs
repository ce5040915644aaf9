//! Concurrency built-ins: promise, resolve, reject, promise-then, await,
//! promise-all, async-filter, retry, debounce, throttle
//!
//! Every promise-producing built-in here is a thin wrapper over
//! `crate::promise`'s settlement primitives and `crate::eval::apply`/
//! `apply_async`, which already know how to dispatch a callable (lambda or
//! native) without the caller having to care which kind it is.
//!
//! `debounce`/`throttle` return a *wrapper* callable, which is awkward given
//! `Value::BuiltIn` is a bare function pointer with no captured state: the
//! wrapper can't close over an id or a delay directly. Instead each call
//! registers its state in a process-wide table keyed by an id, and returns a
//! `Value::Lambda` whose body is a single call to an internal dispatch
//! builtin with that id spliced in as a literal argument — the dispatch
//! builtin looks the state back up by id. This only works for wrapping a
//! `Value::Lambda` (whose parameter count is known up front, so the wrapper
//! can be built with matching arity); wrapping a native `Value::BuiltIn` is
//! rejected, since its arity can't be inspected.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::{apply, apply_async, resolve_if_promise};
use crate::promise::{self, Promise};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

fn as_sequence<'a>(fn_name: &str, arg: &'a Value, position: usize) -> Result<&'a [Value], EvalError> {
    match arg {
        Value::List(items) | Value::Vector(items) => Ok(items),
        other => Err(EvalError::type_error(fn_name, "list or vector", other, position)),
    }
}

fn like(original: &Value, items: Vec<Value>) -> Value {
    match original {
        Value::Vector(_) => Value::Vector(items),
        _ => Value::List(items),
    }
}

fn as_u64(fn_name: &str, arg: &Value, position: usize) -> Result<u64, EvalError> {
    match arg {
        Value::Number(n) if *n >= 0.0 => Ok(*n as u64),
        other => Err(EvalError::type_error(fn_name, "non-negative number", other, position)),
    }
}

// ===== promise / resolve / reject / promise-then / await / promise-all =====

pub fn builtin_promise(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("promise", "1", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("promise", "function", &args[0], 1));
    }
    Ok(Value::Promise(apply_async(args[0].clone(), vec![])))
}

pub fn builtin_resolve(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("resolve", "1", args.len()));
    }
    Ok(Value::Promise(Promise::resolved(args[0].clone())))
}

pub fn builtin_reject(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("reject", "1", args.len()));
    }
    Ok(Value::Promise(Promise::rejected(args[0].clone())))
}

pub fn builtin_promise_then(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("promise-then", "2", args.len()));
    }
    let p = match &args[0] {
        Value::Promise(p) => Arc::clone(p),
        other => return Err(EvalError::type_error("promise-then", "promise", other, 1)),
    };
    if !args[1].is_callable() {
        return Err(EvalError::type_error("promise-then", "function", &args[1], 2));
    }
    let f = args[1].clone();

    let result = Promise::pending();
    let result_for_cb = Arc::clone(&result);
    p.on_settle(Box::new(move |outcome| match outcome {
        Ok(v) => match apply(&f, vec![v]) {
            Ok(Value::Promise(inner)) => {
                let result_for_inner = Arc::clone(&result_for_cb);
                inner.on_settle(Box::new(move |inner_outcome| {
                    result_for_inner.settle(inner_outcome);
                }));
            }
            Ok(other) => result_for_cb.settle(Ok(other)),
            Err(e) => result_for_cb.settle(Err(promise::error_to_value(&e))),
        },
        Err(reason) => result_for_cb.settle(Err(reason)),
    }));
    Ok(Value::Promise(result))
}

pub fn builtin_await(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("await", "1", args.len()));
    }
    resolve_if_promise(args[0].clone())
}

pub fn builtin_promise_all(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("promise-all", "1", args.len()));
    }
    let items = as_sequence("promise-all", &args[0], 1)?;
    let promises = items
        .iter()
        .map(|item| match item {
            Value::Promise(p) => Arc::clone(p),
            other => Promise::resolved(other.clone()),
        })
        .collect();
    Ok(Value::Promise(promise::promise_all(promises)))
}

pub fn builtin_async_filter(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("async-filter", "2", args.len()));
    }
    let items = as_sequence("async-filter", &args[0], 1)?.to_vec();
    if !args[1].is_callable() {
        return Err(EvalError::type_error("async-filter", "function", &args[1], 2));
    }
    let pred = args[1].clone();

    let flags: Vec<Arc<Promise>> = items
        .iter()
        .map(|item| {
            let pred = pred.clone();
            let item = item.clone();
            promise::spawn_promise(move || apply(&pred, vec![item]).and_then(resolve_if_promise).map(|v| Value::Bool(v.is_truthy())))
        })
        .collect();

    let combined = promise::promise_all(flags);
    let result = Promise::pending();
    let result_for_cb = Arc::clone(&result);
    let shape_source = args[0].clone();
    combined.on_settle(Box::new(move |outcome| match outcome {
        Ok(Value::Vector(flags)) => {
            let filtered = items
                .iter()
                .zip(flags.iter())
                .filter(|(_, flag)| flag.is_truthy())
                .map(|(item, _)| item.clone())
                .collect();
            result_for_cb.settle(Ok(like(&shape_source, filtered)));
        }
        Ok(_) => unreachable!("promise_all always resolves to a vector"),
        Err(reason) => result_for_cb.settle(Err(reason)),
    }));
    Ok(Value::Promise(result))
}

pub fn builtin_retry(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity("retry", "3", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("retry", "function", &args[0], 1));
    }
    let op = args[0].clone();
    let max_attempts = as_u64("retry", &args[1], 2)?.max(1);
    let delay_ms = as_u64("retry", &args[2], 3)?;

    Ok(Value::Promise(promise::spawn_promise(move || {
        let mut last_message = String::new();
        for attempt in 1..=max_attempts {
            match apply(&op, vec![]).and_then(resolve_if_promise) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    last_message = e.message();
                    if attempt < max_attempts {
                        promise::sleep_ms(delay_ms.saturating_mul(1u64 << (attempt - 1)));
                    }
                }
            }
        }
        Err(EvalError::retry(format!(
            "giving up after {max_attempts} attempt(s): {last_message}"
        )))
    })))
}

// ===== debounce / throttle =====

struct DebounceState {
    callable: Value,
    delay_ms: u64,
    generation: u64,
}

struct ThrottleState {
    callable: Value,
    rate_ms: u64,
    last_fired: Option<Instant>,
}

fn debounce_table() -> &'static Mutex<HashMap<u64, DebounceState>> {
    static TABLE: OnceLock<Mutex<HashMap<u64, DebounceState>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn throttle_table() -> &'static Mutex<HashMap<u64, ThrottleState>> {
    static TABLE: OnceLock<Mutex<HashMap<u64, ThrottleState>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn next_id() -> u64 {
    static NEXT: OnceLock<Mutex<u64>> = OnceLock::new();
    let counter = NEXT.get_or_init(|| Mutex::new(0));
    let mut guard = counter.lock().expect("id counter lock poisoned");
    *guard += 1;
    *guard
}

/// Builds a `Value::Lambda` with `arity` positional parameters, whose body
/// dispatches to `dispatch_name` with `id` as its first literal argument.
fn make_wrapper(closure_env: Arc<Environment>, dispatch_name: &str, id: u64, arity: usize) -> Value {
    let params: Vec<String> = (0..arity).map(|i| format!("__arg{i}")).collect();
    let mut call_form = vec![Value::Symbol(dispatch_name.to_string()), Value::Number(id as f64)];
    call_form.extend(params.iter().map(|p| Value::Symbol(p.clone())));
    Value::Lambda {
        params,
        body: vec![Value::List(call_form)],
        env: closure_env,
        docstring: None,
    }
}

fn lambda_arity_and_root(fn_name: &str, callable: &Value) -> Result<(usize, Arc<Environment>), EvalError> {
    match callable {
        Value::Lambda { params, env, .. } => Ok((params.len(), env.root())),
        other => Err(EvalError::type_error(fn_name, "a user-defined function (fn)", other, 1)),
    }
}

pub fn builtin_debounce(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("debounce", "2", args.len()));
    }
    let (arity, root) = lambda_arity_and_root("debounce", &args[0])?;
    let delay_ms = as_u64("debounce", &args[1], 2)?;

    let id = next_id();
    debounce_table().lock().expect("debounce table poisoned").insert(
        id,
        DebounceState { callable: args[0].clone(), delay_ms, generation: 0 },
    );
    Ok(make_wrapper(root, "__debounce-dispatch", id, arity))
}

fn debounce_dispatch(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("__debounce-dispatch", "at least 1", args.len()));
    }
    let id = as_u64("__debounce-dispatch", &args[0], 1)?;
    let call_args = args[1..].to_vec();

    let (callable, delay_ms, generation) = {
        let mut table = debounce_table().lock().expect("debounce table poisoned");
        let state = table.get_mut(&id).ok_or_else(|| EvalError::runtime("debounce", "unknown debounce id"))?;
        state.generation += 1;
        (state.callable.clone(), state.delay_ms, state.generation)
    };

    std::thread::spawn(move || {
        promise::sleep_ms(delay_ms);
        let still_current = {
            let table = debounce_table().lock().expect("debounce table poisoned");
            table.get(&id).map(|s| s.generation) == Some(generation)
        };
        if still_current {
            let _ = apply(&callable, call_args);
        }
    });
    Ok(Value::Nil)
}

pub fn builtin_throttle(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("throttle", "2", args.len()));
    }
    let (arity, root) = lambda_arity_and_root("throttle", &args[0])?;
    let rate_ms = as_u64("throttle", &args[1], 2)?;

    let id = next_id();
    throttle_table().lock().expect("throttle table poisoned").insert(
        id,
        ThrottleState { callable: args[0].clone(), rate_ms, last_fired: None },
    );
    Ok(make_wrapper(root, "__throttle-dispatch", id, arity))
}

fn throttle_dispatch(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("__throttle-dispatch", "at least 1", args.len()));
    }
    let id = as_u64("__throttle-dispatch", &args[0], 1)?;
    let call_args = args[1..].to_vec();

    let mut table = throttle_table().lock().expect("throttle table poisoned");
    let state = table.get_mut(&id).ok_or_else(|| EvalError::runtime("throttle", "unknown throttle id"))?;
    let now = Instant::now();
    let should_fire = match state.last_fired {
        None => true,
        Some(last) => now.duration_since(last).as_millis() as u64 >= state.rate_ms,
    };
    if !should_fire {
        return Ok(Value::Nil);
    }
    state.last_fired = Some(now);
    let callable = state.callable.clone();
    drop(table);
    apply(&callable, call_args)
}

pub fn register(env: &Arc<Environment>) {
    env.define("promise".to_string(), Value::BuiltIn(builtin_promise));
    env.define("resolve".to_string(), Value::BuiltIn(builtin_resolve));
    env.define("reject".to_string(), Value::BuiltIn(builtin_reject));
    env.define("promise-then".to_string(), Value::BuiltIn(builtin_promise_then));
    env.define("await".to_string(), Value::BuiltIn(builtin_await));
    env.define("promise-all".to_string(), Value::BuiltIn(builtin_promise_all));
    env.define("async-filter".to_string(), Value::BuiltIn(builtin_async_filter));
    env.define("retry".to_string(), Value::BuiltIn(builtin_retry));
    env.define("debounce".to_string(), Value::BuiltIn(builtin_debounce));
    env.define("throttle".to_string(), Value::BuiltIn(builtin_throttle));
    env.define("__debounce-dispatch".to_string(), Value::BuiltIn(debounce_dispatch));
    env.define("__throttle-dispatch".to_string(), Value::BuiltIn(throttle_dispatch));

    let entries: &[(&str, &str, &str, &str)] = &[
        ("promise", "(promise thunk)", "Runs thunk on a worker thread; returns a promise settled with its outcome.", "(promise (fn [] (+ 1 2))) => #<promise>"),
        ("resolve", "(resolve v)", "Returns a promise already resolved with v.", "(await (resolve 5)) => 5"),
        ("reject", "(reject r)", "Returns a promise already rejected with reason r.", "(await (reject \"boom\")) => raises"),
        ("promise-then", "(promise-then p f)", "Chains a callback onto a promise's eventual value.", "(await (promise-then (resolve 1) (fn [x] (+ x 1)))) => 2"),
        ("await", "(await p)", "Blocks until p settles, returning its value or raising its rejection.", "(await (resolve 5)) => 5"),
        ("promise-all", "(promise-all coll)", "Resolves to a vector of every input's result, in order; fails fast on the first rejection.", "(await (promise-all [(resolve 1) (resolve 2)])) => [1 2]"),
        ("async-filter", "(async-filter coll pred)", "Applies pred to every element concurrently; resolves to the elements (in original order) for which pred was truthy.", "(await (async-filter [1 2 3] (fn [x] (resolve (> x 1))))) => [2 3]"),
        ("retry", "(retry op max-attempts delay-ms)", "Calls a zero-argument op up to max-attempts times with exponential backoff between failures.", "(await (retry (fn [] (http-get \"https://example.com\")) 3 100)) => response"),
        ("debounce", "(debounce fn delay-ms)", "Returns a wrapper that invokes fn with the arguments of the last call, delay-ms after that call.", "(define logged (debounce println 200))"),
        ("throttle", "(throttle fn rate-ms)", "Returns a wrapper that runs fn immediately, then ignores further calls until rate-ms has elapsed.", "(define limited (throttle fetch 1000))"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: (*name).to_string(),
            signature: (*signature).to_string(),
            description: (*description).to_string(),
            examples: vec![(*example).to_string()],
            related: vec!["await".to_string(), "promise-all".to_string()],
            category: "Promises".to_string(),
        });
    }
}
