// ABOUTME: Promise subsystem: single-assignment futures, await, and concurrent combinators

use crate::error::EvalError;
use crate::value::Value;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Settlement {
    Pending,
    Resolved(Value),
    Rejected(Value),
}

type ThenContinuation = Box<dyn FnOnce(Result<Value, Value>) + Send>;

/// A single-assignment future. State transitions are one-shot and
/// monotonic; once resolved or rejected, the promise is immutable.
/// Modeled on the worker-thread + shared-state pattern the reference crate
/// uses for `spawn`/`spawn-link` (`builtins/concurrency.rs`), generalized
/// into a reusable settlement primitive with a `Condvar` for `await`.
pub struct Promise {
    state: Mutex<Settlement>,
    condvar: Condvar,
    /// then-continuations registered while pending, invoked in registration
    /// order exactly once, at settlement time.
    continuations: Mutex<Vec<ThenContinuation>>,
}

impl Promise {
    pub fn pending() -> Arc<Self> {
        Arc::new(Promise {
            state: Mutex::new(Settlement::Pending),
            condvar: Condvar::new(),
            continuations: Mutex::new(Vec::new()),
        })
    }

    pub fn resolved(value: Value) -> Arc<Self> {
        let promise = Promise::pending();
        promise.settle(Ok(value));
        promise
    }

    pub fn rejected(reason: Value) -> Arc<Self> {
        let promise = Promise::pending();
        promise.settle(Err(reason));
        promise
    }

    /// Settles the promise exactly once; later calls are no-ops, satisfying
    /// the "a single resolve/reject wins" contract.
    pub fn settle(self: &Arc<Self>, outcome: Result<Value, Value>) {
        let mut state = self.state.lock().expect("promise lock poisoned");
        if !matches!(*state, Settlement::Pending) {
            return;
        }
        *state = match &outcome {
            Ok(v) => Settlement::Resolved(v.clone()),
            Err(r) => Settlement::Rejected(r.clone()),
        };
        drop(state);
        self.condvar.notify_all();

        let continuations = std::mem::take(&mut *self.continuations.lock().expect("promise lock poisoned"));
        for cont in continuations {
            cont(outcome.clone());
        }
    }

    /// Registers a callback to run when this promise settles, invoked
    /// immediately if it already has. Continuations never run inside
    /// another continuation's critical section: `settle` drops its state
    /// lock before invoking any of them.
    pub fn on_settle(self: &Arc<Self>, cont: ThenContinuation) {
        let mut state = self.state.lock().expect("promise lock poisoned");
        match &*state {
            Settlement::Pending => {
                self.continuations.lock().expect("promise lock poisoned").push(cont);
            }
            Settlement::Resolved(v) => {
                let v = v.clone();
                drop(state);
                cont(Ok(v));
            }
            Settlement::Rejected(r) => {
                let r = r.clone();
                drop(state);
                cont(Err(r));
            }
        }
    }

    /// Blocks the calling thread until settled. Does not hold any evaluator
    /// lock while waiting — only this promise's own mutex, released by the
    /// condvar while parked.
    pub fn block_until_settled(self: &Arc<Self>) -> Result<Value, Value> {
        let guard = self.state.lock().expect("promise lock poisoned");
        let guard = self
            .condvar
            .wait_while(guard, |s| matches!(s, Settlement::Pending))
            .expect("promise lock poisoned");
        match &*guard {
            Settlement::Resolved(v) => Ok(v.clone()),
            Settlement::Rejected(r) => Err(r.clone()),
            Settlement::Pending => unreachable!("condvar only wakes on settlement"),
        }
    }

    pub fn snapshot(&self) -> Settlement {
        self.state.lock().expect("promise lock poisoned").clone()
    }
}

/// `(promise thunk)` — runs `thunk` (a zero-argument callable) on a worker
/// thread and settles the returned promise with its outcome.
pub fn spawn_promise<F>(thunk: F) -> Arc<Promise>
where
    F: FnOnce() -> Result<Value, EvalError> + Send + 'static,
{
    let promise = Promise::pending();
    let promise_for_thread = Arc::clone(&promise);
    thread::spawn(move || {
        let outcome = match thunk() {
            Ok(v) => Ok(v),
            Err(e) => Err(error_to_value(&e)),
        };
        promise_for_thread.settle(outcome);
    });
    promise
}

/// Converts an `EvalError` to the value a promise rejects with: the thrown
/// value itself for `UserThrown`, otherwise the rendered message string.
pub fn error_to_value(err: &EvalError) -> Value {
    match err {
        EvalError::UserThrown(v) => v.clone(),
        other => Value::String(other.message()),
    }
}

/// `(await p)` blocking wait, converting a rejection into an `EvalError`.
pub fn await_promise(promise: &Arc<Promise>) -> Result<Value, EvalError> {
    match promise.block_until_settled() {
        Ok(v) => Ok(v),
        Err(reason) => {
            let message = match &reason {
                Value::String(s) => s.clone(),
                other => format!("{}", other),
            };
            Err(EvalError::Evaluation { message })
        }
    }
}

/// `(promise-all promises)` — fail-fast, preserves index order.
pub fn promise_all(promises: Vec<Arc<Promise>>) -> Arc<Promise> {
    let result = Promise::pending();
    if promises.is_empty() {
        result.settle(Ok(Value::Vector(vec![])));
        return result;
    }

    let total = promises.len();
    let slots: Arc<Mutex<Vec<Option<Value>>>> = Arc::new(Mutex::new(vec![None; total]));
    let remaining = Arc::new(Mutex::new(total));

    for (index, promise) in promises.into_iter().enumerate() {
        let slots = Arc::clone(&slots);
        let remaining = Arc::clone(&remaining);
        let result_for_cb = Arc::clone(&result);
        promise.on_settle(Box::new(move |outcome| match outcome {
            Ok(value) => {
                let done = {
                    let mut slots = slots.lock().expect("promise lock poisoned");
                    slots[index] = Some(value);
                    let mut remaining = remaining.lock().expect("promise lock poisoned");
                    *remaining -= 1;
                    *remaining == 0
                };
                if done {
                    let values = slots
                        .lock()
                        .expect("promise lock poisoned")
                        .iter()
                        .cloned()
                        .map(|v| v.unwrap_or(Value::Nil))
                        .collect();
                    result_for_cb.settle(Ok(Value::Vector(values)));
                }
            }
            Err(reason) => result_for_cb.settle(Err(reason)),
        }));
    }

    result
}

/// Sleeps the current (worker) thread. Used by `retry`'s backoff and the
/// scheduled-invocation timers in `debounce`/`throttle`.
pub fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_promise_await_identity() {
        let p = Promise::resolved(Value::Number(5.0));
        let v = await_promise(&p).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn test_rejected_promise_await_errors() {
        let p = Promise::rejected(Value::String("boom".to_string()));
        let err = await_promise(&p).unwrap_err();
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_settle_is_one_shot() {
        let p = Promise::pending();
        p.settle(Ok(Value::Number(1.0)));
        p.settle(Ok(Value::Number(2.0)));
        match p.snapshot() {
            Settlement::Resolved(Value::Number(n)) => assert_eq!(n, 1.0),
            _ => panic!("expected first resolution to win"),
        }
    }

    #[test]
    fn test_spawn_promise_resolves_from_worker_thread() {
        let p = spawn_promise(|| Ok(Value::Number(42.0)));
        let v = await_promise(&p).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 42.0));
    }

    #[test]
    fn test_promise_all_preserves_order_regardless_of_settle_order() {
        let fast = spawn_promise(|| Ok(Value::Number(1.0)));
        let slow = spawn_promise(|| {
            sleep_ms(30);
            Ok(Value::Number(2.0))
        });
        let combined = promise_all(vec![slow, fast]);
        let result = await_promise(&combined).unwrap();
        match result {
            Value::Vector(items) => {
                assert!(matches!(items[0], Value::Number(n) if n == 2.0));
                assert!(matches!(items[1], Value::Number(n) if n == 1.0));
            }
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn test_promise_all_fails_fast_on_first_rejection() {
        let ok = Promise::resolved(Value::Number(1.0));
        let bad = Promise::rejected(Value::String("nope".to_string()));
        let combined = promise_all(vec![ok, bad]);
        assert!(await_promise(&combined).is_err());
    }
}
