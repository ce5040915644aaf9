// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A lexical scope: a mapping from name to value plus an optional outer
/// scope. `Arc`-shared (not `Rc`) because the promise subsystem spawns real
/// OS threads that capture and evaluate against a lambda's defining
/// environment; `Mutex`-guarded bindings make that safe.
#[derive(Debug)]
pub struct Environment {
    bindings: Mutex<HashMap<String, Value>>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Arc<Self> {
        Arc::new(Environment {
            bindings: Mutex::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent.
    pub fn with_parent(parent: Arc<Environment>) -> Arc<Self> {
        Arc::new(Environment {
            bindings: Mutex::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Creates a child environment pre-populated with the given bindings,
    /// used for function calls and other control-flow forms that extend a
    /// scope all at once.
    pub fn extend(parent: Arc<Environment>, bindings: Vec<(String, Value)>) -> Arc<Self> {
        let env = Environment::with_parent(parent);
        for (name, value) in bindings {
            env.define(name, value);
        }
        env
    }

    /// Defines a binding in THIS scope (does not walk the parent chain).
    pub fn define(&self, name: String, value: Value) {
        self.bindings
            .lock()
            .expect("environment lock poisoned")
            .insert(name, value);
    }

    /// Looks up a symbol in this scope, then the outer chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.lock().expect("environment lock poisoned").get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::UndefinedSymbol(name.to_string()))
    }

    /// Walks to the outermost scope in the chain. Used by the module loader:
    /// a module's own top-level scope is rooted at the *global* scope, not
    /// at whatever local scope issued the `import`.
    pub fn root(self: &Arc<Self>) -> Arc<Self> {
        match &self.parent {
            Some(parent) => parent.root(),
            None => Arc::clone(self),
        }
    }

    /// Updates an existing binding, searching outward; errors if unbound
    /// anywhere in the chain. Not part of the core special-form set (LisPy
    /// has no `set!`), but kept as infrastructure the module loader and
    /// promise machinery use internally.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        {
            let mut bindings = self.bindings.lock().expect("environment lock poisoned");
            if bindings.contains_key(name) {
                bindings.insert(name.to_string(), value);
                return Ok(());
            }
        }
        if let Some(ref parent) = self.parent {
            return parent.set(name, value);
        }
        Err(EvalError::UndefinedSymbol(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(42.0));
        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected Number(42.0)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
        assert!(matches!(
            env.lookup("undefined"),
            Err(EvalError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));

        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(100.0));

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 100.0),
            _ => panic!("expected Number(100.0)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));
        let child = Environment::with_parent(parent);

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected Number(42.0)"),
        }
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Number(1.0));
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Number(2.0));
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Number(3.0));

        assert!(matches!(child.get("a"), Some(Value::Number(n)) if n == 1.0));
        assert!(matches!(child.get("b"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(child.get("c"), Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn test_extend_builds_child_with_bindings() {
        let parent = Environment::new();
        let child = Environment::extend(
            parent,
            vec![
                ("x".to_string(), Value::Number(1.0)),
                ("y".to_string(), Value::Number(2.0)),
            ],
        );
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(matches!(child.get("y"), Some(Value::Number(n)) if n == 2.0));
    }
}
