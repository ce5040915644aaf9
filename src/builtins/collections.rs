//! Collection operations over lists, vectors and maps.
//!
//! - Constructors: `list`, `vector`, `hash-map`
//! - Inspection: `count`, `empty?`, `first`, `rest`, `car`, `cdr`, `keys`, `vals`
//! - Transformation: `cons`, `conj`, `assoc`, `dissoc`, `merge`, `get`,
//!   `reverse`, `sort`, `range`, `append`, `concat`, `split`, `join`, `map`,
//!   `filter`, `reduce`, `some`, `every?`
//!
//! Lists and vectors share most operations; each sequence-shaped built-in
//! preserves its input's concrete type (a vector in, a vector out) rather
//! than normalizing everything to lists.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::apply;
use crate::value::{MapPairs, Value};
use std::sync::Arc;

fn as_sequence<'a>(fn_name: &str, arg: &'a Value, position: usize) -> Result<&'a [Value], EvalError> {
    match arg {
        Value::List(items) | Value::Vector(items) => Ok(items),
        Value::Nil => Ok(&[]),
        other => Err(EvalError::type_error(fn_name, "list or vector", other, position)),
    }
}

fn as_map<'a>(fn_name: &str, arg: &'a Value, position: usize) -> Result<&'a MapPairs, EvalError> {
    match arg {
        Value::Map(pairs) => Ok(pairs),
        other => Err(EvalError::type_error(fn_name, "map", other, position)),
    }
}

/// Rewraps a sequence, preserving List-vs-Vector shape of the original arg.
fn like(original: &Value, items: Vec<Value>) -> Value {
    match original {
        Value::Vector(_) => Value::Vector(items),
        _ => Value::List(items),
    }
}

// ===== Constructors =====

pub fn builtin_list(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::List(args.to_vec()))
}

pub fn builtin_vector(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Vector(args.to_vec()))
}

pub fn builtin_hash_map(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() % 2 != 0 {
        return Err(EvalError::value_error("hash-map", "expects an even number of key/value arguments"));
    }
    let pairs = args.chunks(2).map(|kv| (kv[0].clone(), kv[1].clone())).collect();
    Ok(Value::Map(pairs))
}

// ===== Inspection =====

pub fn builtin_count(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("count", "1", args.len()));
    }
    let n = match &args[0] {
        Value::List(items) | Value::Vector(items) => items.len(),
        Value::Map(pairs) => pairs.len(),
        Value::String(s) => s.chars().count(),
        Value::Nil => 0,
        other => return Err(EvalError::type_error("count", "collection", other, 1)),
    };
    Ok(Value::Number(n as f64))
}

pub fn builtin_empty_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("empty?", "1", args.len()));
    }
    let is_empty = match &args[0] {
        Value::List(items) | Value::Vector(items) => items.is_empty(),
        Value::Map(pairs) => pairs.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Nil => true,
        other => return Err(EvalError::type_error("empty?", "collection", other, 1)),
    };
    Ok(Value::Bool(is_empty))
}

pub fn builtin_first(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("first", "1", args.len()));
    }
    let items = as_sequence("first", &args[0], 1)?;
    Ok(items.first().cloned().unwrap_or(Value::Nil))
}

pub fn builtin_rest(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("rest", "1", args.len()));
    }
    let items = as_sequence("rest", &args[0], 1)?;
    let tail = if items.is_empty() { vec![] } else { items[1..].to_vec() };
    Ok(like(&args[0], tail))
}

pub fn builtin_car(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("car", "1", args.len()));
    }
    let items = as_sequence("car", &args[0], 1)?;
    items
        .first()
        .cloned()
        .ok_or_else(|| EvalError::value_error("car", "empty sequence"))
}

pub fn builtin_cdr(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("cdr", "1", args.len()));
    }
    let items = as_sequence("cdr", &args[0], 1)?;
    if items.is_empty() {
        return Err(EvalError::value_error("cdr", "empty sequence"));
    }
    Ok(like(&args[0], items[1..].to_vec()))
}

pub fn builtin_keys(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("keys", "1", args.len()));
    }
    let pairs = as_map("keys", &args[0], 1)?;
    Ok(Value::Vector(pairs.iter().map(|(k, _)| k.clone()).collect()))
}

pub fn builtin_vals(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("vals", "1", args.len()));
    }
    let pairs = as_map("vals", &args[0], 1)?;
    Ok(Value::Vector(pairs.iter().map(|(_, v)| v.clone()).collect()))
}

// ===== Transformation =====

pub fn builtin_cons(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("cons", "2", args.len()));
    }
    let items = as_sequence("cons", &args[1], 2)?;
    let mut result = vec![args[0].clone()];
    result.extend_from_slice(items);
    Ok(Value::List(result))
}

/// `(conj coll elem...)` — appends to a vector, prepends to a list, matching
/// the cheap end of each structure.
pub fn builtin_conj(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("conj", "at least 1", args.len()));
    }
    let items = as_sequence("conj", &args[0], 1)?.to_vec();
    let additions = &args[1..];
    let result = match &args[0] {
        Value::Vector(_) => {
            let mut items = items;
            items.extend_from_slice(additions);
            items
        }
        _ => {
            let mut items = items;
            for elem in additions {
                items.insert(0, elem.clone());
            }
            items
        }
    };
    Ok(like(&args[0], result))
}

pub fn builtin_assoc(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 3 || args.len() % 2 == 0 {
        return Err(EvalError::arity("assoc", "an odd number, at least 3", args.len()));
    }
    // nil is treated as an empty map, so (assoc nil :a 1) builds a fresh map.
    let mut pairs: MapPairs = match &args[0] {
        Value::Map(pairs) => pairs.clone(),
        Value::Nil => Vec::new(),
        other => return Err(EvalError::type_error("assoc", "map or nil", other, 1)),
    };
    for kv in args[1..].chunks(2) {
        let (key, value) = (&kv[0], &kv[1]);
        if !matches!(key, Value::Symbol(_)) {
            return Err(EvalError::type_error("assoc", "symbol key", key, 1));
        }
        match pairs.iter_mut().find(|(k, _)| k.equal(key)) {
            Some(entry) => entry.1 = value.clone(),
            None => pairs.push((key.clone(), value.clone())),
        }
    }
    Ok(Value::Map(pairs))
}

pub fn builtin_dissoc(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("dissoc", "at least 1", args.len()));
    }
    let mut pairs = as_map("dissoc", &args[0], 1)?.clone();
    for key in &args[1..] {
        pairs.retain(|(k, _)| !k.equal(key));
    }
    Ok(Value::Map(pairs))
}

pub fn builtin_merge(args: &[Value]) -> Result<Value, EvalError> {
    let mut result: MapPairs = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        let pairs = as_map("merge", arg, i + 1)?;
        for (k, v) in pairs {
            match result.iter_mut().find(|(rk, _)| rk.equal(k)) {
                Some(entry) => entry.1 = v.clone(),
                None => result.push((k.clone(), v.clone())),
            }
        }
    }
    Ok(Value::Map(result))
}

pub fn builtin_get(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::arity("get", "2 or 3", args.len()));
    }
    // `default` is `None` when the caller omitted it, so out-of-range/missing
    // lookups can tell "use nil" apart from "no default was given at all."
    let default = args.get(2).cloned();
    match &args[0] {
        Value::Map(pairs) => {
            if !matches!(&args[1], Value::Symbol(_)) {
                return Err(EvalError::type_error("get", "Map key must be a symbol", &args[1], 2));
            }
            Ok(pairs
                .iter()
                .find(|(k, _)| k.equal(&args[1]))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| default.unwrap_or(Value::Nil)))
        }
        Value::List(items) | Value::Vector(items) => match &args[1] {
            Value::Number(n) => {
                let index = *n as i64;
                if index < 0 || index as usize >= items.len() {
                    match default {
                        Some(d) => Ok(d),
                        None => Err(EvalError::index_error(
                            "get",
                            format!("{} out of bounds for vector of size {}", index, items.len()),
                        )),
                    }
                } else {
                    Ok(items[index as usize].clone())
                }
            }
            other => Err(EvalError::type_error("get", "Vector index must be an integer", other, 2)),
        },
        Value::Nil => Ok(default.unwrap_or(Value::Nil)),
        other => Err(EvalError::type_error("get", "map, list or vector", other, 1)),
    }
}

pub fn builtin_reverse(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("reverse", "1", args.len()));
    }
    let mut items = as_sequence("reverse", &args[0], 1)?.to_vec();
    items.reverse();
    Ok(like(&args[0], items))
}

pub fn builtin_sort(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EvalError::arity("sort", "1 or 2", args.len()));
    }
    let items = as_sequence("sort", &args[0], 1)?.to_vec();
    let mut sortable: Vec<(f64, Value)> = Vec::with_capacity(items.len());
    for item in items {
        match &item {
            Value::Number(n) => sortable.push((*n, item)),
            other => return Err(EvalError::type_error("sort", "number", other, 1)),
        }
    }
    sortable.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let descending = args.get(1).map(|v| v.is_truthy()).unwrap_or(false);
    if descending {
        sortable.reverse();
    }
    Ok(like(&args[0], sortable.into_iter().map(|(_, v)| v).collect()))
}

pub fn builtin_range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, end, step) = match args.len() {
        1 => (0.0, as_number("range", &args[0], 1)?, 1.0),
        2 => (as_number("range", &args[0], 1)?, as_number("range", &args[1], 2)?, 1.0),
        3 => (
            as_number("range", &args[0], 1)?,
            as_number("range", &args[1], 2)?,
            as_number("range", &args[2], 3)?,
        ),
        other => return Err(EvalError::arity("range", "1 to 3", other)),
    };
    if step == 0.0 {
        return Err(EvalError::value_error("range", "step must be nonzero"));
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < end) || (step < 0.0 && current > end) {
        items.push(Value::Number(current));
        current += step;
    }
    Ok(Value::List(items))
}

fn as_number(fn_name: &str, arg: &Value, position: usize) -> Result<f64, EvalError> {
    match arg {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::type_error(fn_name, "number", other, position)),
    }
}

pub fn builtin_append(args: &[Value]) -> Result<Value, EvalError> {
    builtin_concat(args)
}

pub fn builtin_concat(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Ok(Value::List(vec![]));
    }
    let mut result = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        result.extend_from_slice(as_sequence("concat", arg, i + 1)?);
    }
    Ok(like(&args[0], result))
}

/// `(split coll-or-string separator)` — splits a string on a literal
/// separator into a vector of strings.
pub fn builtin_split(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("split", "2", args.len()));
    }
    let s = match &args[0] {
        Value::String(s) => s,
        other => return Err(EvalError::type_error("split", "string", other, 1)),
    };
    let sep = match &args[1] {
        Value::String(s) => s,
        other => return Err(EvalError::type_error("split", "string", other, 2)),
    };
    let parts = if sep.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect()
    };
    Ok(Value::Vector(parts))
}

/// `(join coll separator)` — joins a sequence of strings with a separator.
pub fn builtin_join(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("join", "2", args.len()));
    }
    let items = as_sequence("join", &args[0], 1)?;
    let sep = match &args[1] {
        Value::String(s) => s.as_str(),
        other => return Err(EvalError::type_error("join", "string", other, 2)),
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s.clone()),
            other => return Err(EvalError::type_error("join", "string", other, 1)),
        }
    }
    Ok(Value::String(parts.join(sep)))
}

pub fn builtin_map(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("map", "2", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("map", "function", &args[0], 1));
    }
    let items = as_sequence("map", &args[1], 2)?;
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        result.push(apply(&args[0], vec![item.clone()])?);
    }
    Ok(like(&args[1], result))
}

pub fn builtin_filter(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("filter", "2", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("filter", "function", &args[0], 1));
    }
    let items = as_sequence("filter", &args[1], 2)?;
    let mut result = Vec::new();
    for item in items {
        if apply(&args[0], vec![item.clone()])?.is_truthy() {
            result.push(item.clone());
        }
    }
    Ok(like(&args[1], result))
}

pub fn builtin_reduce(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::arity("reduce", "2 or 3", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("reduce", "function", &args[0], 1));
    }
    let (seq_arg, seed) = if args.len() == 3 { (&args[2], Some(args[1].clone())) } else { (&args[1], None) };
    let items = as_sequence("reduce", seq_arg, args.len())?;
    let mut iter = items.iter();
    let mut acc = match seed {
        Some(v) => v,
        None => iter.next().cloned().ok_or_else(|| EvalError::value_error("reduce", "empty sequence with no seed"))?,
    };
    for item in iter {
        acc = apply(&args[0], vec![acc, item.clone()])?;
    }
    Ok(acc)
}

pub fn builtin_some(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("some", "2", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("some", "function", &args[0], 1));
    }
    let items = as_sequence("some", &args[1], 2)?;
    for item in items {
        let result = apply(&args[0], vec![item.clone()])?;
        if result.is_truthy() {
            return Ok(result);
        }
    }
    Ok(Value::Bool(false))
}

pub fn builtin_every_q(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("every?", "2", args.len()));
    }
    if !args[0].is_callable() {
        return Err(EvalError::type_error("every?", "function", &args[0], 1));
    }
    let items = as_sequence("every?", &args[1], 2)?;
    for item in items {
        if !apply(&args[0], vec![item.clone()])?.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn register(env: &Arc<Environment>) {
    let fns: &[(&str, fn(&[Value]) -> Result<Value, EvalError>)] = &[
        ("list", builtin_list),
        ("vector", builtin_vector),
        ("hash-map", builtin_hash_map),
        ("count", builtin_count),
        ("empty?", builtin_empty_q),
        ("first", builtin_first),
        ("rest", builtin_rest),
        ("car", builtin_car),
        ("cdr", builtin_cdr),
        ("keys", builtin_keys),
        ("vals", builtin_vals),
        ("cons", builtin_cons),
        ("conj", builtin_conj),
        ("assoc", builtin_assoc),
        ("dissoc", builtin_dissoc),
        ("merge", builtin_merge),
        ("get", builtin_get),
        ("reverse", builtin_reverse),
        ("sort", builtin_sort),
        ("range", builtin_range),
        ("append", builtin_append),
        ("concat", builtin_concat),
        ("split", builtin_split),
        ("join", builtin_join),
        ("map", builtin_map),
        ("filter", builtin_filter),
        ("reduce", builtin_reduce),
        ("some", builtin_some),
        ("every?", builtin_every_q),
    ];
    for (name, func) in fns {
        env.define((*name).to_string(), Value::BuiltIn(*func));
    }

    let entries: &[(&str, &str, &str, &str)] = &[
        ("list", "(list ...)", "Creates a list from the given arguments.", "(list 1 2 3) => (1 2 3)"),
        ("vector", "(vector ...)", "Creates a vector from the given arguments.", "(vector 1 2 3) => [1 2 3]"),
        ("hash-map", "(hash-map k v ...)", "Creates a map from alternating key/value arguments.", "(hash-map :a 1 :b 2) => {:a 1 :b 2}"),
        ("count", "(count coll)", "Returns the number of elements in a collection or string.", "(count [1 2 3]) => 3"),
        ("empty?", "(empty? coll)", "Tests if a collection or string is empty.", "(empty? []) => true"),
        ("first", "(first coll)", "Returns the first element, or nil if empty.", "(first [1 2]) => 1"),
        ("rest", "(rest coll)", "Returns all but the first element.", "(rest [1 2 3]) => [2 3]"),
        ("car", "(car coll)", "Returns the first element. Errors on an empty sequence.", "(car '(1 2)) => 1"),
        ("cdr", "(cdr coll)", "Returns all but the first element. Errors on an empty sequence.", "(cdr '(1 2)) => (2)"),
        ("keys", "(keys m)", "Returns a vector of a map's keys.", "(keys {:a 1}) => [:a]"),
        ("vals", "(vals m)", "Returns a vector of a map's values.", "(vals {:a 1}) => [1]"),
        ("cons", "(cons elem coll)", "Prepends elem to a sequence, returning a list.", "(cons 1 '(2 3)) => (1 2 3)"),
        ("conj", "(conj coll elem...)", "Adds elements at the cheap end: front for lists, back for vectors.", "(conj [1 2] 3) => [1 2 3]"),
        ("assoc", "(assoc m k v ...)", "Returns a new map with keys associated to values.", "(assoc {:a 1} :b 2) => {:a 1 :b 2}"),
        ("dissoc", "(dissoc m k ...)", "Returns a new map with keys removed.", "(dissoc {:a 1 :b 2} :a) => {:b 2}"),
        ("merge", "(merge m ...)", "Merges maps left to right; later values win.", "(merge {:a 1} {:a 2}) => {:a 2}"),
        ("get", "(get coll key [default])", "Looks up a key in a map or an index in a sequence.", "(get {:a 1} :b 0) => 0"),
        ("reverse", "(reverse coll)", "Reverses a sequence.", "(reverse [1 2 3]) => [3 2 1]"),
        ("sort", "(sort coll [descending?])", "Sorts a sequence of numbers.", "(sort [3 1 2]) => [1 2 3]"),
        ("range", "(range [start] end [step])", "Returns a list of numbers from start (default 0) up to but excluding end.", "(range 3) => (0 1 2)"),
        ("append", "(append coll ...)", "Alias for concat.", "(append [1] [2]) => [1 2]"),
        ("concat", "(concat coll ...)", "Concatenates sequences, preserving the first argument's shape.", "(concat [1] [2 3]) => [1 2 3]"),
        ("split", "(split s sep)", "Splits a string on a literal separator.", "(split \"a,b\" \",\") => [\"a\" \"b\"]"),
        ("join", "(join coll sep)", "Joins a sequence of strings with a separator.", "(join [\"a\" \"b\"] \",\") => \"a,b\""),
        ("map", "(map f coll)", "Applies f to every element, returning a new sequence.", "(map (fn [x] (* x x)) [1 2]) => [1 4]"),
        ("filter", "(filter pred coll)", "Keeps elements for which pred is truthy.", "(filter (fn [x] (> x 1)) [1 2 3]) => [2 3]"),
        ("reduce", "(reduce f [seed] coll)", "Folds a sequence with f, left to right.", "(reduce + [1 2 3]) => 6"),
        ("some", "(some pred coll)", "Returns the first truthy application of pred, or false.", "(some (fn [x] (> x 2)) [1 2 3]) => true"),
        ("every?", "(every? pred coll)", "Tests if pred is truthy for every element.", "(every? (fn [x] (> x 0)) [1 2]) => true"),
    ];
    for (name, signature, description, example) in entries {
        crate::help::register_help(crate::help::HelpEntry {
            name: (*name).to_string(),
            signature: (*signature).to_string(),
            description: (*description).to_string(),
            examples: vec![(*example).to_string()],
            related: vec!["count".to_string(), "map".to_string()],
            category: "Collections".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conj_vector_appends_list_prepends() {
        assert!(matches!(
            builtin_conj(&[Value::Vector(vec![Value::Number(1.0)]), Value::Number(2.0)]),
            Ok(Value::Vector(items)) if items.len() == 2 && matches!(items[1], Value::Number(n) if n == 2.0)
        ));
        assert!(matches!(
            builtin_conj(&[Value::List(vec![Value::Number(1.0)]), Value::Number(2.0)]),
            Ok(Value::List(items)) if items.len() == 2 && matches!(items[0], Value::Number(n) if n == 2.0)
        ));
    }

    #[test]
    fn test_assoc_overwrites_existing_key() {
        let map = Value::Map(vec![(Value::Symbol(":a".to_string()), Value::Number(1.0))]);
        let result = builtin_assoc(&[map, Value::Symbol(":a".to_string()), Value::Number(2.0)]).unwrap();
        match result {
            Value::Map(pairs) => assert_eq!(pairs.len(), 1),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_assoc_treats_nil_as_empty_map() {
        let result = builtin_assoc(&[Value::Nil, Value::Symbol(":a".to_string()), Value::Number(1.0)]).unwrap();
        match result {
            Value::Map(pairs) => assert_eq!(pairs, vec![(Value::Symbol(":a".to_string()), Value::Number(1.0))]),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_assoc_rejects_non_map_non_nil_first_arg() {
        let err = builtin_assoc(&[
            Value::List(vec![Value::Number(1.0)]),
            Value::Symbol(":a".to_string()),
            Value::Number(1.0),
        ])
        .unwrap_err();
        assert!(err.message().contains("map or nil"));
    }

    #[test]
    fn test_assoc_rejects_non_symbol_key() {
        let err = builtin_assoc(&[Value::Nil, Value::Number(0.0), Value::Number(1.0)]).unwrap_err();
        assert!(err.message().starts_with("TypeError:"));
    }

    #[test]
    fn test_get_vector_out_of_bounds_without_default_is_index_error() {
        let err = builtin_get(&[
            Value::Vector(vec![Value::Number(10.0), Value::Number(20.0)]),
            Value::Number(5.0),
        ])
        .unwrap_err();
        assert!(err.message().contains("IndexError"));
        assert!(err.message().contains("5 out of bounds for vector of size 2"));
    }

    #[test]
    fn test_get_vector_negative_index_without_default_is_index_error() {
        let err = builtin_get(&[
            Value::Vector(vec![Value::Number(10.0), Value::Number(20.0)]),
            Value::Number(-1.0),
        ])
        .unwrap_err();
        assert!(err.message().contains("IndexError"));
    }

    #[test]
    fn test_get_vector_out_of_bounds_with_default_returns_default() {
        let result = builtin_get(&[
            Value::Vector(vec![Value::Number(10.0), Value::Number(20.0)]),
            Value::Number(5.0),
            Value::String("default".to_string()),
        ])
        .unwrap();
        assert_eq!(result, Value::String("default".to_string()));
    }

    #[test]
    fn test_get_vector_non_integer_index_is_type_error() {
        let err = builtin_get(&[
            Value::Vector(vec![Value::Number(10.0), Value::Number(20.0)]),
            Value::String("0".to_string()),
        ])
        .unwrap_err();
        assert!(err.message().contains("TypeError"));
        assert!(err.message().contains("Vector index must be an integer"));
    }

    #[test]
    fn test_get_map_non_symbol_key_is_type_error() {
        let map = Value::Map(vec![(Value::Symbol(":a".to_string()), Value::Number(1.0))]);
        let err = builtin_get(&[map, Value::String("a".to_string())]).unwrap_err();
        assert!(err.message().contains("TypeError"));
        assert!(err.message().contains("Map key must be a symbol"));
    }

    #[test]
    fn test_get_map_missing_key_without_default_is_nil_not_an_error() {
        let map = Value::Map(vec![(Value::Symbol(":a".to_string()), Value::Number(1.0))]);
        let result = builtin_get(&[map, Value::Symbol(":c".to_string())]).unwrap();
        assert_eq!(result, Value::Nil);
    }

    #[test]
    fn test_range_with_step() {
        let result = builtin_range(&[Value::Number(0.0), Value::Number(10.0), Value::Number(3.0)]).unwrap();
        match result {
            Value::List(items) => assert_eq!(items.len(), 4),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_reduce_without_seed_uses_first_element() {
        let result = builtin_reduce(&[
            Value::BuiltIn(|args| Ok(Value::Number(
                match (&args[0], &args[1]) { (Value::Number(a), Value::Number(b)) => a + b, _ => 0.0 }
            ))),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]),
        ]).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 6.0));
    }
}
