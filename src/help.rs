// ABOUTME: Help and documentation system for the Lisp interpreter
// Provides first-class documentation for built-in and user-defined functions

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// A help entry for a function or special form.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub name: String,
    pub signature: String,
    pub description: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
    pub category: String,
}

/// Macro for defining help entries with less boilerplate.
/// Usage: help_entry!("name", "category", "signature", "description", ["ex1", "ex2"], ["related1"])
macro_rules! help_entry {
    (
        $name:literal,
        $category:literal,
        $signature:literal,
        $description:literal,
        [$($example:literal),* $(,)?],
        [$($related:literal),* $(,)?]
    ) => {
        register_help(HelpEntry {
            name: $name.to_string(),
            category: $category.to_string(),
            signature: $signature.to_string(),
            description: $description.trim().to_string(),
            examples: vec![$($example.to_string()),*],
            related: vec![$($related.to_string()),*],
        });
    };
}

/// Registry for all function documentation.
#[derive(Default)]
pub struct HelpRegistry {
    entries: HashMap<String, HelpEntry>,
}

impl HelpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: HelpEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<HelpEntry> {
        self.entries.get(name).cloned()
    }

    pub fn by_category(&self) -> HashMap<String, Vec<HelpEntry>> {
        let mut by_cat: HashMap<String, Vec<HelpEntry>> = HashMap::new();
        for entry in self.entries.values() {
            by_cat
                .entry(entry.category.clone())
                .or_default()
                .push(entry.clone());
        }
        for entries in by_cat.values_mut() {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        by_cat
    }

    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Global registry, not thread-local: `doc`/`help` may be called from a
/// promise worker thread, which would see an empty thread-local registry if
/// help entries were only ever populated on the main thread at startup.
fn registry() -> &'static Mutex<HelpRegistry> {
    static REGISTRY: OnceLock<Mutex<HelpRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HelpRegistry::new()))
}

pub fn register_help(entry: HelpEntry) {
    registry().lock().expect("help registry poisoned").register(entry);
}

pub fn get_help(name: &str) -> Option<HelpEntry> {
    registry().lock().expect("help registry poisoned").get(name)
}

pub fn all_by_category() -> HashMap<String, Vec<HelpEntry>> {
    registry().lock().expect("help registry poisoned").by_category()
}

pub fn all_names() -> Vec<String> {
    registry().lock().expect("help registry poisoned").all_names()
}

/// Format a single help entry for display.
pub fn format_help_entry(entry: &HelpEntry) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} - {}\n", entry.name, entry.category));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    output.push_str("Signature:\n");
    for sig_line in entry.signature.lines() {
        output.push_str(&format!("  {}\n", sig_line));
    }
    output.push('\n');

    output.push_str("Description:\n");
    for line in entry.description.lines() {
        output.push_str(&format!("  {}\n", line));
    }
    output.push('\n');

    if !entry.examples.is_empty() {
        output.push_str("Examples:\n");
        for example in &entry.examples {
            output.push_str("  ");
            output.push_str(example);
            output.push('\n');
        }
        output.push('\n');
    }

    if !entry.related.is_empty() {
        output.push_str("Related:\n");
        output.push_str(&format!("  {}\n", entry.related.join(", ")));
        output.push('\n');
    }

    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    output
}

/// Format quick reference showing all functions.
pub fn format_quick_reference() -> String {
    let mut output = String::new();

    let by_cat = all_by_category();
    let total = by_cat.values().map(|v| v.len()).sum::<usize>();

    output.push_str(&format!("Available Functions ({} total)\n", total));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let categories = vec![
        "Special Forms",
        "Arithmetic",
        "Comparison",
        "Logic",
        "Type predicates",
        "Collections",
        "String conversion",
        "Console I/O",
        "Filesystem I/O",
        "Network I/O",
        "Promises",
        "Module system",
        "BDD",
        "Help system",
    ];

    for category in categories {
        if let Some(entries) = by_cat.get(category) {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            output.push_str(&format!("{} ({})\n", category, names.len()));
            output.push_str(&format!("  {}\n\n", names.join(", ")));
        }
    }

    output.push_str("Type (help \"function-name\") for detailed help.\n");
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    output
}

/// Populates special-form documentation not covered by any builtin's own
/// `register()` (special forms have no `Value::BuiltIn` to hang a doc entry
/// off of).
pub fn populate_builtin_help() {
    help_entry!("define", "Special Forms", "(define name expr)",
        "Evaluates expr in the current scope and binds name to the result. Returns the value.",
        ["(define x 42)", "(define square (fn [x] (* x x)))"], ["fn", "let"]);
    help_entry!("fn", "Special Forms", "(fn [params...] body...)",
        "Creates an anonymous function capturing the current lexical environment.",
        ["((fn [x] (* x x)) 5) => 25", "(map (fn [x] (+ x 1)) [1 2 3]) => [2 3 4]"],
        ["define", "let"]);
    help_entry!("if", "Special Forms", "(if cond then [else])",
        "Evaluates cond; returns then's value if truthy, else's value otherwise (nil if else is absent). Only the selected branch is evaluated.",
        ["(if true 1 2) => 1", "(if (= 5 5) \"yes\" \"no\") => \"yes\"", "(if false 1 2) => 2"],
        ["cond", "when"]);
    help_entry!("cond", "Special Forms", "(cond test1 result1 ... testn resultn)",
        "Evaluates tests in order; returns the result paired with the first truthy test, or nil.",
        ["(cond (= 1 2) \"a\" (= 1 1) \"b\") => \"b\""], ["if", "when"]);
    help_entry!("when", "Special Forms", "(when test body...)",
        "If test is truthy, evaluates body in order and returns the last value; otherwise returns nil without evaluating body.",
        ["(when true 1 2 3) => 3", "(when false 1) => nil"], ["if", "cond"]);
    help_entry!("let", "Special Forms", "(let [k1 v1 ... kn vn] body...)",
        "Creates a child scope; binds each key before evaluating the next value (let* discipline), then evaluates body returning the last value.",
        ["(let [x 1 y (+ x 1)] (+ x y)) => 3"], ["define", "fn"]);
    help_entry!("quote", "Special Forms", "'form or (quote form)",
        "Returns form unevaluated.",
        ["'(1 2 3) => (1 2 3)", "'hello => hello"], ["->"]);
    help_entry!("->", "Special Forms", "(-> x steps...)",
        "Thread-first: threads x as the first argument through each step.",
        ["(-> 5 (- 2)) => 3"], ["->>"]);
    help_entry!("->>", "Special Forms", "(->> x steps...)",
        "Thread-last: threads x as the last argument through each step.",
        ["(->> 5 (- 2)) => -3"], ["->"]);
    help_entry!("throw", "Special Forms", "(throw expr)",
        "Evaluates expr and raises it as a user-thrown error, catchable by try/catch.",
        ["(try (throw \"oops\") (catch e e)) => \"oops\""], ["try"]);
    help_entry!("try", "Special Forms", "(try body (catch binding handler...)? (finally cleanup...)?)",
        "Evaluates body. On error, if catch is present, binds the error (raw value for throw, message string otherwise) and evaluates handler. finally always runs afterward.",
        ["(try (throw {:code 42}) (catch e (get e ':code))) => 42"], ["throw", "catch", "finally"]);
    help_entry!("doseq", "Special Forms", "(doseq [binding coll] body...)",
        "Evaluates coll to a list or vector; for each element, binds binding in a fresh scope and evaluates body for side effects. Always returns nil.",
        ["(doseq [x [1 2 3]] (println x))"], ["map"]);

    help_entry!("describe", "BDD", "(describe \"feature\" body...)",
        "Starts a feature context, evaluates body, then records the feature. Nested describe starts a sibling feature, not a nested one.",
        ["(describe \"math\" (it \"adds\" (given \"two numbers\" 1) (then \"sum\" (assert-equal? 2 (+ 1 1)))))"],
        ["it"]);
    help_entry!("it", "BDD", "(it \"scenario\" body...)",
        "Starts a scenario context within the active feature, evaluates body, then records the scenario.",
        ["(it \"adds two numbers\" (then \"works\" (assert-equal? 2 (+ 1 1))))"], ["describe"]);
    help_entry!("given", "BDD", "(given \"description\" body...)",
        "Records a Given step, evaluates body, and propagates any error.",
        ["(given \"a counter at zero\" (define n 0))"], ["when", "then", "action"]);
    help_entry!("then", "BDD", "(then \"description\" body...)",
        "Records a Then step. Catches assertion failures and evaluation errors and marks the step failed instead of propagating.",
        ["(then \"the sum is correct\" (assert-equal? 4 (+ 2 2)))"], ["given", "assert-equal?"]);
    help_entry!("action", "BDD", "(action \"description\" body...)",
        "Records an Action step, evaluates body, and propagates any error.",
        ["(action \"increment the counter\" (define n (+ n 1)))"], ["given", "then"]);
    help_entry!("assert-raises?", "BDD", "(assert-raises? expected-message form)",
        "Special form. Evaluates form inside a guarded context; passes if it raises an error whose message contains expected-message.",
        ["(assert-raises? \"Division by zero\" (/ 1 0)) => true"], ["assert-equal?"]);

    help_entry!("import", "Module system", "(import \"name\")\n(import \"name\" :only (sym...))\n(import \"name\" :as \"prefix\")",
        "Loads and evaluates a module (by logical name) once, caching the result; binds its exported symbols into the current scope.",
        ["(import \"mathlib\")", "(import \"mathlib\" :only (square))", "(import \"mathlib\" :as \"m\")"],
        ["export"]);
    help_entry!("export", "Module system", "(export sym...)",
        "Declares symbols as part of the current module's export set. A no-op outside module evaluation.",
        ["(export square cube)"], ["import"]);

    help_entry!("help", "Help system", "(help) or (help \"function-name\")",
        "Shows help information. With no arguments, displays a quick reference; with a name, shows detailed documentation.",
        ["(help) => quick reference", "(help \"cons\") => detailed help for cons"], ["doc"]);
}
