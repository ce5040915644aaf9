// ABOUTME: Module loader: path resolution, cycle detection, caching, export gating

use crate::config::ModuleConfig;
use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

struct ModuleHandle {
    env: Arc<Environment>,
    exports: HashSet<String>,
}

fn config() -> &'static Mutex<ModuleConfig> {
    static CONFIG: OnceLock<Mutex<ModuleConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| Mutex::new(ModuleConfig::default()))
}

fn cache() -> &'static Mutex<HashMap<String, Arc<ModuleHandle>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<ModuleHandle>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn loading_set() -> &'static Mutex<HashSet<String>> {
    static LOADING: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    LOADING.get_or_init(|| Mutex::new(HashSet::new()))
}

thread_local! {
    static EXPORT_STACK: RefCell<Vec<HashSet<String>>> = const { RefCell::new(Vec::new()) };
}

fn push_export_frame() {
    EXPORT_STACK.with(|stack| stack.borrow_mut().push(HashSet::new()));
}

fn pop_export_frame() -> HashSet<String> {
    EXPORT_STACK.with(|stack| stack.borrow_mut().pop().unwrap_or_default())
}

/// Called by the `export` special form. A no-op outside module evaluation
/// (e.g. at the top-level script), since there is no export frame to record
/// into.
pub fn record_export(name: &str) {
    EXPORT_STACK.with(|stack| {
        if let Some(top) = stack.borrow_mut().last_mut() {
            top.insert(name.to_string());
        }
    });
}

/// Sets the load-path/extension configuration used by subsequent imports.
/// Called once from `main.rs` before any script evaluation.
pub fn configure(new_config: ModuleConfig) {
    *config().lock().expect("module config lock poisoned") = new_config;
}

fn resolve_path(name: &str) -> Option<PathBuf> {
    let cfg = config().lock().expect("module config lock poisoned");
    for root in &cfg.load_paths {
        let candidate = root.join(format!("{}.{}", name, cfg.extension));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn load_module(name: &str, importing_env: &Arc<Environment>) -> Result<Arc<ModuleHandle>, EvalError> {
    let path = resolve_path(name).ok_or_else(|| EvalError::file_not_found(name))?;
    let source = std::fs::read_to_string(&path)
        .map_err(|e| EvalError::runtime("import", format!("failed to read module '{}': {}", name, e)))?;
    let forms = crate::parser::parse_all(&source).map_err(|e| EvalError::syntax(e.0))?;

    let module_env = Environment::with_parent(importing_env.root());
    push_export_frame();
    let mut eval_result = Ok(Value::Nil);
    for form in &forms {
        eval_result = crate::eval::eval(form, &module_env);
        if eval_result.is_err() {
            break;
        }
    }
    let exports = pop_export_frame();
    eval_result?;
    Ok(Arc::new(ModuleHandle {
        env: module_env,
        exports,
    }))
}

fn get_or_load_module(name: &str, importing_env: &Arc<Environment>) -> Result<Arc<ModuleHandle>, EvalError> {
    if let Some(handle) = cache().lock().expect("module cache poisoned").get(name) {
        return Ok(Arc::clone(handle));
    }
    {
        let mut loading = loading_set().lock().expect("module loading-set poisoned");
        if loading.contains(name) {
            return Err(EvalError::runtime(
                "import",
                format!("cyclic import detected: '{}' is already being loaded", name),
            ));
        }
        loading.insert(name.to_string());
    }

    let result = load_module(name, importing_env);
    loading_set().lock().expect("module loading-set poisoned").remove(name);

    let handle = result?;
    cache()
        .lock()
        .expect("module cache poisoned")
        .insert(name.to_string(), Arc::clone(&handle));
    Ok(handle)
}

/// `(import "name")`, `(import "name" :only (sym...))`, and
/// `(import "name" :as "prefix")`.
pub fn import(
    name: &str,
    only: Option<&[String]>,
    as_prefix: Option<&str>,
    importing_env: &Arc<Environment>,
) -> Result<(), EvalError> {
    let handle = get_or_load_module(name, importing_env)?;

    match (only, as_prefix) {
        (Some(names), _) => {
            for sym in names {
                if !handle.exports.contains(sym) {
                    return Err(EvalError::runtime(
                        "import",
                        format!("module '{}' does not export '{}'", name, sym),
                    ));
                }
                let value = handle
                    .env
                    .get(sym)
                    .ok_or_else(|| EvalError::runtime("import", format!("module '{}' does not export '{}'", name, sym)))?;
                importing_env.define(sym.clone(), value);
            }
        }
        (None, Some(prefix)) => {
            for sym in &handle.exports {
                if let Some(value) = handle.env.get(sym) {
                    importing_env.define(format!("{}/{}", prefix, sym), value);
                }
            }
        }
        (None, None) => {
            for sym in &handle.exports {
                if let Some(value) = handle.env.get(sym) {
                    importing_env.define(sym.clone(), value);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_temp_module(dir: &std::path::Path, name: &str, source: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{}.lpy", name))).unwrap();
        file.write_all(source.as_bytes()).unwrap();
    }

    #[test]
    #[serial]
    fn test_import_binds_only_exported_names() {
        let dir = std::env::temp_dir().join("lispy_test_modules_basic");
        std::fs::create_dir_all(&dir).unwrap();
        write_temp_module(&dir, "greet", "(define secret 1) (define hello 42) (export hello)");
        configure(ModuleConfig {
            load_paths: vec![dir.clone()],
            extension: "lpy".to_string(),
        });

        let importer = Environment::new();
        import("greet", None, None, &importer).unwrap();
        assert!(matches!(importer.get("hello"), Some(Value::Number(n)) if n == 42.0));
        assert!(importer.get("secret").is_none());
    }

    #[test]
    #[serial]
    fn test_import_only_missing_symbol_is_error() {
        let dir = std::env::temp_dir().join("lispy_test_modules_only");
        std::fs::create_dir_all(&dir).unwrap();
        write_temp_module(&dir, "mathish", "(define pi 3) (export pi)");
        configure(ModuleConfig {
            load_paths: vec![dir.clone()],
            extension: "lpy".to_string(),
        });

        let importer = Environment::new();
        let err = import("mathish", Some(&["missing".to_string()]), None, &importer).unwrap_err();
        assert!(err.message().contains("missing"));
    }

    #[test]
    #[serial]
    fn test_import_as_prefix_namespaces_bindings() {
        let dir = std::env::temp_dir().join("lispy_test_modules_prefix");
        std::fs::create_dir_all(&dir).unwrap();
        write_temp_module(&dir, "strs", "(define upper 1) (export upper)");
        configure(ModuleConfig {
            load_paths: vec![dir.clone()],
            extension: "lpy".to_string(),
        });

        let importer = Environment::new();
        import("strs", None, Some("str"), &importer).unwrap();
        assert!(importer.get("str/upper").is_some());
    }
}
