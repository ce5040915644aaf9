//! # Built-in Functions Module
//!
//! Core built-in functions for the interpreter, organized by category. Each
//! sub-module owns its own `register(&Arc<Environment>)` that defines the
//! bindings and registers their help entries in one pass.
//!
//! ## Categories
//!
//! - **[arithmetic]**: `+ - * / % abs min max`
//! - **[comparison]**: `= equal? < > <= >=`
//! - **[logic]**: `and or not`
//! - **[types]**: type predicates (`is-number?` etc.)
//! - **[collections]**: constructors, inspection and transformation over
//!   lists, vectors and maps
//! - **[strings]**: `to-str to-int to-float to-bool`
//! - **[console]**: `print println read-line`
//! - **[filesystem]**: `slurp spit file-exists? file-size list-files`
//! - **[network]**: `http-get http-post http-put http-delete http-request`
//! - **[concurrency]**: `promise resolve reject promise-then await
//!   promise-all async-filter retry debounce throttle`
//! - **[testing]**: `assert-equal? assert-true? assert-false? assert-nil?
//!   assert-not-nil?`
//! - **[help_builtins]**: `help doc print-doc`

use crate::env::Environment;
use crate::sandbox::Sandbox;
use std::sync::{Arc, OnceLock};

// ============================================================================
// Sandbox storage for I/O built-ins
// ============================================================================

// A plain `thread_local` would be invisible inside the OS threads the promise
// subsystem spawns (`promise::spawn_promise`), since thread-locals don't
// propagate across `thread::spawn`. Global storage, set once at startup,
// keeps filesystem/network built-ins usable from promise worker threads.
static SANDBOX: OnceLock<Sandbox> = OnceLock::new();

/// Initializes the sandbox shared by filesystem and network built-ins.
/// Must be called once before evaluating any script; subsequent calls after
/// the first are no-ops.
pub fn set_sandbox_storage(sandbox: Sandbox) {
    let _ = SANDBOX.set(sandbox);
}

/// Accessor used by [`filesystem`] and [`network`] built-ins. Panics if
/// called before [`set_sandbox_storage`] — a programming error, not a
/// recoverable runtime condition.
pub fn sandbox() -> &'static Sandbox {
    SANDBOX.get().expect("sandbox not initialized; call set_sandbox_storage first")
}

// ============================================================================
// Sub-modules
// ============================================================================

pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod concurrency;
pub mod console;
pub mod filesystem;
#[path = "help.rs"]
pub mod help_builtins;
pub mod logic;
pub mod network;
pub mod strings;
pub mod testing;
pub mod types;

// Re-exported for tests and for `main`'s startup sequence.
pub use arithmetic::register as register_arithmetic;
pub use collections::register as register_collections;
pub use comparison::register as register_comparison;
pub use concurrency::register as register_concurrency;
pub use console::register as register_console;
pub use filesystem::register as register_filesystem;
pub use help_builtins::register as register_help;
pub use logic::register as register_logic;
pub use network::register as register_network;
pub use strings::register as register_strings;
pub use testing::register as register_testing;
pub use types::register as register_types;

// ============================================================================
// Main registration entry point
// ============================================================================

/// Registers every built-in category in `env`.
pub fn register_builtins(env: &Arc<Environment>) {
    register_arithmetic(env);
    register_comparison(env);
    register_logic(env);
    register_types(env);
    register_collections(env);
    register_strings(env);
    register_console(env);
    register_filesystem(env);
    register_network(env);
    register_concurrency(env);
    register_testing(env);
    register_help(env);
}
