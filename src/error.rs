// ABOUTME: Error types for lexing, parsing, and evaluation failures

use crate::value::Value;
use thiserror::Error;

/// Malformed source text. Carries a human-readable message; the REPL (out of
/// core scope) would use a distinguishable "unterminated string" message to
/// detect "need more input", but that front-end concern is not implemented
/// here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("LexerError: {0}")]
pub struct LexerError(pub String);

/// Structural token-stream errors: unbalanced delimiters, odd-arity map
/// literals, unexpected end of input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ParseError: {0}")]
pub struct ParseError(pub String);

// ===== Arity constant strings (avoid allocation in the common cases) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "at least 1";

/// All runtime (evaluation-time) errors.
///
/// `EvaluationError`'s message carries one of the conventional prefixes
/// (`SyntaxError:`, `TypeError:`, `ArityError:`, `ValueError:`,
/// `ZeroDivisionError:`, `IndexError:`, `RuntimeError:`, `FileNotFoundError:`,
/// `PermissionError:`, `NetworkError:`, `RetryError:`, `Unbound symbol:`).
/// The prefix convention is observable: `assert-raises?` matches the expected
/// substring against the rendered message, so every constructor below must
/// keep producing one of these prefixes.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// General runtime error, already formatted with one of the conventional
    /// prefixes.
    #[error("{message}")]
    Evaluation { message: String },

    /// Arity mismatch. Kept as its own variant (rather than folded into
    /// `Evaluation`) because it is constructed pervasively and benefits from
    /// a typed shape; `Display` still renders the `ArityError:` prefix so
    /// substring matching in `assert-raises?` behaves identically either
    /// way.
    #[error("ArityError: {function} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Unbound symbol lookup failure.
    #[error("Unbound symbol: {0}")]
    UndefinedSymbol(String),

    /// BDD assertion failure. A subtype of `EvaluationError` in the source
    /// language; represented as a distinct Rust variant so `then`'s handler
    /// can match it specifically, while `try`/`catch` still catches it like
    /// any other `EvalError`.
    #[error("AssertionFailure: {message}")]
    AssertionFailure { message: String },

    /// `(throw v)` — carries the raw thrown value. `catch` binds `v` itself,
    /// not a stringified form.
    #[error("UserThrownError: {0}")]
    UserThrown(Value),
}

impl EvalError {
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Evaluation {
            message: format!("SyntaxError: {}", message.into()),
        }
    }

    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        EvalError::Evaluation {
            message: format!(
                "TypeError: {function}: expected {expected} at argument {position}, got {} ({})",
                actual.type_name(),
                actual
            ),
        }
    }

    pub fn value_error(function: &str, message: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("ValueError: {function}: {message}"),
        }
    }

    pub fn zero_division(function: &str) -> Self {
        EvalError::Evaluation {
            message: format!("ZeroDivisionError: {function}: division by zero"),
        }
    }

    pub fn index_error(function: &str, message: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("IndexError: {function}: {message}"),
        }
    }

    pub fn runtime(function: &str, message: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("RuntimeError: {function}: {message}"),
        }
    }

    pub fn file_not_found(path: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("FileNotFoundError: {path}"),
        }
    }

    pub fn permission(path: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("PermissionError: {path}"),
        }
    }

    pub fn network(message: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("NetworkError: {message}"),
        }
    }

    pub fn retry(message: impl std::fmt::Display) -> Self {
        EvalError::Evaluation {
            message: format!("RetryError: {message}"),
        }
    }

    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityMismatch {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        EvalError::AssertionFailure {
            message: message.into(),
        }
    }

    /// The string payload used for `catch` bindings of system (non-user-
    /// thrown) errors, and for `assert-raises?`'s substring match.
    pub fn message(&self) -> String {
        format!("{}", self)
    }
}
