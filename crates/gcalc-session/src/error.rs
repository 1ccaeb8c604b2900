//! Session error types.
//!
//! - [`CompilerError`]: failures reported by the external compiler.
//! - [`EquationError`]: what gets attached to an equation when its edit
//!   protocol stops early.
//! - [`SessionError`]: operation-level failures returned to the caller.

use gcalc_check::ValidationError;
use gcalc_core::{CoreError, Symbol};
use serde::Serialize;

/// Message prefix the compiler uses for the empty-expression sentinel.
pub const EMPTY_SENTINEL: &str = "Empty error";

/// Errors from the external compiler.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum CompilerError {
    /// The expression was empty. Swallowed: output is cleared, no error shown.
    #[error("{0}")]
    Empty(String),

    /// Syntax or semantic rejection, shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The compiler could not be reached.
    #[error("compiler unreachable: {0}")]
    Transport(String),

    /// The compiler answered with something that is not a valid response.
    #[error("malformed compiler response: {0}")]
    MalformedResponse(String),
}

impl CompilerError {
    /// Classifies a rejection message, recognizing the empty sentinel.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.starts_with(EMPTY_SENTINEL) {
            CompilerError::Empty(message)
        } else {
            CompilerError::Rejected(message)
        }
    }

    pub fn is_empty_expression(&self) -> bool {
        matches!(self, CompilerError::Empty(_))
    }
}

impl From<CoreError> for CompilerError {
    fn from(err: CoreError) -> Self {
        CompilerError::MalformedResponse(err.to_string())
    }
}

/// Why an equation was left without output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EquationError {
    /// A naming rule was violated; the registry was not touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Some references are not defined yet; the compiler was not called.
    #[error("undefined: {}", display_symbols(.0))]
    Unresolved(Vec<Symbol>),

    /// The compiler rejected the expression.
    #[error(transparent)]
    Compile(#[from] CompilerError),
}

impl EquationError {
    /// Short machine-readable category.
    pub fn category(&self) -> &'static str {
        match self {
            EquationError::Validation(_) => "validation",
            EquationError::Unresolved(_) => "unresolved",
            EquationError::Compile(_) => "compile",
        }
    }

    /// Unresolved references are shown as suggestions, not as an error.
    pub fn sets_error_flag(&self) -> bool {
        !matches!(self, EquationError::Unresolved(_))
    }
}

fn display_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel_is_recognized() {
        assert!(CompilerError::from_message("Empty error: nothing to parse").is_empty_expression());
        assert_eq!(
            CompilerError::from_message("Couldn't parse this latex string: )"),
            CompilerError::Rejected("Couldn't parse this latex string: )".to_string())
        );
    }

    #[test]
    fn unresolved_does_not_flag() {
        let err = EquationError::Unresolved(vec![Symbol('a'), Symbol('b')]);
        assert_eq!(err.to_string(), "undefined: a, b");
        assert!(!err.sets_error_flag());
        assert!(EquationError::Compile(CompilerError::Rejected("x".into())).sets_error_flag());
    }

    #[test]
    fn compiler_error_json() {
        let json = serde_json::to_value(CompilerError::Rejected("bad".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "rejected", "message": "bad"}));
    }
}
