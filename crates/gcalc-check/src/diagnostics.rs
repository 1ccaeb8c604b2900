//! Validation diagnostics attached to the offending equation.
//!
//! [`ValidationError`] carries the names and ids involved so a client can
//! point at the conflicting row without further registry queries. Messages
//! are shown to the user verbatim.

use gcalc_core::{EquationId, Namespace, Symbol};
use serde::{Deserialize, Serialize};

/// A naming or binding rule violated by an equation's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    /// The binding name is one of the axis symbols or Euler's number.
    #[error("a {namespace} can't be named {name}, it's a reserved character")]
    ReservedName {
        name: Symbol,
        namespace: Namespace,
    },

    /// Another equation already binds this name in the same namespace.
    #[error("there's already a {namespace} named {name} (equation {owner})")]
    DuplicateName {
        name: Symbol,
        namespace: Namespace,
        owner: EquationId,
    },

    /// Another equation binds this name in the other namespace.
    #[error("{name} is already defined as a {existing} (equation {owner})")]
    NamespaceClash {
        name: Symbol,
        /// Namespace in which the name is already bound.
        existing: Namespace,
        owner: EquationId,
    },

    /// The equation's own bound name appears inside its body.
    #[error("{name} can't be used as a value inside its own definition")]
    NameUsedAsValue { name: Symbol },

    /// A variable body references a plot axis.
    #[error("variable {name} can't use {axis}, it has to be constant")]
    NonConstantVariable { name: Symbol, axis: Symbol },

    /// A variable body references a function name as a plain value.
    #[error("variable {name} can't use function {function} as a value")]
    FunctionUsedAsValue { name: Symbol, function: Symbol },
}

impl ValidationError {
    /// The symbol the error is about.
    pub fn symbol(&self) -> Symbol {
        match self {
            ValidationError::ReservedName { name, .. }
            | ValidationError::DuplicateName { name, .. }
            | ValidationError::NamespaceClash { name, .. }
            | ValidationError::NameUsedAsValue { name }
            | ValidationError::NonConstantVariable { name, .. } => *name,
            ValidationError::FunctionUsedAsValue { function, .. } => *function,
        }
    }
}
