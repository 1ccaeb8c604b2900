//! Core error types for gcalc-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the equation data model and the bytecode wire format.

use thiserror::Error;

use crate::id::EquationId;
use crate::symbol::{Namespace, Symbol};

/// Core errors produced by the gcalc-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An equation id was not found in the registry.
    #[error("equation not found: EquationId({id})", id = id.0)]
    EquationNotFound { id: EquationId },

    /// A name is already bound by another live equation.
    #[error("{namespace} name '{name}' is already bound by equation {owner}")]
    NameAlreadyBound {
        name: Symbol,
        namespace: Namespace,
        owner: EquationId,
    },

    /// Reserved symbols can never enter the name maps.
    #[error("'{name}' is reserved and cannot be bound")]
    ReservedName { name: Symbol },

    /// The name maps disagree with the bindings of the equations they point to.
    #[error("registry inconsistency: {reason}")]
    RegistryInconsistency { reason: String },

    /// A bytecode pair could not be decoded.
    #[error("invalid instruction (opcode {opcode}): {reason}")]
    InvalidInstruction { opcode: u8, reason: String },

    /// A compiled artifact violates the framing rules.
    #[error("malformed artifact: {reason}")]
    MalformedArtifact { reason: String },
}
