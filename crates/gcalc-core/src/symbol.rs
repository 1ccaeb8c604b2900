//! Symbols and the two binding namespaces.
//!
//! Every name an equation can bind or reference is a single glyph: a Latin
//! letter typed directly, or a Greek letter entered through a LaTeX command
//! such as `\theta`. The two plot axes and Euler's number are reserved and can
//! never be bound.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single-glyph identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub char);

impl Symbol {
    /// Horizontal plot axis.
    pub const X: Symbol = Symbol('x');
    /// Vertical plot axis.
    pub const Y: Symbol = Symbol('y');
    /// Euler's number.
    pub const E: Symbol = Symbol('e');

    /// Symbols that can never be bound by an equation.
    pub const RESERVED: [Symbol; 3] = [Symbol::X, Symbol::Y, Symbol::E];

    /// Returns true for `x` and `y`.
    pub fn is_axis(self) -> bool {
        self == Symbol::X || self == Symbol::Y
    }

    /// Returns true for the axis symbols and Euler's number.
    pub fn is_reserved(self) -> bool {
        Symbol::RESERVED.contains(&self)
    }

    /// Returns true if this symbol may be used as a function or variable name.
    ///
    /// Only single ASCII letters that are not reserved qualify.
    pub fn is_bindable(self) -> bool {
        self.0.is_ascii_alphabetic() && !self.is_reserved()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol(c)
    }
}

/// The two disjoint binding namespaces of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Function,
    Variable,
}

impl Namespace {
    /// The namespace a name could collide with.
    pub fn other(self) -> Namespace {
        match self {
            Namespace::Function => Namespace::Variable,
            Namespace::Variable => Namespace::Function,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Function => write!(f, "function"),
            Namespace::Variable => write!(f, "variable"),
        }
    }
}
